use crate::core::models::user::UserSummary;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical string form of a principal id. Every identity comparison in the
/// service funnels through this so a raw id and an id embedded in an expanded
/// user reference always compare equal.
pub fn as_comparable_id(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// A reference to a user, either as a bare id or expanded with the user's
/// name and email after a directory join.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PrincipalRef {
    Id(String),
    Expanded(UserSummary),
}

impl PrincipalRef {
    pub fn raw_id(&self) -> &str {
        match self {
            PrincipalRef::Id(id) => id,
            PrincipalRef::Expanded(user) => &user.id,
        }
    }

    pub fn as_comparable_id(&self) -> String {
        as_comparable_id(self.raw_id())
    }

    /// True when this reference and `raw` name the same principal.
    pub fn is_principal(&self, raw: &str) -> bool {
        self.as_comparable_id() == as_comparable_id(raw)
    }
}

impl PartialEq for PrincipalRef {
    fn eq(&self, other: &Self) -> bool {
        self.as_comparable_id() == other.as_comparable_id()
    }
}

impl Eq for PrincipalRef {}

impl From<String> for PrincipalRef {
    fn from(id: String) -> Self {
        PrincipalRef::Id(id)
    }
}

impl From<&str> for PrincipalRef {
    fn from(id: &str) -> Self {
        PrincipalRef::Id(id.to_string())
    }
}

impl std::fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw_id())
    }
}
