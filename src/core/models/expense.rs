use crate::core::principal::PrincipalRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
pub enum Category {
    Transportation,
    Accommodation,
    Food,
    Shopping,
    Entertainment,
    #[default]
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Transportation => "Transportation",
            Category::Accommodation => "Accommodation",
            Category::Food => "Food",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Other => "Other",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    #[default]
    Equal,
    Unequal,
    Percentage,
}

/// A non-payer party owing part of a split expense. Slot ids are generated
/// by the parent aggregate and stay stable across recomputations for
/// participants that remain in the split.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseParticipant {
    pub slot_id: String,
    pub user: PrincipalRef,
    pub amount: f64,
    pub paid: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Expense {
    pub id: String,
    pub owner: PrincipalRef,
    pub title: String,
    pub description: Option<String>,
    /// Total amount fronted by the payer, currency-agnostic.
    pub amount: f64,
    pub category: Category,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
    pub is_split: bool,
    pub split_type: SplitType,
    /// Only the OTHER parties; the payer's own share is implicit.
    pub participants: Vec<ExpenseParticipant>,
    pub paid_by: PrincipalRef,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn participant_for(&self, principal_id: &str) -> Option<&ExpenseParticipant> {
        self.participants.iter().find(|p| p.user.is_principal(principal_id))
    }

    pub fn participant_by_slot(&self, slot_id: &str) -> Option<&ExpenseParticipant> {
        self.participants.iter().find(|p| p.slot_id == slot_id)
    }

    pub fn is_owner(&self, principal_id: &str) -> bool {
        self.owner.is_principal(principal_id)
    }

    pub fn is_payer(&self, principal_id: &str) -> bool {
        self.paid_by.is_principal(principal_id)
    }
}
