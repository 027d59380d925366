use crate::core::principal::PrincipalRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    #[default]
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Owner => "owner",
            Role::Member => "member",
        };
        write!(f, "{}", s)
    }
}

/// A traveler on a group trip. Exactly one entry carries role=owner: the
/// creator, which can never be removed.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ItineraryParticipant {
    pub slot_id: String,
    pub user: PrincipalRef,
    pub role: Role,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub joined_at: DateTime<Utc>,
}

impl ItineraryParticipant {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

/// A planned activity. Items have no identity of their own beyond their
/// position in the itinerary's owned sequence.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ItineraryItem {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[schema(value_type = String, example = "2024-06-01T09:00:00Z")]
    pub start_time: DateTime<Utc>,
    #[schema(value_type = Option<String>, example = "2024-06-01T11:00:00Z")]
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Itinerary {
    pub id: String,
    pub owner: PrincipalRef,
    pub trip_name: String,
    pub destination: String,
    #[schema(value_type = String, example = "2024-06-01T00:00:00Z")]
    pub start_date: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-08T00:00:00Z")]
    pub end_date: DateTime<Utc>,
    pub description: Option<String>,
    pub is_group_trip: bool,
    pub participants: Vec<ItineraryParticipant>,
    pub items: Vec<ItineraryItem>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

impl Itinerary {
    pub fn owner_entry(&self) -> Option<&ItineraryParticipant> {
        self.participants.iter().find(|p| p.is_owner())
    }

    pub fn participant_for(&self, principal_id: &str) -> Option<&ItineraryParticipant> {
        self.participants.iter().find(|p| p.user.is_principal(principal_id))
    }

    pub fn participant_by_slot(&self, slot_id: &str) -> Option<&ItineraryParticipant> {
        self.participants.iter().find(|p| p.slot_id == slot_id)
    }

    pub fn is_owner(&self, principal_id: &str) -> bool {
        self.owner.is_principal(principal_id)
    }

    pub fn is_participant(&self, principal_id: &str) -> bool {
        self.participant_for(principal_id).is_some()
    }
}
