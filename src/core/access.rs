//! Read/write/participant-management rights for owner-vs-participant
//! relationships, shared by both aggregates. All checks compare principals
//! through their normalized ids.

use crate::core::models::expense::{Expense, ExpenseParticipant};
use crate::core::models::itinerary::Itinerary;

pub fn can_view_expense(expense: &Expense, principal_id: &str) -> bool {
    expense.is_owner(principal_id) || (expense.is_split && expense.participant_for(principal_id).is_some())
}

/// Update rights: the owner or whoever fronted the money.
pub fn can_edit_expense(expense: &Expense, principal_id: &str) -> bool {
    expense.is_owner(principal_id) || expense.is_payer(principal_id)
}

pub fn can_delete_expense(expense: &Expense, principal_id: &str) -> bool {
    expense.is_owner(principal_id)
}

/// The paid flag is flipped by the participant themselves or by the owner.
pub fn can_toggle_paid(expense: &Expense, participant: &ExpenseParticipant, principal_id: &str) -> bool {
    participant.user.is_principal(principal_id) || expense.is_owner(principal_id)
}

pub fn can_view_itinerary(itinerary: &Itinerary, principal_id: &str) -> bool {
    itinerary.is_owner(principal_id) || (itinerary.is_group_trip && itinerary.is_participant(principal_id))
}

/// Any group participant may update the itinerary body, but changes to the
/// participant list itself stay owner-only (checked separately).
pub fn can_edit_itinerary(itinerary: &Itinerary, principal_id: &str) -> bool {
    itinerary.is_owner(principal_id) || (itinerary.is_group_trip && itinerary.is_participant(principal_id))
}

pub fn can_manage_participants(itinerary: &Itinerary, principal_id: &str) -> bool {
    itinerary.is_owner(principal_id)
}

pub fn can_delete_itinerary(itinerary: &Itinerary, principal_id: &str) -> bool {
    itinerary.is_owner(principal_id)
}
