use crate::core::errors::TriptallyError;
use crate::core::models::{expense::Expense, itinerary::Itinerary, user::User};
use async_trait::async_trait;

/// Document-store access for the two collections plus the user directory.
/// Single-document writes are atomic; nothing spans both collections.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, TriptallyError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, TriptallyError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, TriptallyError>;
    /// Case-insensitive substring match on email, excluding the requester.
    async fn search_users_by_email(
        &self,
        fragment: &str,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<User>, TriptallyError>;

    async fn save_expense(&self, expense: Expense) -> Result<(), TriptallyError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, TriptallyError>;
    /// Owner-scoped delete; Ok(false) when no (id, owner) pair matches.
    async fn delete_expense(&self, expense_id: &str, owner_id: &str) -> Result<bool, TriptallyError>;
    async fn get_expenses_by_owner(&self, owner_id: &str) -> Result<Vec<Expense>, TriptallyError>;
    /// Split expenses listing the given principal among their participants.
    async fn get_split_expenses_with_participant(&self, user_id: &str) -> Result<Vec<Expense>, TriptallyError>;
    /// Flips one participant's paid flag inside a single document write so
    /// concurrent toggles never lose an update. Returns the updated expense.
    async fn toggle_expense_participant_paid(
        &self,
        expense_id: &str,
        slot_id: &str,
    ) -> Result<Expense, TriptallyError>;

    async fn save_itinerary(&self, itinerary: Itinerary) -> Result<(), TriptallyError>;
    async fn get_itinerary(&self, itinerary_id: &str) -> Result<Option<Itinerary>, TriptallyError>;
    async fn delete_itinerary(&self, itinerary_id: &str, owner_id: &str) -> Result<bool, TriptallyError>;
    async fn get_itineraries_by_owner(&self, owner_id: &str) -> Result<Vec<Itinerary>, TriptallyError>;
    /// Group itineraries listing the given principal among their participants.
    async fn get_group_itineraries_with_participant(&self, user_id: &str) -> Result<Vec<Itinerary>, TriptallyError>;
}

pub mod in_memory;
