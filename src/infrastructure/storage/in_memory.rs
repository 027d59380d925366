use crate::core::errors::TriptallyError;
use crate::core::models::{expense::Expense, itinerary::Itinerary, user::User};
use crate::core::principal::as_comparable_id;
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use bcrypt::hash;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    users_by_email: Arc<RwLock<HashMap<String, String>>>, // email -> user_id
    expenses: Arc<RwLock<HashMap<String, Expense>>>,
    itineraries: Arc<RwLock<HashMap<String, Itinerary>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            users: Arc::new(RwLock::new(HashMap::new())),
            users_by_email: Arc::new(RwLock::new(HashMap::new())),
            expenses: Arc::new(RwLock::new(HashMap::new())),
            itineraries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<User, TriptallyError> {
        let mut users_by_email = self.users_by_email.write().await;
        if users_by_email.contains_key(&user.email) {
            return Err(TriptallyError::EmailAlreadyRegistered(user.email));
        }
        let hashed_user = User {
            password: hash(&user.password, bcrypt::DEFAULT_COST)
                .map_err(|e| TriptallyError::InternalServerError(format!("Password hashing error: {}", e)))?,
            ..user
        };
        users_by_email.insert(hashed_user.email.clone(), hashed_user.id.clone());
        let mut users = self.users.write().await;
        users.insert(hashed_user.id.clone(), hashed_user.clone());
        Ok(hashed_user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, TriptallyError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, TriptallyError> {
        // For production: use a database index on email
        let user_id = self.users_by_email.read().await.get(email).cloned();
        Ok(match user_id {
            Some(id) => self.users.read().await.get(&id).cloned(),
            None => None,
        })
    }

    async fn search_users_by_email(
        &self,
        fragment: &str,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<User>, TriptallyError> {
        let needle = fragment.to_ascii_lowercase();
        let excluded = as_comparable_id(exclude_user_id);
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.email.to_ascii_lowercase().contains(&needle) && as_comparable_id(&u.id) != excluded)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), TriptallyError> {
        let mut expenses = self.expenses.write().await;
        expenses.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, TriptallyError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.get(expense_id).cloned())
    }

    async fn delete_expense(&self, expense_id: &str, owner_id: &str) -> Result<bool, TriptallyError> {
        let mut expenses = self.expenses.write().await;
        match expenses.get(expense_id) {
            Some(expense) if expense.owner.is_principal(owner_id) => {
                expenses.remove(expense_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_expenses_by_owner(&self, owner_id: &str) -> Result<Vec<Expense>, TriptallyError> {
        // For production: use a database query with an index on owner
        let expenses = self.expenses.read().await;
        Ok(expenses
            .values()
            .filter(|e| e.owner.is_principal(owner_id))
            .cloned()
            .collect())
    }

    async fn get_split_expenses_with_participant(&self, user_id: &str) -> Result<Vec<Expense>, TriptallyError> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .values()
            .filter(|e| e.is_split && e.participant_for(user_id).is_some())
            .cloned()
            .collect())
    }

    async fn toggle_expense_participant_paid(
        &self,
        expense_id: &str,
        slot_id: &str,
    ) -> Result<Expense, TriptallyError> {
        // Read-modify-write under the write lock, the in-memory analogue of a
        // positional sub-document update.
        let mut expenses = self.expenses.write().await;
        let expense = expenses
            .get_mut(expense_id)
            .ok_or_else(|| TriptallyError::ExpenseNotFound(expense_id.to_string()))?;
        let participant = expense
            .participants
            .iter_mut()
            .find(|p| p.slot_id == slot_id)
            .ok_or_else(|| TriptallyError::ParticipantNotFound(slot_id.to_string()))?;
        participant.paid = !participant.paid;
        expense.updated_at = chrono::Utc::now();
        Ok(expense.clone())
    }

    async fn save_itinerary(&self, itinerary: Itinerary) -> Result<(), TriptallyError> {
        let mut itineraries = self.itineraries.write().await;
        itineraries.insert(itinerary.id.clone(), itinerary);
        Ok(())
    }

    async fn get_itinerary(&self, itinerary_id: &str) -> Result<Option<Itinerary>, TriptallyError> {
        let itineraries = self.itineraries.read().await;
        Ok(itineraries.get(itinerary_id).cloned())
    }

    async fn delete_itinerary(&self, itinerary_id: &str, owner_id: &str) -> Result<bool, TriptallyError> {
        let mut itineraries = self.itineraries.write().await;
        match itineraries.get(itinerary_id) {
            Some(itinerary) if itinerary.owner.is_principal(owner_id) => {
                itineraries.remove(itinerary_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_itineraries_by_owner(&self, owner_id: &str) -> Result<Vec<Itinerary>, TriptallyError> {
        let itineraries = self.itineraries.read().await;
        Ok(itineraries
            .values()
            .filter(|i| i.owner.is_principal(owner_id))
            .cloned()
            .collect())
    }

    async fn get_group_itineraries_with_participant(&self, user_id: &str) -> Result<Vec<Itinerary>, TriptallyError> {
        let itineraries = self.itineraries.read().await;
        Ok(itineraries
            .values()
            .filter(|i| i.is_group_trip && i.is_participant(user_id))
            .cloned()
            .collect())
    }
}
