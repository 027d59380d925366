use crate::auth::jwt::{Claims, JwtService};
use crate::config::CONFIG;
use crate::constants::{
    CATEGORY_STATS_QUERIED, EXPENSE_CREATED, EXPENSE_DELETED, EXPENSE_UPDATED, EXPENSES_QUERIED, ITINERARIES_QUERIED,
    ITINERARY_CREATED, ITINERARY_DELETED, ITINERARY_UPDATED, MAX_AMOUNT, PARTICIPANT_ADDED, PARTICIPANT_PAID_TOGGLED,
    PARTICIPANT_REMOVED, USER_REGISTERED, USER_SEARCH_LIMIT, USERS_SEARCHED,
};
use crate::core::access;
use crate::core::errors::{FieldError, TriptallyError};
use crate::core::models::{
    audit::AppLog,
    expense::{Category, Expense, SplitType},
    itinerary::{Itinerary, ItineraryItem, ItineraryParticipant, Role},
    user::{User, UserSummary},
};
use crate::core::principal::PrincipalRef;
use crate::core::split::{SplitParticipantInput, compute_participant_shares};
use crate::infrastructure::cache::{Cache, CategoryStats};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Payload for creating an expense.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct ExpenseDraft {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub category: Category,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub is_split: bool,
    #[serde(default)]
    pub split_type: SplitType,
    #[serde(default)]
    pub participants: Vec<SplitParticipantInput>,
    pub paid_by: Option<PrincipalRef>,
}

/// Partial update merged onto an existing expense. Supplying `participants`
/// together with a split flag recomputes the stored shares.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<Category>,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub date: Option<DateTime<Utc>>,
    pub is_split: Option<bool>,
    pub split_type: Option<SplitType>,
    pub participants: Option<Vec<SplitParticipantInput>>,
    pub paid_by: Option<PrincipalRef>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct ItineraryDraft {
    pub trip_name: String,
    pub destination: String,
    #[schema(value_type = String, example = "2024-06-01T00:00:00Z")]
    pub start_date: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-08T00:00:00Z")]
    pub end_date: DateTime<Utc>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_group_trip: bool,
    #[serde(default)]
    pub participants: Vec<PrincipalRef>,
    #[serde(default)]
    pub items: Vec<ItineraryItem>,
}

/// Partial update merged onto an existing itinerary. A `participants` payload
/// is owner-only and rebuilds the member list around the immutable owner.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct ItineraryUpdate {
    pub trip_name: Option<String>,
    pub destination: Option<String>,
    #[schema(value_type = Option<String>, example = "2024-06-01T00:00:00Z")]
    pub start_date: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, example = "2024-06-08T00:00:00Z")]
    pub end_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub is_group_trip: Option<bool>,
    pub participants: Option<Vec<PrincipalRef>>,
    pub items: Option<Vec<ItineraryItem>>,
}

pub struct TriptallyService<L: LoggingService, S: Storage, C: Cache> {
    storage: S,
    logging: L,
    cache: C,
    jwt_service: JwtService,
}

impl<L: LoggingService, S: Storage, C: Cache> TriptallyService<L, S, C> {
    pub fn new(storage: S, logging: L, cache: C, jwt_secret: String) -> Self {
        info!("Initializing TriptallyService");
        TriptallyService {
            storage,
            logging,
            cache,
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, TriptallyError> {
        self.jwt_service.validate_token(token)
    }

    // USERS & AUTH

    pub async fn register_user(&self, name: String, email: String, password: String) -> Result<User, TriptallyError> {
        if email.is_empty() {
            return Err(TriptallyError::MissingEmail);
        }
        if !email.contains('@') || !email.contains('.') || email.len() < 5 {
            return Err(TriptallyError::InvalidEmail(email));
        }
        if password.is_empty() {
            return Err(TriptallyError::InvalidInput(
                "password".to_string(),
                FieldError {
                    field: "password".to_string(),
                    title: "Invalid password".to_string(),
                    description: "Password cannot be empty".to_string(),
                },
            ));
        }
        self.validate_string_input("name", &name, 100)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password,
        };
        let created = self.storage.create_user(user).await?;
        debug!("User registered with ID: {}", created.id);

        self.logging
            .log_action(
                USER_REGISTERED,
                json!({ "user_id": created.id, "email": created.email }),
                Some(&created.id),
            )
            .await?;
        Ok(created)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, TriptallyError> {
        let user = self
            .storage
            .get_user_by_email(email)
            .await?
            .ok_or(TriptallyError::InvalidCredentials)?;

        if bcrypt::verify(password, &user.password)
            .map_err(|e| TriptallyError::InternalServerError(format!("Password verification error: {}", e)))?
        {
            self.jwt_service.generate_token(&user.id, "USER")
        } else {
            Err(TriptallyError::InvalidCredentials)
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, TriptallyError> {
        self.storage.get_user(user_id).await
    }

    /// Directory lookup used when adding co-travelers to a split or trip.
    pub async fn search_users(&self, email_fragment: &str, requester: &User) -> Result<Vec<UserSummary>, TriptallyError> {
        if email_fragment.trim().is_empty() {
            return Err(TriptallyError::InvalidInput(
                "email".to_string(),
                FieldError {
                    field: "email".to_string(),
                    title: "Invalid email query".to_string(),
                    description: "Email query parameter is required".to_string(),
                },
            ));
        }

        let matches = self
            .storage
            .search_users_by_email(email_fragment, &requester.id, USER_SEARCH_LIMIT)
            .await?;

        self.logging
            .log_action(
                USERS_SEARCHED,
                json!({ "query": email_fragment, "hits": matches.len() }),
                Some(&requester.id),
            )
            .await?;

        Ok(matches.iter().map(UserSummary::from).collect())
    }

    // EXPENSE AGGREGATE

    pub async fn create_expense(&self, draft: ExpenseDraft, creator: &User) -> Result<Expense, TriptallyError> {
        info!("Creating expense '{}' for user {}", draft.title, creator.id);
        self.validate_string_input("title", &draft.title, 255)?;
        if let Some(ref description) = draft.description {
            self.validate_string_input("description", description, 1000)?;
        }
        self.validate_amount_input("amount", draft.amount)?;

        let paid_by = draft.paid_by.unwrap_or_else(|| PrincipalRef::Id(creator.id.clone()));
        self.ensure_user_exists(&paid_by).await?;

        let participants = if draft.is_split && !draft.participants.is_empty() {
            self.ensure_split_users_exist(&draft.participants).await?;
            compute_participant_shares(draft.amount, draft.split_type, &draft.participants, &[])?
        } else {
            Vec::new()
        };

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            owner: PrincipalRef::Id(creator.id.clone()),
            title: draft.title,
            description: draft.description,
            amount: draft.amount,
            category: draft.category,
            date: draft.date,
            is_split: draft.is_split,
            split_type: draft.split_type,
            participants,
            paid_by,
            created_at: now,
            updated_at: now,
        };

        self.storage.save_expense(expense.clone()).await?;
        self.cache
            .invalidate_category_stats(&Self::touched_principals(&expense))
            .await?;

        self.logging
            .log_action(
                EXPENSE_CREATED,
                json!({
                    "expense_id": expense.id,
                    "amount": expense.amount,
                    "is_split": expense.is_split,
                    "participant_count": expense.participants.len()
                }),
                Some(&creator.id),
            )
            .await?;

        self.expand_expense(expense).await
    }

    pub async fn update_expense(
        &self,
        expense_id: &str,
        update: ExpenseUpdate,
        requester: &User,
    ) -> Result<Expense, TriptallyError> {
        info!("Updating expense {} by user {}", expense_id, requester.id);
        let mut expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| TriptallyError::ExpenseNotFound(expense_id.to_string()))?;

        if !access::can_edit_expense(&expense, &requester.id) {
            warn!("User {} not permitted to edit expense {}", requester.id, expense_id);
            return Err(TriptallyError::AccessDenied(
                "Only the owner or payer can update an expense".to_string(),
            ));
        }

        let previously_touched = Self::touched_principals(&expense);

        if let Some(title) = update.title {
            self.validate_string_input("title", &title, 255)?;
            expense.title = title;
        }
        if let Some(description) = update.description {
            self.validate_string_input("description", &description, 1000)?;
            expense.description = Some(description);
        }
        if let Some(amount) = update.amount {
            self.validate_amount_input("amount", amount)?;
            expense.amount = amount;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        if let Some(paid_by) = update.paid_by {
            self.ensure_user_exists(&paid_by).await?;
            expense.paid_by = paid_by;
        }
        expense.is_split = update.is_split.unwrap_or(expense.is_split);
        expense.split_type = update.split_type.unwrap_or(expense.split_type);

        if expense.is_split {
            if let Some(ref inputs) = update.participants {
                if !inputs.is_empty() {
                    self.ensure_split_users_exist(inputs).await?;
                    expense.participants =
                        compute_participant_shares(expense.amount, expense.split_type, inputs, &expense.participants)?;
                }
            }
        }

        expense.updated_at = Utc::now();
        self.storage.save_expense(expense.clone()).await?;

        let mut touched = previously_touched;
        for id in Self::touched_principals(&expense) {
            if !touched.contains(&id) {
                touched.push(id);
            }
        }
        self.cache.invalidate_category_stats(&touched).await?;

        self.logging
            .log_action(
                EXPENSE_UPDATED,
                json!({ "expense_id": expense.id, "amount": expense.amount }),
                Some(&requester.id),
            )
            .await?;

        self.expand_expense(expense).await
    }

    /// Flips a participant's paid flag through the store's atomic
    /// sub-document update; applying it twice restores the original state.
    pub async fn toggle_participant_paid(
        &self,
        expense_id: &str,
        slot_id: &str,
        requester: &User,
    ) -> Result<Expense, TriptallyError> {
        let expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| TriptallyError::ExpenseNotFound(expense_id.to_string()))?;

        let participant = expense
            .participant_by_slot(slot_id)
            .ok_or_else(|| TriptallyError::ParticipantNotFound(slot_id.to_string()))?;

        if !access::can_toggle_paid(&expense, participant, &requester.id) {
            warn!(
                "User {} not permitted to toggle paid on expense {}",
                requester.id, expense_id
            );
            return Err(TriptallyError::AccessDenied(
                "Only the participant themselves or the owner can mark a share paid".to_string(),
            ));
        }

        let updated = self.storage.toggle_expense_participant_paid(expense_id, slot_id).await?;
        self.cache
            .invalidate_category_stats(&Self::touched_principals(&updated))
            .await?;

        self.logging
            .log_action(
                PARTICIPANT_PAID_TOGGLED,
                json!({ "expense_id": expense_id, "slot_id": slot_id }),
                Some(&requester.id),
            )
            .await?;

        self.expand_expense(updated).await
    }

    pub async fn delete_expense(&self, expense_id: &str, requester: &User) -> Result<(), TriptallyError> {
        info!("Deleting expense {} by user {}", expense_id, requester.id);
        let expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| TriptallyError::ExpenseNotFound(expense_id.to_string()))?;

        if !access::can_delete_expense(&expense, &requester.id) {
            warn!("User {} not permitted to delete expense {}", requester.id, expense_id);
            return Err(TriptallyError::AccessDenied(
                "Only the owner can delete an expense".to_string(),
            ));
        }

        let removed = self.storage.delete_expense(expense_id, &requester.id).await?;
        if !removed {
            return Err(TriptallyError::ExpenseNotFound(expense_id.to_string()));
        }
        self.cache
            .invalidate_category_stats(&Self::touched_principals(&expense))
            .await?;

        self.logging
            .log_action(
                EXPENSE_DELETED,
                json!({ "expense_id": expense_id }),
                Some(&requester.id),
            )
            .await?;
        Ok(())
    }

    /// Everything visible to the principal: owned expenses plus split
    /// expenses they participate in, deduplicated, newest first.
    pub async fn list_expenses(&self, requester: &User) -> Result<Vec<Expense>, TriptallyError> {
        let mut all = self.storage.get_expenses_by_owner(&requester.id).await?;
        for shared in self.storage.get_split_expenses_with_participant(&requester.id).await? {
            if !all.iter().any(|e| e.id == shared.id) {
                all.push(shared);
            }
        }
        all.sort_by(|a, b| b.date.cmp(&a.date));

        let mut expanded = Vec::with_capacity(all.len());
        for expense in all {
            expanded.push(self.expand_expense(expense).await?);
        }

        self.logging
            .log_action(
                EXPENSES_QUERIED,
                json!({ "count": expanded.len() }),
                Some(&requester.id),
            )
            .await?;
        Ok(expanded)
    }

    pub async fn get_expense(&self, expense_id: &str, requester: &User) -> Result<Expense, TriptallyError> {
        let expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| TriptallyError::ExpenseNotFound(expense_id.to_string()))?;

        if !access::can_view_expense(&expense, &requester.id) {
            return Err(TriptallyError::AccessDenied("Access denied".to_string()));
        }
        self.expand_expense(expense).await
    }

    /// Per-category totals for the principal: full amounts of owned
    /// expenses, plus their own stored share of split expenses they
    /// participate in. No payer-share heuristic is applied here.
    pub async fn category_stats(&self, requester: &User) -> Result<CategoryStats, TriptallyError> {
        if let Some(stats) = self.cache.get_category_stats(&requester.id).await? {
            debug!("Category stats cache hit for user {}", requester.id);
            return Ok(stats);
        }

        let mut stats = CategoryStats::new();
        for expense in self.storage.get_expenses_by_owner(&requester.id).await? {
            *stats.entry(expense.category.to_string()).or_insert(0.0) += expense.amount;
        }
        for expense in self.storage.get_split_expenses_with_participant(&requester.id).await? {
            if let Some(participant) = expense.participant_for(&requester.id) {
                *stats.entry(expense.category.to_string()).or_insert(0.0) += participant.amount;
            }
        }

        self.cache
            .save_category_stats(
                &requester.id,
                &stats,
                std::time::Duration::from_secs(CONFIG.stats_cache_ttl_secs),
            )
            .await?;

        self.logging
            .log_action(CATEGORY_STATS_QUERIED, json!({}), Some(&requester.id))
            .await?;
        Ok(stats)
    }

    // ITINERARY AGGREGATE

    pub async fn create_itinerary(&self, draft: ItineraryDraft, creator: &User) -> Result<Itinerary, TriptallyError> {
        info!("Creating itinerary '{}' for user {}", draft.trip_name, creator.id);
        self.validate_string_input("trip_name", &draft.trip_name, 255)?;
        self.validate_string_input("destination", &draft.destination, 255)?;
        Self::validate_date_order("end_date", draft.start_date, draft.end_date)?;
        Self::validate_items(&draft.items)?;

        let now = Utc::now();
        let mut participants = vec![ItineraryParticipant {
            slot_id: Uuid::new_v4().to_string(),
            user: PrincipalRef::Id(creator.id.clone()),
            role: Role::Owner,
            joined_at: now,
        }];

        if draft.is_group_trip {
            for user in &draft.participants {
                if user.is_principal(&creator.id) {
                    continue; // creator already holds the owner slot
                }
                if participants.iter().any(|p| p.user == *user) {
                    continue;
                }
                self.ensure_user_exists(user).await?;
                participants.push(ItineraryParticipant {
                    slot_id: Uuid::new_v4().to_string(),
                    user: user.clone(),
                    role: Role::Member,
                    joined_at: now,
                });
            }
        }

        let itinerary = Itinerary {
            id: Uuid::new_v4().to_string(),
            owner: PrincipalRef::Id(creator.id.clone()),
            trip_name: draft.trip_name,
            destination: draft.destination,
            start_date: draft.start_date,
            end_date: draft.end_date,
            description: draft.description,
            is_group_trip: draft.is_group_trip,
            participants,
            items: draft.items,
            created_at: now,
            updated_at: now,
        };

        self.storage.save_itinerary(itinerary.clone()).await?;
        self.logging
            .log_action(
                ITINERARY_CREATED,
                json!({
                    "itinerary_id": itinerary.id,
                    "is_group_trip": itinerary.is_group_trip,
                    "participant_count": itinerary.participants.len()
                }),
                Some(&creator.id),
            )
            .await?;

        self.expand_itinerary(itinerary).await
    }

    pub async fn update_itinerary(
        &self,
        itinerary_id: &str,
        update: ItineraryUpdate,
        requester: &User,
    ) -> Result<Itinerary, TriptallyError> {
        info!("Updating itinerary {} by user {}", itinerary_id, requester.id);
        let mut itinerary = self
            .storage
            .get_itinerary(itinerary_id)
            .await?
            .ok_or_else(|| TriptallyError::ItineraryNotFound(itinerary_id.to_string()))?;

        let is_owner = itinerary.is_owner(&requester.id);
        if !access::can_edit_itinerary(&itinerary, &requester.id) {
            warn!("User {} not permitted to edit itinerary {}", requester.id, itinerary_id);
            return Err(TriptallyError::AccessDenied("Access denied".to_string()));
        }
        if update.participants.is_some() && !is_owner {
            warn!(
                "Non-owner {} attempted a participant change on itinerary {}",
                requester.id, itinerary_id
            );
            return Err(TriptallyError::AccessDenied(
                "Only the owner can modify participants".to_string(),
            ));
        }

        if let Some(trip_name) = update.trip_name {
            self.validate_string_input("trip_name", &trip_name, 255)?;
            itinerary.trip_name = trip_name;
        }
        if let Some(destination) = update.destination {
            self.validate_string_input("destination", &destination, 255)?;
            itinerary.destination = destination;
        }
        if let Some(description) = update.description {
            itinerary.description = Some(description);
        }
        if let Some(is_group_trip) = update.is_group_trip {
            itinerary.is_group_trip = is_group_trip;
        }

        let start_date = update.start_date.unwrap_or(itinerary.start_date);
        let end_date = update.end_date.unwrap_or(itinerary.end_date);
        Self::validate_date_order("end_date", start_date, end_date)?;
        itinerary.start_date = start_date;
        itinerary.end_date = end_date;

        if let Some(items) = update.items {
            Self::validate_items(&items)?;
            itinerary.items = items;
        }

        if let Some(ref members) = update.participants {
            itinerary.participants = self.rebuild_participants(&itinerary, members).await?;
        }

        itinerary.updated_at = Utc::now();
        self.storage.save_itinerary(itinerary.clone()).await?;

        self.logging
            .log_action(
                ITINERARY_UPDATED,
                json!({ "itinerary_id": itinerary.id }),
                Some(&requester.id),
            )
            .await?;

        self.expand_itinerary(itinerary).await
    }

    pub async fn add_participant(
        &self,
        itinerary_id: &str,
        user: PrincipalRef,
        requester: &User,
    ) -> Result<Itinerary, TriptallyError> {
        let mut itinerary = self
            .storage
            .get_itinerary(itinerary_id)
            .await?
            .ok_or_else(|| TriptallyError::ItineraryNotFound(itinerary_id.to_string()))?;

        if !access::can_manage_participants(&itinerary, &requester.id) {
            return Err(TriptallyError::AccessDenied(
                "Only the owner can add participants".to_string(),
            ));
        }
        self.ensure_user_exists(&user).await?;
        if itinerary.is_participant(&user.as_comparable_id()) {
            return Err(TriptallyError::AlreadyParticipant(user.raw_id().to_string()));
        }

        itinerary.participants.push(ItineraryParticipant {
            slot_id: Uuid::new_v4().to_string(),
            user: user.clone(),
            role: Role::Member,
            joined_at: Utc::now(),
        });
        // Adding a traveler makes this a group trip.
        itinerary.is_group_trip = true;
        itinerary.updated_at = Utc::now();
        self.storage.save_itinerary(itinerary.clone()).await?;

        self.logging
            .log_action(
                PARTICIPANT_ADDED,
                json!({ "itinerary_id": itinerary.id, "user_id": user.raw_id() }),
                Some(&requester.id),
            )
            .await?;

        self.expand_itinerary(itinerary).await
    }

    pub async fn remove_participant(
        &self,
        itinerary_id: &str,
        slot_id: &str,
        requester: &User,
    ) -> Result<Itinerary, TriptallyError> {
        let mut itinerary = self
            .storage
            .get_itinerary(itinerary_id)
            .await?
            .ok_or_else(|| TriptallyError::ItineraryNotFound(itinerary_id.to_string()))?;

        if !access::can_manage_participants(&itinerary, &requester.id) {
            return Err(TriptallyError::AccessDenied(
                "Only the owner can remove participants".to_string(),
            ));
        }

        let participant = itinerary
            .participant_by_slot(slot_id)
            .ok_or_else(|| TriptallyError::ParticipantNotFound(slot_id.to_string()))?;
        if participant.is_owner() {
            warn!("Attempted to remove the owner from itinerary {}", itinerary_id);
            return Err(TriptallyError::CannotRemoveOwner);
        }

        let removed_id = participant.user.raw_id().to_string();
        itinerary.participants.retain(|p| p.slot_id != slot_id);
        itinerary.updated_at = Utc::now();
        self.storage.save_itinerary(itinerary.clone()).await?;

        self.logging
            .log_action(
                PARTICIPANT_REMOVED,
                json!({ "itinerary_id": itinerary.id, "user_id": removed_id }),
                Some(&requester.id),
            )
            .await?;

        self.expand_itinerary(itinerary).await
    }

    pub async fn delete_itinerary(&self, itinerary_id: &str, requester: &User) -> Result<(), TriptallyError> {
        info!("Deleting itinerary {} by user {}", itinerary_id, requester.id);
        let itinerary = self
            .storage
            .get_itinerary(itinerary_id)
            .await?
            .ok_or_else(|| TriptallyError::ItineraryNotFound(itinerary_id.to_string()))?;

        if !access::can_delete_itinerary(&itinerary, &requester.id) {
            warn!("User {} not permitted to delete itinerary {}", requester.id, itinerary_id);
            return Err(TriptallyError::AccessDenied(
                "Only the owner can delete an itinerary".to_string(),
            ));
        }

        let removed = self.storage.delete_itinerary(itinerary_id, &requester.id).await?;
        if !removed {
            return Err(TriptallyError::ItineraryNotFound(itinerary_id.to_string()));
        }

        self.logging
            .log_action(
                ITINERARY_DELETED,
                json!({ "itinerary_id": itinerary_id }),
                Some(&requester.id),
            )
            .await?;
        Ok(())
    }

    /// Owned itineraries plus group trips the principal participates in,
    /// deduplicated, most recent departure first.
    pub async fn list_itineraries(&self, requester: &User) -> Result<Vec<Itinerary>, TriptallyError> {
        let mut all = self.storage.get_itineraries_by_owner(&requester.id).await?;
        for shared in self
            .storage
            .get_group_itineraries_with_participant(&requester.id)
            .await?
        {
            if !all.iter().any(|i| i.id == shared.id) {
                all.push(shared);
            }
        }
        all.sort_by(|a, b| b.start_date.cmp(&a.start_date));

        let mut expanded = Vec::with_capacity(all.len());
        for itinerary in all {
            expanded.push(self.expand_itinerary(itinerary).await?);
        }

        self.logging
            .log_action(
                ITINERARIES_QUERIED,
                json!({ "count": expanded.len() }),
                Some(&requester.id),
            )
            .await?;
        Ok(expanded)
    }

    pub async fn get_itinerary(&self, itinerary_id: &str, requester: &User) -> Result<Itinerary, TriptallyError> {
        let itinerary = self
            .storage
            .get_itinerary(itinerary_id)
            .await?
            .ok_or_else(|| TriptallyError::ItineraryNotFound(itinerary_id.to_string()))?;

        if !access::can_view_itinerary(&itinerary, &requester.id) {
            return Err(TriptallyError::AccessDenied("Access denied".to_string()));
        }
        self.expand_itinerary(itinerary).await
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, TriptallyError> {
        self.logging.get_logs().await
    }

    // HELPERS

    /// Rebuilds the member list from an owner-supplied set of principals,
    /// keeping the owner entry and each continuing member's slot and
    /// joined_at intact.
    async fn rebuild_participants(
        &self,
        itinerary: &Itinerary,
        members: &[PrincipalRef],
    ) -> Result<Vec<ItineraryParticipant>, TriptallyError> {
        let now = Utc::now();
        let owner_entry = match itinerary.owner_entry() {
            Some(existing) => existing.clone(),
            None => ItineraryParticipant {
                slot_id: Uuid::new_v4().to_string(),
                user: itinerary.owner.clone(),
                role: Role::Owner,
                joined_at: now,
            },
        };

        let mut rebuilt = vec![owner_entry];
        for user in members {
            if user == &itinerary.owner {
                continue;
            }
            if rebuilt.iter().any(|p| p.user == *user) {
                continue;
            }
            self.ensure_user_exists(user).await?;
            match itinerary.participant_for(&user.as_comparable_id()) {
                Some(previous) => rebuilt.push(ItineraryParticipant {
                    slot_id: previous.slot_id.clone(),
                    user: user.clone(),
                    role: Role::Member,
                    joined_at: previous.joined_at,
                }),
                None => rebuilt.push(ItineraryParticipant {
                    slot_id: Uuid::new_v4().to_string(),
                    user: user.clone(),
                    role: Role::Member,
                    joined_at: now,
                }),
            }
        }
        Ok(rebuilt)
    }

    /// Principals whose cached stats an expense mutation invalidates.
    fn touched_principals(expense: &Expense) -> Vec<String> {
        let mut ids = vec![expense.owner.as_comparable_id()];
        let payer = expense.paid_by.as_comparable_id();
        if !ids.contains(&payer) {
            ids.push(payer);
        }
        for participant in &expense.participants {
            let id = participant.user.as_comparable_id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    async fn ensure_user_exists(&self, user: &PrincipalRef) -> Result<(), TriptallyError> {
        if self.storage.get_user(user.raw_id()).await?.is_none() {
            return Err(TriptallyError::UserNotFound(user.raw_id().to_string()));
        }
        Ok(())
    }

    async fn ensure_split_users_exist(&self, inputs: &[SplitParticipantInput]) -> Result<(), TriptallyError> {
        for input in inputs {
            self.ensure_user_exists(&input.user).await?;
        }
        Ok(())
    }

    /// Replaces raw principal ids on `paid_by` and the participant entries
    /// with expanded name/email summaries from the user directory.
    async fn expand_expense(&self, mut expense: Expense) -> Result<Expense, TriptallyError> {
        let mut ids: Vec<String> = vec![expense.paid_by.raw_id().to_string()];
        for participant in &expense.participants {
            ids.push(participant.user.raw_id().to_string());
        }
        let directory = self.lookup_users(&ids).await?;

        expense.paid_by = Self::expand_ref(expense.paid_by, &directory);
        for participant in &mut expense.participants {
            participant.user = Self::expand_ref(participant.user.clone(), &directory);
        }
        Ok(expense)
    }

    async fn expand_itinerary(&self, mut itinerary: Itinerary) -> Result<Itinerary, TriptallyError> {
        let ids: Vec<String> = itinerary
            .participants
            .iter()
            .map(|p| p.user.raw_id().to_string())
            .collect();
        let directory = self.lookup_users(&ids).await?;

        for participant in &mut itinerary.participants {
            participant.user = Self::expand_ref(participant.user.clone(), &directory);
        }
        Ok(itinerary)
    }

    async fn lookup_users(&self, ids: &[String]) -> Result<HashMap<String, UserSummary>, TriptallyError> {
        let fetches = ids.iter().map(|id| self.storage.get_user(id));
        let results = join_all(fetches).await;

        let mut directory = HashMap::new();
        for (id, result) in ids.iter().zip(results) {
            if let Some(user) = result? {
                directory.insert(crate::core::principal::as_comparable_id(id), UserSummary::from(&user));
            }
        }
        Ok(directory)
    }

    fn expand_ref(principal: PrincipalRef, directory: &HashMap<String, UserSummary>) -> PrincipalRef {
        match directory.get(&principal.as_comparable_id()) {
            Some(summary) => PrincipalRef::Expanded(summary.clone()),
            None => principal,
        }
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), TriptallyError> {
        if value.trim().is_empty() {
            return Err(TriptallyError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("Invalid {}", field),
                    description: format!("{} cannot be empty", field),
                },
            ));
        }
        if value.len() > max_length {
            return Err(TriptallyError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("{} Too Long", field),
                    description: format!("{} cannot exceed {} characters", field, max_length),
                },
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: f64) -> Result<(), TriptallyError> {
        if !amount.is_finite() {
            return Err(TriptallyError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Invalid Amount".to_string(),
                    description: "Amount must be a finite number".to_string(),
                },
            ));
        }
        if amount < 0.0 {
            return Err(TriptallyError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Invalid Amount".to_string(),
                    description: "Amount cannot be negative".to_string(),
                },
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(TriptallyError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Amount Too Large".to_string(),
                    description: format!("Amount cannot exceed {}", MAX_AMOUNT),
                },
            ));
        }
        Ok(())
    }

    fn validate_date_order(
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), TriptallyError> {
        if end < start {
            return Err(TriptallyError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Invalid date range".to_string(),
                    description: "End date cannot be before start date".to_string(),
                },
            ));
        }
        Ok(())
    }

    fn validate_items(items: &[ItineraryItem]) -> Result<(), TriptallyError> {
        for item in items {
            if item.title.trim().is_empty() {
                return Err(TriptallyError::InvalidInput(
                    "items".to_string(),
                    FieldError {
                        field: "items".to_string(),
                        title: "Invalid item".to_string(),
                        description: "Item title cannot be empty".to_string(),
                    },
                ));
            }
            if let Some(end_time) = item.end_time {
                if end_time < item.start_time {
                    return Err(TriptallyError::InvalidInput(
                        "items".to_string(),
                        FieldError {
                            field: "items".to_string(),
                            title: "Invalid item times".to_string(),
                            description: "Item end time cannot be before its start time".to_string(),
                        },
                    ));
                }
            }
        }
        Ok(())
    }
}
