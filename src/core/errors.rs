use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize)]
pub enum TriptallyError {
    /// Email field is empty
    #[error("Email is required")]
    MissingEmail,

    /// Email format is invalid
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Email is already registered
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Login failed
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Request carries no valid authenticated principal
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User with given ID not found
    #[error("User {0} not found")]
    UserNotFound(String),

    /// Expense with given ID not found
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    /// Itinerary with given ID not found
    #[error("Itinerary {0} not found")]
    ItineraryNotFound(String),

    /// Participant entry with given slot ID not found in the aggregate
    #[error("Participant {0} not found")]
    ParticipantNotFound(String),

    /// Principal is not permitted to perform the operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// User is already a participant of the itinerary
    #[error("User {0} is already a participant")]
    AlreadyParticipant(String),

    /// The owner entry of an itinerary can never be removed
    #[error("Cannot remove owner")]
    CannotRemoveOwner,

    /// Split amounts are inconsistent with the expense total
    #[error("Invalid split amounts")]
    InvalidSplit,

    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Internal server error (e.g., unexpected failure)
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}
