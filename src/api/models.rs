use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::errors::TriptallyError;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddParticipantRequest {
    pub user_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SearchQuery {
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for TriptallyError to implement IntoResponse
pub struct ApiError(pub TriptallyError);

impl From<TriptallyError> for ApiError {
    fn from(err: TriptallyError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self.0 {
            TriptallyError::MissingEmail => (StatusCode::BAD_REQUEST, "Email is required".to_string()),
            TriptallyError::InvalidEmail(email) => (StatusCode::BAD_REQUEST, format!("Invalid email: {}", email)),
            TriptallyError::EmailAlreadyRegistered(email) => {
                (StatusCode::CONFLICT, format!("Email {} already registered", email))
            }
            TriptallyError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()),
            TriptallyError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            TriptallyError::UserNotFound(id) => (StatusCode::NOT_FOUND, format!("User {} not found", id)),
            TriptallyError::ExpenseNotFound(id) => (StatusCode::NOT_FOUND, format!("Expense {} not found", id)),
            TriptallyError::ItineraryNotFound(id) => (StatusCode::NOT_FOUND, format!("Itinerary {} not found", id)),
            TriptallyError::ParticipantNotFound(id) => (StatusCode::NOT_FOUND, format!("Participant {} not found", id)),
            TriptallyError::AccessDenied(msg) => (StatusCode::FORBIDDEN, msg),
            TriptallyError::AlreadyParticipant(id) => {
                (StatusCode::BAD_REQUEST, format!("User {} is already a participant", id))
            }
            TriptallyError::CannotRemoveOwner => {
                (StatusCode::BAD_REQUEST, "Cannot remove the trip owner".to_string())
            }
            TriptallyError::InvalidSplit => (StatusCode::BAD_REQUEST, "Invalid split amounts".to_string()),
            TriptallyError::InvalidInput(field, details) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid input for {}: {}", field, details.description),
            ),
            TriptallyError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal server error: {}", msg),
            ),
            TriptallyError::StorageError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {}", msg))
            }
            TriptallyError::LoggingError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Logging error: {}", msg))
            }
            TriptallyError::CacheError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Cache error: {}", msg)),
        };
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
