use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::TriptallyError,
        models::{audit::AppLog, expense::Expense, itinerary::Itinerary, user::User, user::UserSummary},
        principal::PrincipalRef,
        services::{ExpenseDraft, ExpenseUpdate, ItineraryDraft, ItineraryUpdate, TriptallyService},
    },
    infrastructure::{
        cache::{CategoryStats, in_memory::InMemoryCache},
        logging::in_memory::InMemoryLogging,
        storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
};
use http::header;

use std::sync::Arc;

// / Middleware to validate JWT
async fn auth_middleware(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| TriptallyError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| TriptallyError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// Resolve the authenticated principal from the token claims
async fn current_user(
    service: &TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>,
    claims: &Claims,
) -> Result<User, TriptallyError> {
    service
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| TriptallyError::UserNotFound(claims.sub.clone()))
}

// Define API routes
pub fn api_routes(service: Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>) -> Router {
    let protected_routes = Router::new()
        .route("/users/search", axum::routing::get(search_users))
        .route("/expenses", axum::routing::get(list_expenses))
        .route("/expenses", axum::routing::post(create_expense))
        .route("/expenses/stats/category", axum::routing::get(get_category_stats))
        .route("/expenses/{expense_id}", axum::routing::get(get_expense))
        .route("/expenses/{expense_id}", axum::routing::put(update_expense))
        .route("/expenses/{expense_id}", axum::routing::delete(delete_expense))
        .route(
            "/expenses/{expense_id}/participants/{participant_id}/paid",
            axum::routing::patch(toggle_participant_paid),
        )
        .route("/itineraries", axum::routing::get(list_itineraries))
        .route("/itineraries", axum::routing::post(create_itinerary))
        .route("/itineraries/{itinerary_id}", axum::routing::get(get_itinerary))
        .route("/itineraries/{itinerary_id}", axum::routing::put(update_itinerary))
        .route("/itineraries/{itinerary_id}", axum::routing::delete(delete_itinerary))
        .route(
            "/itineraries/{itinerary_id}/participants",
            axum::routing::post(add_participant),
        )
        .route(
            "/itineraries/{itinerary_id}/participants/{participant_id}",
            axum::routing::delete(remove_participant),
        )
        .route("/logs", axum::routing::get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/auth/register", axum::routing::post(register)) // Unprotected
        .route("/auth/login", axum::routing::post(login))
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = MessageResponse)
    )
)]
async fn health() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "OK".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserSummary),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn register(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let user = service.register_user(req.name, req.email, req.password).await?;
    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn login(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = service.authenticate(&req.email, &req.password).await?;
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    get,
    path = "/api/users/search",
    params(
        ("email" = String, Query, description = "Email fragment to search for")
    ),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserSummary>),
        (status = 400, description = "Missing email query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn search_users(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let matches = service.search_users(&query.email, &requester).await?;
    Ok(Json(matches))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    responses(
        (status = 200, description = "Expenses visible to the principal", body = Vec<Expense>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_expenses(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let expenses = service.list_expenses(&requester).await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = ExpenseDraft,
    responses(
        (status = 201, description = "Expense created successfully", body = Expense),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Referenced user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_expense(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Json(draft): Json<ExpenseDraft>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let requester = current_user(&service, &claims).await?;
    let expense = service.create_expense(draft, &requester).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = Expense),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_expense(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path(expense_id): Path<String>,
) -> Result<Json<Expense>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let expense = service.get_expense(&expense_id, &requester).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{expense_id}",
    request_body = ExpenseUpdate,
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense updated successfully", body = Expense),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not owner or payer", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_expense(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path(expense_id): Path<String>,
    Json(update): Json<ExpenseUpdate>,
) -> Result<Json<Expense>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let expense = service.update_expense(&expense_id, update, &requester).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense deleted successfully", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_expense(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path(expense_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    service.delete_expense(&expense_id, &requester).await?;
    Ok(Json(MessageResponse {
        message: "Expense deleted".to_string(),
    }))
}

#[utoipa::path(
    patch,
    path = "/api/expenses/{expense_id}/participants/{participant_id}/paid",
    params(
        ("expense_id" = String, Path, description = "ID of the expense"),
        ("participant_id" = String, Path, description = "ID of the participant entry")
    ),
    responses(
        (status = 200, description = "Paid flag toggled", body = Expense),
        (status = 403, description = "Not the participant or owner", body = ErrorResponse),
        (status = 404, description = "Expense or participant not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn toggle_participant_paid(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path((expense_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Expense>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let expense = service
        .toggle_participant_paid(&expense_id, &participant_id, &requester)
        .await?;
    Ok(Json(expense))
}

#[utoipa::path(
    get,
    path = "/api/expenses/stats/category",
    responses(
        (status = 200, description = "Per-category totals for the principal", body = CategoryStats),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_category_stats(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CategoryStats>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let stats = service.category_stats(&requester).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/itineraries",
    responses(
        (status = 200, description = "Itineraries visible to the principal", body = Vec<Itinerary>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_itineraries(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Itinerary>>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let itineraries = service.list_itineraries(&requester).await?;
    Ok(Json(itineraries))
}

#[utoipa::path(
    post,
    path = "/api/itineraries",
    request_body = ItineraryDraft,
    responses(
        (status = 201, description = "Itinerary created successfully", body = Itinerary),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Referenced user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_itinerary(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Json(draft): Json<ItineraryDraft>,
) -> Result<(StatusCode, Json<Itinerary>), ApiError> {
    let requester = current_user(&service, &claims).await?;
    let itinerary = service.create_itinerary(draft, &requester).await?;
    Ok((StatusCode::CREATED, Json(itinerary)))
}

#[utoipa::path(
    get,
    path = "/api/itineraries/{itinerary_id}",
    params(
        ("itinerary_id" = String, Path, description = "ID of the itinerary")
    ),
    responses(
        (status = 200, description = "Itinerary retrieved successfully", body = Itinerary),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Itinerary not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_itinerary(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path(itinerary_id): Path<String>,
) -> Result<Json<Itinerary>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let itinerary = service.get_itinerary(&itinerary_id, &requester).await?;
    Ok(Json(itinerary))
}

#[utoipa::path(
    put,
    path = "/api/itineraries/{itinerary_id}",
    request_body = ItineraryUpdate,
    params(
        ("itinerary_id" = String, Path, description = "ID of the itinerary")
    ),
    responses(
        (status = 200, description = "Itinerary updated successfully", body = Itinerary),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not a participant, or participant change by non-owner", body = ErrorResponse),
        (status = 404, description = "Itinerary not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_itinerary(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path(itinerary_id): Path<String>,
    Json(update): Json<ItineraryUpdate>,
) -> Result<Json<Itinerary>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let itinerary = service.update_itinerary(&itinerary_id, update, &requester).await?;
    Ok(Json(itinerary))
}

#[utoipa::path(
    delete,
    path = "/api/itineraries/{itinerary_id}",
    params(
        ("itinerary_id" = String, Path, description = "ID of the itinerary")
    ),
    responses(
        (status = 200, description = "Itinerary deleted successfully", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Itinerary not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_itinerary(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path(itinerary_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    service.delete_itinerary(&itinerary_id, &requester).await?;
    Ok(Json(MessageResponse {
        message: "Itinerary deleted".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/itineraries/{itinerary_id}/participants",
    request_body = AddParticipantRequest,
    params(
        ("itinerary_id" = String, Path, description = "ID of the itinerary")
    ),
    responses(
        (status = 200, description = "Participant added successfully", body = Itinerary),
        (status = 400, description = "User already a participant", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Itinerary or user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_participant(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path(itinerary_id): Path<String>,
    Json(req): Json<AddParticipantRequest>,
) -> Result<Json<Itinerary>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let itinerary = service
        .add_participant(&itinerary_id, PrincipalRef::Id(req.user_id), &requester)
        .await?;
    Ok(Json(itinerary))
}

#[utoipa::path(
    delete,
    path = "/api/itineraries/{itinerary_id}/participants/{participant_id}",
    params(
        ("itinerary_id" = String, Path, description = "ID of the itinerary"),
        ("participant_id" = String, Path, description = "ID of the participant entry")
    ),
    responses(
        (status = 200, description = "Participant removed successfully", body = Itinerary),
        (status = 400, description = "Cannot remove the owner", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Itinerary or participant not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn remove_participant(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
    Extension(claims): Extension<Claims>,
    Path((itinerary_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Itinerary>, ApiError> {
    let requester = current_user(&service, &claims).await?;
    let itinerary = service
        .remove_participant(&itinerary_id, &participant_id, &requester)
        .await?;
    Ok(Json(itinerary))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application logs retrieved successfully", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_app_logs(
    State(service): State<Arc<TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>>>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(logs))
}
