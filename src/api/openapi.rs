use utoipa::OpenApi;

use crate::{
    api::models::{
        AddParticipantRequest, ErrorResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    },
    core::{
        models::{
            audit::AppLog,
            expense::{Category, Expense, ExpenseParticipant, SplitType},
            itinerary::{Itinerary, ItineraryItem, ItineraryParticipant, Role},
            user::UserSummary,
        },
        principal::PrincipalRef,
        services::{ExpenseDraft, ExpenseUpdate, ItineraryDraft, ItineraryUpdate},
        split::SplitParticipantInput,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health,
        super::handlers::register,
        super::handlers::login,
        super::handlers::search_users,
        super::handlers::list_expenses,
        super::handlers::create_expense,
        super::handlers::get_expense,
        super::handlers::update_expense,
        super::handlers::delete_expense,
        super::handlers::toggle_participant_paid,
        super::handlers::get_category_stats,
        super::handlers::list_itineraries,
        super::handlers::create_itinerary,
        super::handlers::get_itinerary,
        super::handlers::update_itinerary,
        super::handlers::delete_itinerary,
        super::handlers::add_participant,
        super::handlers::remove_participant,
        super::handlers::get_app_logs
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        AddParticipantRequest,
        MessageResponse,
        ErrorResponse,
        ExpenseDraft,
        ExpenseUpdate,
        ItineraryDraft,
        ItineraryUpdate,
        SplitParticipantInput,
        PrincipalRef,
        UserSummary,
        Expense,
        ExpenseParticipant,
        Category,
        SplitType,
        Itinerary,
        ItineraryItem,
        ItineraryParticipant,
        Role,
        AppLog
    )),
    info(
        title = "Triptally API",
        description = "API for tracking travel expenses, split settlement and trip itineraries",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
