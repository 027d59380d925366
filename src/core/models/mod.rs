pub mod audit;
pub mod expense;
pub mod itinerary;
pub mod user;

pub use audit::AppLog;
pub use expense::{Category, Expense, ExpenseParticipant, SplitType};
pub use itinerary::{Itinerary, ItineraryItem, ItineraryParticipant, Role};
pub use user::{User, UserSummary};
