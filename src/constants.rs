/// Tolerance used when comparing floating-point currency amounts.
pub const SPLIT_TOLERANCE: f64 = 0.01;

/// Largest single-expense amount the service accepts.
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Cap on results returned by the user directory search.
pub const USER_SEARCH_LIMIT: usize = 10;

// Action names recorded through the LoggingService.
pub const USER_REGISTERED: &str = "USER_REGISTERED";
pub const USERS_SEARCHED: &str = "USERS_SEARCHED";
pub const EXPENSE_CREATED: &str = "EXPENSE_CREATED";
pub const EXPENSE_UPDATED: &str = "EXPENSE_UPDATED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
pub const EXPENSES_QUERIED: &str = "EXPENSES_QUERIED";
pub const PARTICIPANT_PAID_TOGGLED: &str = "PARTICIPANT_PAID_TOGGLED";
pub const CATEGORY_STATS_QUERIED: &str = "CATEGORY_STATS_QUERIED";
pub const ITINERARY_CREATED: &str = "ITINERARY_CREATED";
pub const ITINERARY_UPDATED: &str = "ITINERARY_UPDATED";
pub const ITINERARY_DELETED: &str = "ITINERARY_DELETED";
pub const ITINERARIES_QUERIED: &str = "ITINERARIES_QUERIED";
pub const PARTICIPANT_ADDED: &str = "PARTICIPANT_ADDED";
pub const PARTICIPANT_REMOVED: &str = "PARTICIPANT_REMOVED";
