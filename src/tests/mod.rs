mod itinerary_tests;
mod query_tests;
mod share_tests;
mod split_tests;
mod user_tests;

use crate::core::models::user::User;
use crate::core::services::TriptallyService;
use crate::infrastructure::cache::in_memory::InMemoryCache;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;

pub fn create_test_service() -> TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache> {
    let _ = env_logger::builder().is_test(true).try_init();
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let cache = InMemoryCache::new();
    TriptallyService::new(storage, logging, cache, "test-secret".to_string())
}

pub async fn register(
    service: &TriptallyService<InMemoryLogging, InMemoryStorage, InMemoryCache>,
    name: &str,
    email: &str,
) -> User {
    service
        .register_user(name.to_string(), email.to_string(), "password123".to_string())
        .await
        .unwrap()
}
