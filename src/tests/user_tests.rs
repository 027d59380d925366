use crate::core::errors::TriptallyError;
use crate::core::models::user::UserSummary;
use crate::tests::{create_test_service, register};

#[tokio::test]
async fn test_register_hashes_password() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    assert_ne!(alice.password, "password123");
    assert!(alice.password.starts_with("$2"));
}

#[tokio::test]
async fn test_register_response_omits_password_hash() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    // The projection returned by the register endpoint.
    let body = serde_json::to_value(UserSummary::from(&alice)).unwrap();
    assert!(body.get("password").is_none());
    assert_eq!(body.get("email").unwrap(), "alice@example.com");

    // The storage model itself never serializes the hash either.
    let body = serde_json::to_value(&alice).unwrap();
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let service = create_test_service();
    register(&service, "Alice", "alice@example.com").await;

    let result = service
        .register_user(
            "Alice Again".to_string(),
            "alice@example.com".to_string(),
            "other-password".to_string(),
        )
        .await;
    assert!(matches!(result, Err(TriptallyError::EmailAlreadyRegistered(_))));
}

#[tokio::test]
async fn test_register_invalid_email() {
    let service = create_test_service();

    let result = service
        .register_user("Alice".to_string(), "".to_string(), "password123".to_string())
        .await;
    assert!(matches!(result, Err(TriptallyError::MissingEmail)));

    let result = service
        .register_user("Alice".to_string(), "invalid".to_string(), "password123".to_string())
        .await;
    assert!(matches!(result, Err(TriptallyError::InvalidEmail(_))));
}

#[tokio::test]
async fn test_login_roundtrip() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    let token = service.authenticate("alice@example.com", "password123").await.unwrap();
    let claims = service.validate_token(&token).unwrap();
    assert_eq!(claims.sub, alice.id);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let service = create_test_service();
    register(&service, "Alice", "alice@example.com").await;

    let result = service.authenticate("alice@example.com", "wrong").await;
    assert!(matches!(result, Err(TriptallyError::InvalidCredentials)));

    // Unknown email fails the same way, no user enumeration.
    let result = service.authenticate("nobody@example.com", "password123").await;
    assert!(matches!(result, Err(TriptallyError::InvalidCredentials)));
}

#[tokio::test]
async fn test_validate_token_rejects_garbage() {
    let service = create_test_service();
    let result = service.validate_token("not-a-jwt");
    assert!(matches!(result, Err(TriptallyError::Unauthorized(_))));
}

#[tokio::test]
async fn test_search_excludes_requester_and_ignores_case() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;
    register(&service, "Carol", "carol@other.org").await;

    let matches = service.search_users("EXAMPLE.COM", &alice).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, bob.id);
}

#[tokio::test]
async fn test_search_requires_query() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    let result = service.search_users("  ", &alice).await;
    assert!(matches!(result, Err(TriptallyError::InvalidInput(_, _))));
}
