use crate::core::errors::TriptallyError;
use crate::core::models::expense::{Category, SplitType};
use crate::core::services::{ExpenseDraft, ExpenseUpdate};
use crate::core::split::SplitParticipantInput;
use crate::tests::{create_test_service, register};
use chrono::{DateTime, Duration, Utc};

fn draft(title: &str, amount: f64, category: Category, date: DateTime<Utc>, split_with: &[&str]) -> ExpenseDraft {
    ExpenseDraft {
        title: title.to_string(),
        description: None,
        amount,
        category,
        date,
        is_split: !split_with.is_empty(),
        split_type: SplitType::Equal,
        participants: split_with.iter().map(|id| SplitParticipantInput::of(*id)).collect(),
        paid_by: None,
    }
}

#[tokio::test]
async fn test_list_merges_owned_and_shared_without_duplicates() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    let shared = service
        .create_expense(draft("Dinner", 300.0, Category::Food, Utc::now(), &[&bob.id]), &alice)
        .await
        .unwrap();
    service
        .create_expense(draft("Hotel", 500.0, Category::Accommodation, Utc::now(), &[]), &bob)
        .await
        .unwrap();

    // Alice sees her own expense exactly once.
    let alice_view = service.list_expenses(&alice).await.unwrap();
    assert_eq!(alice_view.len(), 1);

    // Bob sees his own expense plus the split he participates in.
    let bob_view = service.list_expenses(&bob).await.unwrap();
    assert_eq!(bob_view.len(), 2);
    assert!(bob_view.iter().any(|e| e.id == shared.id));
}

#[tokio::test]
async fn test_owner_listed_as_own_participant_appears_once() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    // Degenerate split where the owner also appears as a participant.
    let expense = service
        .create_expense(draft("Solo split", 100.0, Category::Other, Utc::now(), &[&alice.id]), &alice)
        .await
        .unwrap();

    let listed = service.list_expenses(&alice).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, expense.id);
}

#[tokio::test]
async fn test_list_is_sorted_newest_first() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    let now = Utc::now();
    service
        .create_expense(draft("Older", 10.0, Category::Other, now - Duration::days(2), &[]), &alice)
        .await
        .unwrap();
    service
        .create_expense(draft("Newer", 20.0, Category::Other, now, &[]), &alice)
        .await
        .unwrap();

    let listed = service.list_expenses(&alice).await.unwrap();
    assert_eq!(listed[0].title, "Newer");
    assert_eq!(listed[1].title, "Older");
}

#[tokio::test]
async fn test_get_expense_denied_for_stranger() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;
    let carol = register(&service, "Carol", "carol@example.com").await;

    let expense = service
        .create_expense(draft("Dinner", 300.0, Category::Food, Utc::now(), &[&bob.id]), &alice)
        .await
        .unwrap();

    assert!(service.get_expense(&expense.id, &bob).await.is_ok());
    let result = service.get_expense(&expense.id, &carol).await;
    assert!(matches!(result, Err(TriptallyError::AccessDenied(_))));
}

#[tokio::test]
async fn test_category_stats_owned_full_and_participant_share() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    service
        .create_expense(draft("Groceries", 100.0, Category::Food, Utc::now(), &[]), &alice)
        .await
        .unwrap();
    service
        .create_expense(draft("Dinner", 300.0, Category::Food, Utc::now(), &[&bob.id]), &alice)
        .await
        .unwrap();

    // Owner buckets the full amount of both expenses.
    let alice_stats = service.category_stats(&alice).await.unwrap();
    assert_eq!(alice_stats.get("Food"), Some(&400.0));

    // A participant buckets only their own stored share.
    let bob_stats = service.category_stats(&bob).await.unwrap();
    assert_eq!(bob_stats.get("Food"), Some(&150.0));
}

#[tokio::test]
async fn test_category_stats_cache_is_invalidated_on_update() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    let expense = service
        .create_expense(draft("Groceries", 100.0, Category::Food, Utc::now(), &[]), &alice)
        .await
        .unwrap();

    let stats = service.category_stats(&alice).await.unwrap();
    assert_eq!(stats.get("Food"), Some(&100.0));

    let update = ExpenseUpdate {
        amount: Some(50.0),
        ..Default::default()
    };
    service.update_expense(&expense.id, update, &alice).await.unwrap();

    let stats = service.category_stats(&alice).await.unwrap();
    assert_eq!(stats.get("Food"), Some(&50.0));
}
