use crate::core::errors::TriptallyError;
use crate::core::models::itinerary::Role;
use crate::core::principal::PrincipalRef;
use crate::core::services::{ItineraryDraft, ItineraryUpdate};
use crate::tests::{create_test_service, register};
use chrono::{Duration, Utc};

fn trip_draft(participant_ids: &[&str]) -> ItineraryDraft {
    ItineraryDraft {
        trip_name: "Goa 2024".to_string(),
        destination: "Goa".to_string(),
        start_date: Utc::now(),
        end_date: Utc::now() + Duration::days(7),
        description: None,
        is_group_trip: !participant_ids.is_empty(),
        participants: participant_ids
            .iter()
            .map(|id| PrincipalRef::Id(id.to_string()))
            .collect(),
        items: Vec::new(),
    }
}

#[tokio::test]
async fn test_create_itinerary_seeds_owner_entry() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    let itinerary = service.create_itinerary(trip_draft(&[]), &alice).await.unwrap();

    assert_eq!(itinerary.participants.len(), 1);
    assert_eq!(itinerary.participants[0].role, Role::Owner);
    assert!(itinerary.participants[0].user.is_principal(&alice.id));
    assert!(!itinerary.is_group_trip);
}

#[tokio::test]
async fn test_create_group_trip_with_members() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    // The creator's id in the payload is ignored; they already own a slot.
    let itinerary = service
        .create_itinerary(trip_draft(&[&alice.id, &bob.id]), &alice)
        .await
        .unwrap();

    assert_eq!(itinerary.participants.len(), 2);
    let bob_entry = itinerary.participant_for(&bob.id).unwrap();
    assert_eq!(bob_entry.role, Role::Member);
}

#[tokio::test]
async fn test_create_rejects_inverted_dates() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    let mut draft = trip_draft(&[]);
    draft.end_date = draft.start_date - Duration::days(1);
    let result = service.create_itinerary(draft, &alice).await;
    assert!(matches!(result, Err(TriptallyError::InvalidInput(_, _))));
}

#[tokio::test]
async fn test_add_participant_is_owner_only() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;
    let carol = register(&service, "Carol", "carol@example.com").await;

    let itinerary = service
        .create_itinerary(trip_draft(&[&bob.id]), &alice)
        .await
        .unwrap();

    let result = service
        .add_participant(&itinerary.id, PrincipalRef::Id(carol.id.clone()), &bob)
        .await;
    assert!(matches!(result, Err(TriptallyError::AccessDenied(_))));

    let updated = service
        .add_participant(&itinerary.id, PrincipalRef::Id(carol.id.clone()), &alice)
        .await
        .unwrap();
    assert_eq!(updated.participants.len(), 3);
}

#[tokio::test]
async fn test_add_duplicate_participant() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    let itinerary = service
        .create_itinerary(trip_draft(&[&bob.id]), &alice)
        .await
        .unwrap();

    let result = service
        .add_participant(&itinerary.id, PrincipalRef::Id(bob.id.clone()), &alice)
        .await;
    assert!(matches!(result, Err(TriptallyError::AlreadyParticipant(_))));
}

#[test]
fn test_duplicate_participant_maps_to_bad_request() {
    use crate::api::models::ApiError;
    use axum::response::IntoResponse;

    let response = ApiError(TriptallyError::AlreadyParticipant("bob".to_string())).into_response();
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_adding_participant_makes_group_trip() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    let itinerary = service.create_itinerary(trip_draft(&[]), &alice).await.unwrap();
    assert!(!itinerary.is_group_trip);

    let updated = service
        .add_participant(&itinerary.id, PrincipalRef::Id(bob.id.clone()), &alice)
        .await
        .unwrap();
    assert!(updated.is_group_trip);
}

#[tokio::test]
async fn test_owner_entry_cannot_be_removed() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    let itinerary = service
        .create_itinerary(trip_draft(&[&bob.id]), &alice)
        .await
        .unwrap();
    let owner_slot = itinerary.owner_entry().unwrap().slot_id.clone();

    let result = service.remove_participant(&itinerary.id, &owner_slot, &alice).await;
    assert!(matches!(result, Err(TriptallyError::CannotRemoveOwner)));
}

#[tokio::test]
async fn test_remove_participant() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    let itinerary = service
        .create_itinerary(trip_draft(&[&bob.id]), &alice)
        .await
        .unwrap();
    let bob_slot = itinerary.participant_for(&bob.id).unwrap().slot_id.clone();

    let result = service.remove_participant(&itinerary.id, "no-such-slot", &alice).await;
    assert!(matches!(result, Err(TriptallyError::ParticipantNotFound(_))));

    let updated = service.remove_participant(&itinerary.id, &bob_slot, &alice).await.unwrap();
    assert_eq!(updated.participants.len(), 1);
    assert!(updated.participant_for(&bob.id).is_none());
}

#[tokio::test]
async fn test_member_can_edit_body_but_not_participants() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;
    let carol = register(&service, "Carol", "carol@example.com").await;

    let itinerary = service
        .create_itinerary(trip_draft(&[&bob.id]), &alice)
        .await
        .unwrap();

    let update = ItineraryUpdate {
        destination: Some("North Goa".to_string()),
        ..Default::default()
    };
    let updated = service.update_itinerary(&itinerary.id, update, &bob).await.unwrap();
    assert_eq!(updated.destination, "North Goa");

    let update = ItineraryUpdate {
        participants: Some(vec![PrincipalRef::Id(carol.id.clone())]),
        ..Default::default()
    };
    let result = service.update_itinerary(&itinerary.id, update, &bob).await;
    assert!(matches!(result, Err(TriptallyError::AccessDenied(_))));
}

#[tokio::test]
async fn test_owner_rewrites_participant_list_preserving_slots() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;
    let carol = register(&service, "Carol", "carol@example.com").await;

    let itinerary = service
        .create_itinerary(trip_draft(&[&bob.id]), &alice)
        .await
        .unwrap();
    let bob_slot = itinerary.participant_for(&bob.id).unwrap().slot_id.clone();

    let update = ItineraryUpdate {
        participants: Some(vec![
            PrincipalRef::Id(bob.id.clone()),
            PrincipalRef::Id(carol.id.clone()),
        ]),
        ..Default::default()
    };
    let updated = service.update_itinerary(&itinerary.id, update, &alice).await.unwrap();

    assert_eq!(updated.participants.len(), 3);
    assert_eq!(updated.participant_for(&bob.id).unwrap().slot_id, bob_slot);
    assert!(updated.owner_entry().unwrap().user.is_principal(&alice.id));
}

#[tokio::test]
async fn test_only_owner_can_delete_itinerary() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    let itinerary = service
        .create_itinerary(trip_draft(&[&bob.id]), &alice)
        .await
        .unwrap();

    let result = service.delete_itinerary(&itinerary.id, &bob).await;
    assert!(matches!(result, Err(TriptallyError::AccessDenied(_))));

    service.delete_itinerary(&itinerary.id, &alice).await.unwrap();
    let result = service.delete_itinerary(&itinerary.id, &alice).await;
    assert!(matches!(result, Err(TriptallyError::ItineraryNotFound(_))));
}
