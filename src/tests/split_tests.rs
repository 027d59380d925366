use crate::core::errors::TriptallyError;
use crate::core::models::expense::{ExpenseParticipant, SplitType};
use crate::core::principal::PrincipalRef;
use crate::core::split::{SplitParticipantInput, compute_participant_shares};

#[test]
fn equal_split_divides_by_head_count() {
    // Payer is implicit, so two listed participants make three heads.
    let inputs = vec![SplitParticipantInput::of("bob"), SplitParticipantInput::of("carol")];
    let shares = compute_participant_shares(300.0, SplitType::Equal, &inputs, &[]).unwrap();

    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].amount, 100.0);
    assert_eq!(shares[1].amount, 100.0);
    assert!(shares.iter().all(|s| !s.paid));
    assert_ne!(shares[0].slot_id, shares[1].slot_id);
}

#[test]
fn unequal_split_keeps_verbatim_amounts() {
    let inputs = vec![
        SplitParticipantInput::owing("bob", 60.0),
        SplitParticipantInput::owing("carol", 30.0),
    ];
    let shares = compute_participant_shares(100.0, SplitType::Unequal, &inputs, &[]).unwrap();

    assert_eq!(shares[0].amount, 60.0);
    assert_eq!(shares[1].amount, 30.0);
}

#[test]
fn unequal_split_requires_amount_per_participant() {
    let inputs = vec![SplitParticipantInput::of("bob")];
    let result = compute_participant_shares(100.0, SplitType::Unequal, &inputs, &[]);
    assert!(matches!(result, Err(TriptallyError::InvalidInput(_, _))));
}

#[test]
fn unequal_split_rejects_sum_over_total() {
    let inputs = vec![
        SplitParticipantInput::owing("bob", 60.0),
        SplitParticipantInput::owing("carol", 50.0),
    ];
    let result = compute_participant_shares(100.0, SplitType::Unequal, &inputs, &[]);
    assert!(matches!(result, Err(TriptallyError::InvalidSplit)));
}

#[test]
fn unequal_split_rejects_negative_amount() {
    let inputs = vec![SplitParticipantInput::owing("bob", -5.0)];
    let result = compute_participant_shares(100.0, SplitType::Unequal, &inputs, &[]);
    assert!(matches!(result, Err(TriptallyError::InvalidSplit)));
}

#[test]
fn percentage_split_scales_the_total() {
    let inputs = vec![
        SplitParticipantInput::percent("bob", 25.0),
        SplitParticipantInput::percent("carol", 50.0),
    ];
    let shares = compute_participant_shares(200.0, SplitType::Percentage, &inputs, &[]).unwrap();

    assert_eq!(shares[0].amount, 50.0);
    assert_eq!(shares[1].amount, 100.0);
}

#[test]
fn percentage_split_rejects_sum_over_hundred() {
    let inputs = vec![
        SplitParticipantInput::percent("bob", 60.0),
        SplitParticipantInput::percent("carol", 50.0),
    ];
    let result = compute_participant_shares(100.0, SplitType::Percentage, &inputs, &[]);
    assert!(matches!(result, Err(TriptallyError::InvalidSplit)));
}

#[test]
fn recompute_preserves_slot_and_paid_flag() {
    let existing = vec![ExpenseParticipant {
        slot_id: "slot-bob".to_string(),
        user: PrincipalRef::Id("bob".to_string()),
        amount: 50.0,
        paid: true,
    }];

    let inputs = vec![SplitParticipantInput::of("bob"), SplitParticipantInput::of("carol")];
    let shares = compute_participant_shares(300.0, SplitType::Equal, &inputs, &existing).unwrap();

    let bob = shares.iter().find(|s| s.user.is_principal("bob")).unwrap();
    assert_eq!(bob.slot_id, "slot-bob");
    assert!(bob.paid);
    assert_eq!(bob.amount, 100.0);

    let carol = shares.iter().find(|s| s.user.is_principal("carol")).unwrap();
    assert!(!carol.paid);
    assert_ne!(carol.slot_id, "slot-bob");
}
