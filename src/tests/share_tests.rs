use crate::core::models::expense::{Category, Expense, ExpenseParticipant, SplitType};
use crate::core::models::user::UserSummary;
use crate::core::principal::PrincipalRef;
use crate::core::share::resolve_my_share;
use chrono::Utc;

fn split_expense(split_type: SplitType, participants: Vec<ExpenseParticipant>) -> Expense {
    let now = Utc::now();
    Expense {
        id: "e1".to_string(),
        owner: PrincipalRef::Id("alice".to_string()),
        title: "Dinner".to_string(),
        description: None,
        amount: 100.0,
        category: Category::Food,
        date: now,
        is_split: true,
        split_type,
        participants,
        paid_by: PrincipalRef::Id("alice".to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn participant(user: &str, amount: f64) -> ExpenseParticipant {
    ExpenseParticipant {
        slot_id: format!("slot-{}", user),
        user: PrincipalRef::Id(user.to_string()),
        amount,
        paid: false,
    }
}

#[test]
fn non_split_expense_is_borne_by_viewer() {
    let mut expense = split_expense(SplitType::Equal, vec![]);
    expense.is_split = false;

    let share = resolve_my_share(&expense, &PrincipalRef::Id("alice".to_string()));
    assert_eq!(share, 100.0);
}

#[test]
fn listed_participant_owes_stored_amount() {
    let expense = split_expense(SplitType::Unequal, vec![participant("bob", 60.0)]);

    let share = resolve_my_share(&expense, &PrincipalRef::Id("bob".to_string()));
    assert_eq!(share, 60.0);
}

#[test]
fn payer_share_is_equal_head_count_even_for_unequal_split() {
    // Alice paid and is not listed; her implicit share is derived as an
    // equal head-count fraction regardless of the split type.
    let expense = split_expense(SplitType::Unequal, vec![participant("bob", 60.0)]);

    let share = resolve_my_share(&expense, &PrincipalRef::Id("alice".to_string()));
    assert_eq!(share, 50.0);
}

#[test]
fn unlisted_third_party_sees_full_amount() {
    let expense = split_expense(SplitType::Equal, vec![participant("bob", 50.0)]);

    let share = resolve_my_share(&expense, &PrincipalRef::Id("mallory".to_string()));
    assert_eq!(share, 100.0);
}

#[test]
fn expanded_reference_resolves_like_raw_id() {
    let summary = UserSummary {
        id: "Bob".to_string(),
        name: "Bob".to_string(),
        email: "bob@example.com".to_string(),
    };
    let expense = split_expense(
        SplitType::Equal,
        vec![ExpenseParticipant {
            slot_id: "slot-bob".to_string(),
            user: PrincipalRef::Expanded(summary),
            amount: 50.0,
            paid: false,
        }],
    );

    // Id comparison is normalized, so casing differences do not matter.
    let share = resolve_my_share(&expense, &PrincipalRef::Id("bob".to_string()));
    assert_eq!(share, 50.0);
}
