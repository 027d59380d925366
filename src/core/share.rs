use crate::core::models::expense::Expense;
use crate::core::principal::PrincipalRef;

/// Resolves the monetary share a principal carries in an expense.
///
/// Pure and total: every well-formed expense yields a share for every
/// principal. Resolution order:
/// 1. Non-split expenses are borne entirely by the owner.
/// 2. A listed participant owes its stored amount.
/// 3. The payer's own share is implicit and derived as an equal head-count
///    share, whatever the split type.
/// 4. Anyone else sees the full amount.
pub fn resolve_my_share(expense: &Expense, principal: &PrincipalRef) -> f64 {
    if !expense.is_split {
        return expense.amount;
    }

    let principal_id = principal.as_comparable_id();
    if let Some(participant) = expense.participant_for(&principal_id) {
        return participant.amount;
    }

    if expense.is_payer(&principal_id) {
        return expense.amount / (expense.participants.len() + 1) as f64;
    }

    expense.amount
}
