use crate::constants::SPLIT_TOLERANCE;
use crate::core::errors::{FieldError, TriptallyError};
use crate::core::models::expense::{ExpenseParticipant, SplitType};
use crate::core::principal::PrincipalRef;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One raw participant entry as supplied by the caller. `amount` is read for
/// unequal splits, `percentage` for percentage splits; equal splits only need
/// the user reference.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct SplitParticipantInput {
    #[serde(alias = "user_id", alias = "userId")]
    pub user: PrincipalRef,
    pub amount: Option<f64>,
    pub percentage: Option<f64>,
}

impl SplitParticipantInput {
    pub fn of(user: impl Into<PrincipalRef>) -> Self {
        SplitParticipantInput {
            user: user.into(),
            amount: None,
            percentage: None,
        }
    }

    pub fn owing(user: impl Into<PrincipalRef>, amount: f64) -> Self {
        SplitParticipantInput {
            user: user.into(),
            amount: Some(amount),
            percentage: None,
        }
    }

    pub fn percent(user: impl Into<PrincipalRef>, percentage: f64) -> Self {
        SplitParticipantInput {
            user: user.into(),
            amount: None,
            percentage: Some(percentage),
        }
    }
}

/// Decomposes `amount` into per-participant obligations.
///
/// The listed participants are the OTHER parties: the payer's own share is
/// implicit, so an equal split divides by head-count `inputs.len() + 1`.
/// Participants already present in `existing` (matched by principal) keep
/// their slot id and `paid` flag; new ones start unpaid. No rounding is
/// applied here, amounts are stored at full precision.
pub fn compute_participant_shares(
    amount: f64,
    split_type: SplitType,
    inputs: &[SplitParticipantInput],
    existing: &[ExpenseParticipant],
) -> Result<Vec<ExpenseParticipant>, TriptallyError> {
    let shares = match split_type {
        SplitType::Equal => {
            let head_count = inputs.len() + 1; // payer included
            let per_person = amount / head_count as f64;
            inputs
                .iter()
                .map(|input| carry_over(&input.user, per_person, existing))
                .collect()
        }
        SplitType::Unequal => {
            let mut shares = Vec::with_capacity(inputs.len());
            for input in inputs {
                let owed = input
                    .amount
                    .ok_or_else(|| missing_field("amount", "Each participant of an unequal split needs an amount"))?;
                if !owed.is_finite() || owed < 0.0 {
                    return Err(TriptallyError::InvalidSplit);
                }
                shares.push(carry_over(&input.user, owed, existing));
            }
            let total: f64 = shares.iter().map(|s| s.amount).sum();
            if total > amount + SPLIT_TOLERANCE {
                return Err(TriptallyError::InvalidSplit);
            }
            shares
        }
        SplitType::Percentage => {
            let mut shares = Vec::with_capacity(inputs.len());
            let mut total_percentage = 0.0;
            for input in inputs {
                let percentage = input.percentage.ok_or_else(|| {
                    missing_field("percentage", "Each participant of a percentage split needs a percentage")
                })?;
                if !percentage.is_finite() || percentage < 0.0 {
                    return Err(TriptallyError::InvalidSplit);
                }
                total_percentage += percentage;
                shares.push(carry_over(&input.user, amount * percentage / 100.0, existing));
            }
            // Non-payer percentages may sum to less than 100, never more.
            if total_percentage > 100.0 + SPLIT_TOLERANCE {
                return Err(TriptallyError::InvalidSplit);
            }
            shares
        }
    };
    Ok(shares)
}

/// Keeps the slot id and paid flag of a continuing participant, otherwise
/// opens a fresh unpaid slot.
fn carry_over(user: &PrincipalRef, amount: f64, existing: &[ExpenseParticipant]) -> ExpenseParticipant {
    match existing.iter().find(|p| p.user == *user) {
        Some(previous) => ExpenseParticipant {
            slot_id: previous.slot_id.clone(),
            user: user.clone(),
            amount,
            paid: previous.paid,
        },
        None => ExpenseParticipant {
            slot_id: Uuid::new_v4().to_string(),
            user: user.clone(),
            amount,
            paid: false,
        },
    }
}

fn missing_field(field: &str, description: &str) -> TriptallyError {
    TriptallyError::InvalidInput(
        field.to_string(),
        FieldError {
            field: field.to_string(),
            title: format!("Missing {}", field),
            description: description.to_string(),
        },
    )
}
