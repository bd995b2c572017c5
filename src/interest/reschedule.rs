use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::arrears::{base_amount, owed_amount};
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::records::{Installment, Transaction};
use crate::types::InstallmentStatus;

/// operator input for moving an installment's due date
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub new_due_date: Option<NaiveDate>,
    /// arrears interest charged by this reschedule; absent means none
    pub arrears_interest: Option<Money>,
    pub reason: Option<String>,
}

impl RescheduleRequest {
    pub fn to(new_due_date: NaiveDate) -> Self {
        Self {
            new_due_date: Some(new_due_date),
            ..Self::default()
        }
    }

    pub fn with_interest(mut self, interest: Money) -> Self {
        self.arrears_interest = Some(interest);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// rescheduled installment plus what changed
#[derive(Debug, Clone, PartialEq)]
pub struct RescheduleOutcome {
    pub installment: Installment,
    pub previous_due_date: NaiveDate,
    pub interest_added: Money,
    /// owed amount after the reschedule
    pub owed: Money,
}

/// move an installment to a new due date, optionally charging arrears interest
///
/// Arrears interest accumulates over successive reschedules and the override
/// is always the installment's own base amount plus the accumulated interest.
/// A new date in the past is accepted.
pub fn reschedule(
    installment: &Installment,
    transaction: &Transaction,
    request: &RescheduleRequest,
    today: NaiveDate,
) -> Result<RescheduleOutcome> {
    let Some(new_due_date) = request.new_due_date else {
        return Err(BillingError::InvalidDate {
            message: "a new due date is required to reschedule".to_string(),
        });
    };

    let interest_added = request.arrears_interest.unwrap_or(Money::ZERO);
    if interest_added.is_negative() {
        return Err(BillingError::validation(format!(
            "arrears interest must not be negative, got {}",
            interest_added
        )));
    }

    if installment.is_paid() {
        return Err(BillingError::constraint(format!(
            "installment {} of transaction {} is already paid",
            installment.sequence_number, installment.transaction_id
        )));
    }

    let mut updated = installment.clone();
    updated.arrears_interest = installment.arrears_interest + interest_added;
    updated.amount_override = Some(base_amount(installment, transaction) + updated.arrears_interest);
    updated.due_date = new_due_date;
    updated.reschedule_date = Some(today);
    updated.reschedule_reason = request.reason.clone();
    updated.status = InstallmentStatus::Rescheduled;

    let owed = owed_amount(&updated, transaction);

    Ok(RescheduleOutcome {
        installment: updated,
        previous_due_date: installment.due_date,
        interest_added,
        owed,
    })
}
