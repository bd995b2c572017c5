use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::PaymentCadence;
use crate::config::RoundingConfig;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};

/// input to the installment generator
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    pub total: Money,
    pub installments: u32,
    pub start_date: NaiveDate,
    pub cadence: PaymentCadence,
}

/// one generated line of a repayment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub sequence_number: u32,
    pub base_amount: Money,
    pub due_date: NaiveDate,
}

/// split `total` into `installments` due amounts, one cadence step apart
///
/// Every line gets `round(total / N)`. With `correct_remainder` set the last
/// line absorbs the rounding difference so the plan sums to `total` exactly;
/// without it the plain split is kept and may be off by up to N/2 cents.
/// The first installment falls due one cadence step after the start date.
pub fn generate(request: &ScheduleRequest, rounding: &RoundingConfig) -> Result<Vec<ScheduledInstallment>> {
    if !request.total.is_positive() {
        return Err(BillingError::validation(format!(
            "schedule total must be positive, got {}",
            request.total
        )));
    }
    if request.installments == 0 {
        return Err(BillingError::validation("number of installments must be positive"));
    }

    let installment_amount = (request.total / Decimal::from(request.installments))
        .round_currency(rounding.currency_decimals);

    let mut schedule = Vec::with_capacity(request.installments as usize);
    for sequence_number in 1..=request.installments {
        schedule.push(ScheduledInstallment {
            sequence_number,
            base_amount: installment_amount,
            due_date: request.cadence.step(request.start_date, sequence_number)?,
        });
    }

    if rounding.correct_remainder {
        let allocated: Money = schedule.iter().map(|line| line.base_amount).sum();
        let remainder = request.total - allocated;
        if let Some(last) = schedule.last_mut() {
            last.base_amount += remainder;
        }
    }

    Ok(schedule)
}

/// sum of a plan's base amounts
pub fn schedule_total(schedule: &[ScheduledInstallment]) -> Money {
    schedule.iter().map(|line| line.base_amount).sum()
}
