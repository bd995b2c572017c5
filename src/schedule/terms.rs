use rust_decimal::Decimal;

use crate::config::RoundingConfig;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};

/// the money side of a new sale or loan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionTerms {
    pub original_amount: Money,
    /// flat percentage, e.g. 20 for 20%
    pub interest_percentage: Decimal,
    pub total_amount: Money,
    pub number_of_installments: u32,
    pub per_installment_amount: Money,
}

impl TransactionTerms {
    /// total = original × (1 + interest/100); per installment = total / N
    pub fn compute(
        original_amount: Money,
        interest_percentage: Decimal,
        number_of_installments: u32,
        rounding: &RoundingConfig,
    ) -> Result<Self> {
        if !original_amount.is_positive() {
            return Err(BillingError::validation(format!(
                "amount must be positive, got {}",
                original_amount
            )));
        }
        if interest_percentage < Decimal::ZERO {
            return Err(BillingError::validation(format!(
                "interest percentage must not be negative, got {}",
                interest_percentage
            )));
        }
        if number_of_installments == 0 {
            return Err(BillingError::validation("number of installments must be positive"));
        }

        let total_amount = original_amount
            .with_surcharge(interest_percentage)
            .round_currency(rounding.currency_decimals);
        let per_installment_amount = (total_amount / Decimal::from(number_of_installments))
            .round_currency(rounding.currency_decimals);

        Ok(Self {
            original_amount,
            interest_percentage,
            total_amount,
            number_of_installments,
            per_installment_amount,
        })
    }

    /// interest the customer pays on top of the original amount
    pub fn financing_charge(&self) -> Money {
        self.total_amount - self.original_amount
    }
}
