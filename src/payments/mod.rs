pub mod receipt;
pub mod reconciliation;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::types::{InstallmentId, PaymentMethod};

pub use receipt::ReceiptIssuer;
pub use reconciliation::{completion_reached, ensure_payable, reconcile, ReconciliationOutcome};

/// payment request against one installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub installment_id: InstallmentId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

impl PaymentRequest {
    /// cash payment without notes
    pub fn new(installment_id: InstallmentId, amount: Money, payment_date: NaiveDate) -> Self {
        Self {
            installment_id,
            amount,
            payment_date,
            method: PaymentMethod::default(),
            notes: None,
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(BillingError::InvalidPaymentAmount { amount: self.amount });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_payment_request_validation() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        assert!(PaymentRequest::new(Uuid::new_v4(), Money::from_major(10), date).validate().is_ok());

        let zero = PaymentRequest::new(Uuid::new_v4(), Money::ZERO, date).validate().unwrap_err();
        assert!(matches!(zero, BillingError::InvalidPaymentAmount { .. }));
        assert!(zero.is_validation());

        assert!(PaymentRequest::new(Uuid::new_v4(), Money::from_major(-5), date).validate().is_err());
    }

    #[test]
    fn test_builder_defaults_to_cash() {
        let request = PaymentRequest::new(Uuid::new_v4(), Money::from_major(10), NaiveDate::MIN)
            .with_notes("counter");
        assert_eq!(request.method, PaymentMethod::Cash);
        assert_eq!(request.notes.as_deref(), Some("counter"));

        let request = request.with_method(PaymentMethod::Transfer);
        assert_eq!(request.method, PaymentMethod::Transfer);
    }
}
