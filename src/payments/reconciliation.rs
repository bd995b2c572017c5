use uuid::Uuid;

use crate::arrears::{owed_amount, paid_count, remaining};
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::records::{Installment, PaymentRecord, Transaction};
use crate::types::{InstallmentStatus, OrganizationId};

use super::PaymentRequest;

/// result of applying one payment to one installment
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationOutcome {
    /// the installment as it should be persisted
    pub installment: Installment,
    pub owed: Money,
    pub remaining_before: Money,
    /// credited to the installment; never more than what was still owed
    pub amount_applied: Money,
    /// tendered beyond what was owed; not kept as credit
    pub excess: Money,
    pub receipt_number: String,
}

impl ReconciliationOutcome {
    pub fn settled(&self) -> bool {
        self.installment.is_paid()
    }

    pub fn remaining_after(&self) -> Money {
        self.remaining_before - self.amount_applied
    }

    /// the payment event row backing this outcome's receipt
    pub fn payment_record(&self, organization_id: OrganizationId, request: &PaymentRequest) -> PaymentRecord {
        PaymentRecord {
            id: Uuid::new_v4(),
            organization_id,
            installment_id: self.installment.id,
            transaction_id: self.installment.transaction_id,
            amount_tendered: request.amount,
            amount_applied: self.amount_applied,
            payment_date: request.payment_date,
            method: request.method,
            notes: request.notes.clone(),
            receipt_number: self.receipt_number.clone(),
        }
    }
}

/// a settled installment takes no further payments
pub fn ensure_payable(installment: &Installment) -> Result<()> {
    if installment.is_paid() {
        return Err(BillingError::constraint(format!(
            "installment {} is already paid",
            installment.id
        )));
    }
    Ok(())
}

/// apply a payment to an installment
///
/// A payment covering what is still owed settles the installment with
/// `amount_paid = owed`; anything less accumulates as a partial payment and
/// leaves `date_paid` unset. Every call carries a fresh receipt number.
pub fn reconcile(
    installment: &Installment,
    transaction: &Transaction,
    request: &PaymentRequest,
    receipt_number: String,
) -> Result<ReconciliationOutcome> {
    request.validate()?;

    if installment.id != request.installment_id {
        return Err(BillingError::validation(format!(
            "payment targets installment {} but {} was supplied",
            request.installment_id, installment.id
        )));
    }
    if installment.transaction_id != transaction.id {
        return Err(BillingError::validation(format!(
            "installment {} does not belong to transaction {}",
            installment.id, transaction.id
        )));
    }

    ensure_payable(installment)?;

    let owed = owed_amount(installment, transaction);
    let remaining_before = remaining(installment, transaction);

    let mut updated = installment.clone();
    let amount_applied;
    let excess;

    if request.amount >= remaining_before {
        updated.status = InstallmentStatus::Paid;
        updated.amount_paid = owed;
        updated.date_paid = Some(request.payment_date);
        amount_applied = remaining_before.max(Money::ZERO);
        excess = request.amount - amount_applied;
    } else {
        updated.status = InstallmentStatus::Partial;
        updated.amount_paid = installment.amount_paid + request.amount;
        updated.date_paid = None;
        amount_applied = request.amount;
        excess = Money::ZERO;
    }

    updated.payment_method = Some(request.method);
    if request.notes.is_some() {
        updated.notes = request.notes.clone();
    }
    updated.receipt_number = Some(receipt_number.clone());

    Ok(ReconciliationOutcome {
        installment: updated,
        owed,
        remaining_before,
        amount_applied,
        excess,
        receipt_number,
    })
}

/// true once every scheduled installment of the transaction is paid
pub fn completion_reached(transaction: &Transaction, installments: &[Installment]) -> bool {
    paid_count(transaction, installments) == transaction.number_of_installments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrears::fixtures::*;
    use crate::payments::ReceiptIssuer;
    use crate::types::PaymentMethod;
    use rust_decimal_macros::dec;

    fn pay(
        installment: &Installment,
        transaction: &Transaction,
        amount: i64,
        issuer: &mut ReceiptIssuer,
    ) -> ReconciliationOutcome {
        let day = date(2024, 2, 1);
        let request = PaymentRequest::new(installment.id, Money::from_major(amount), day);
        reconcile(installment, transaction, &request, issuer.issue(day)).unwrap()
    }

    #[test]
    fn test_payment_is_capped_to_owed() {
        let txn = transaction(100, 1);
        let line = installment(&txn, 1, date(2024, 2, 1));
        let mut issuer = ReceiptIssuer::new("REC");

        let outcome = pay(&line, &txn, 150, &mut issuer);

        assert!(outcome.settled());
        assert_eq!(outcome.installment.amount_paid, Money::from_major(100));
        assert_eq!(outcome.amount_applied, Money::from_major(100));
        assert_eq!(outcome.excess, Money::from_major(50));
        assert_eq!(outcome.installment.date_paid, Some(date(2024, 2, 1)));
        assert!(outcome.remaining_after().is_zero());
    }

    #[test]
    fn test_partial_payments_accumulate() {
        let txn = transaction(100, 1);
        let line = installment(&txn, 1, date(2024, 2, 1));
        let mut issuer = ReceiptIssuer::new("REC");

        let first = pay(&line, &txn, 30, &mut issuer);
        assert_eq!(first.installment.status, InstallmentStatus::Partial);
        assert_eq!(first.installment.date_paid, None);

        let second = pay(&first.installment, &txn, 40, &mut issuer);
        assert_eq!(second.installment.status, InstallmentStatus::Partial);
        assert_eq!(second.installment.amount_paid, Money::from_major(70));
        assert_eq!(second.remaining_after(), Money::from_major(30));

        let third = pay(&second.installment, &txn, 30, &mut issuer);
        assert_eq!(third.installment.status, InstallmentStatus::Paid);
        assert_eq!(third.installment.amount_paid, Money::from_major(100));

        // one receipt per payment event
        assert_ne!(first.receipt_number, second.receipt_number);
        assert_ne!(second.receipt_number, third.receipt_number);
        assert_eq!(third.installment.receipt_number.as_deref(), Some(third.receipt_number.as_str()));
    }

    #[test]
    fn test_rescheduled_installment_settles_at_override() {
        let txn = transaction(100, 1);
        let mut line = installment(&txn, 1, date(2024, 2, 1));
        line.amount_override = Some(Money::from_decimal(dec!(115)));
        line.arrears_interest = Money::from_major(15);
        line.status = InstallmentStatus::Rescheduled;
        let mut issuer = ReceiptIssuer::new("REC");

        let partial = pay(&line, &txn, 100, &mut issuer);
        assert_eq!(partial.installment.status, InstallmentStatus::Partial);

        let settled = pay(&partial.installment, &txn, 15, &mut issuer);
        assert!(settled.settled());
        assert_eq!(settled.installment.amount_paid, Money::from_major(115));
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let txn = transaction(100, 1);
        let line = installment(&txn, 1, date(2024, 2, 1));

        for amount in [Money::ZERO, Money::from_major(-1)] {
            let request = PaymentRequest::new(line.id, amount, date(2024, 2, 1));
            let err = reconcile(&line, &txn, &request, "REC-1".into()).unwrap_err();
            assert!(matches!(err, BillingError::InvalidPaymentAmount { .. }));
        }
    }

    #[test]
    fn test_rejects_mismatched_installment() {
        let txn = transaction(100, 1);
        let other = transaction(100, 1);
        let line = installment(&other, 1, date(2024, 2, 1));

        let request = PaymentRequest::new(line.id, Money::from_major(10), date(2024, 2, 1));
        assert!(reconcile(&line, &txn, &request, "REC-1".into()).is_err());
    }

    #[test]
    fn test_paid_installment_takes_no_more_payments() {
        let txn = transaction(100, 1);
        let line = installment(&txn, 1, date(2024, 2, 1));
        let mut issuer = ReceiptIssuer::new("REC");
        let settled = pay(&line, &txn, 100, &mut issuer).installment;

        let late = PaymentRequest::new(settled.id, Money::from_major(50), date(2024, 6, 1));
        let err = reconcile(&settled, &txn, &late, issuer.issue(date(2024, 6, 1))).unwrap_err();
        assert!(matches!(err, BillingError::Constraint { .. }));
        assert_eq!(settled.date_paid, Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_payment_record_mirrors_outcome() {
        let txn = transaction(100, 1);
        let line = installment(&txn, 1, date(2024, 2, 1));
        let request = PaymentRequest::new(line.id, Money::from_major(120), date(2024, 2, 3))
            .with_method(PaymentMethod::Transfer)
            .with_notes("paid at branch");

        let outcome = reconcile(&line, &txn, &request, "REC-9".into()).unwrap();
        let record = outcome.payment_record(txn.organization_id, &request);

        assert_eq!(record.amount_tendered, Money::from_major(120));
        assert_eq!(record.amount_applied, Money::from_major(100));
        assert_eq!(record.method, PaymentMethod::Transfer);
        assert_eq!(record.receipt_number, "REC-9");
        assert_eq!(outcome.installment.notes.as_deref(), Some("paid at branch"));
    }

    #[test]
    fn test_completion_reached_only_when_all_paid() {
        let txn = transaction(300, 3);
        let mut lines: Vec<Installment> = (1..=3)
            .map(|n| installment(&txn, n, date(2024, 1 + n, 1)))
            .collect();

        for n in 0..3 {
            assert!(!completion_reached(&txn, &lines));
            lines[n].status = InstallmentStatus::Paid;
        }
        assert!(completion_reached(&txn, &lines));
    }
}
