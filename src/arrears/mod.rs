//! balance and arrears calculations
//!
//! Everything here is a pure function of a transaction and its installments.
//! Balances are always recomputed from the full installment set so that
//! reschedules and partial payments show up immediately.

pub mod dashboard;

use chrono::NaiveDate;

use crate::calendar::days_between;
use crate::decimal::Money;
use crate::records::{Installment, Transaction};
use crate::types::{DueClassification, TransactionStatus};

pub use dashboard::{
    dashboard_metrics, summarize_due, DashboardMetrics, DueBucket, DueSummary, PortfolioSnapshot,
};

/// the installment's own due amount, before any arrears surcharge
///
/// generated installments carry their base amount (the last line may hold a
/// rounding remainder); older lines without one fall back to the
/// transaction's per-installment amount.
pub fn base_amount(installment: &Installment, transaction: &Transaction) -> Money {
    if installment.base_amount.is_positive() {
        installment.base_amount
    } else {
        transaction.per_installment_amount
    }
}

/// what the installment owes in total
///
/// A positive override comes from a reschedule and already includes the
/// arrears surcharge, so it is returned as is.
pub fn owed_amount(installment: &Installment, transaction: &Transaction) -> Money {
    match installment.amount_override {
        Some(amount) if amount.is_positive() => amount,
        _ => base_amount(installment, transaction) + installment.arrears_interest,
    }
}

/// owed minus paid; an over-payment shows as a negative figure
pub fn remaining(installment: &Installment, transaction: &Transaction) -> Money {
    owed_amount(installment, transaction) - installment.amount_paid
}

/// remaining, floored at zero for reports
pub fn reportable_remaining(installment: &Installment, transaction: &Transaction) -> Money {
    remaining(installment, transaction).max(Money::ZERO)
}

/// due-date proximity of an unpaid installment; paid ones are not classified
pub fn classify(installment: &Installment, today: NaiveDate) -> Option<DueClassification> {
    if installment.is_paid() {
        return None;
    }
    Some(DueClassification::from_days_until(days_between(today, installment.due_date)))
}

/// days past due, zero when not overdue or already paid
pub fn days_overdue(installment: &Installment, today: NaiveDate) -> u32 {
    if installment.is_paid() {
        return 0;
    }
    let days = days_between(today, installment.due_date);
    if days < 0 {
        days.unsigned_abs() as u32
    } else {
        0
    }
}

/// what the customer still owes on this transaction
pub fn transaction_outstanding_balance(transaction: &Transaction, installments: &[Installment]) -> Money {
    own_installments(transaction, installments)
        .filter(|i| !i.is_paid())
        .map(|i| remaining(i, transaction))
        .sum()
}

/// everything collected so far, partial payments included
pub fn amount_collected(transaction: &Transaction, installments: &[Installment]) -> Money {
    own_installments(transaction, installments)
        .map(|i| i.amount_paid)
        .sum()
}

pub fn paid_count(transaction: &Transaction, installments: &[Installment]) -> u32 {
    own_installments(transaction, installments)
        .filter(|i| i.is_paid())
        .count() as u32
}

/// lifecycle status implied by the installment set
///
/// completed once every installment is paid; delinquent while any open
/// installment is more than `threshold_days` overdue; active otherwise.
pub fn derive_status(
    transaction: &Transaction,
    installments: &[Installment],
    today: NaiveDate,
    threshold_days: u32,
) -> TransactionStatus {
    if paid_count(transaction, installments) >= transaction.number_of_installments {
        return TransactionStatus::Completed;
    }

    let delinquent = own_installments(transaction, installments)
        .any(|i| days_overdue(i, today) > threshold_days);
    if delinquent {
        TransactionStatus::Delinquent
    } else {
        TransactionStatus::Active
    }
}

fn own_installments<'a>(
    transaction: &'a Transaction,
    installments: &'a [Installment],
) -> impl Iterator<Item = &'a Installment> + 'a {
    installments
        .iter()
        .filter(move |i| i.transaction_id == transaction.id)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::types::InstallmentStatus;

    #[test]
    fn test_owed_amount_resolution() {
        let txn = transaction(300, 3);
        let mut line = installment(&txn, 1, date(2024, 2, 1));
        assert_eq!(owed_amount(&line, &txn), Money::from_major(100));

        // unset base falls back to the transaction
        line.base_amount = Money::ZERO;
        assert_eq!(owed_amount(&line, &txn), Money::from_major(100));

        // surcharge without an override is added on top
        line.arrears_interest = Money::from_major(5);
        assert_eq!(owed_amount(&line, &txn), Money::from_major(105));

        // override already carries the surcharge
        line.amount_override = Some(Money::from_major(115));
        line.arrears_interest = Money::from_major(15);
        assert_eq!(owed_amount(&line, &txn), Money::from_major(115));

        // a zero override is ignored
        line.amount_override = Some(Money::ZERO);
        assert_eq!(owed_amount(&line, &txn), Money::from_major(115));
    }

    #[test]
    fn test_classification() {
        let txn = transaction(300, 3);
        let today = date(2024, 6, 10);

        let overdue = installment(&txn, 1, date(2024, 6, 9));
        let due_today = installment(&txn, 2, today);
        let upcoming = installment(&txn, 3, date(2024, 6, 11));
        let mut paid = installment(&txn, 3, date(2024, 1, 1));
        paid.status = InstallmentStatus::Paid;

        assert_eq!(classify(&overdue, today), Some(DueClassification::Overdue));
        assert_eq!(classify(&due_today, today), Some(DueClassification::DueToday));
        assert_eq!(classify(&upcoming, today), Some(DueClassification::Upcoming));
        assert_eq!(classify(&paid, today), None);

        assert_eq!(days_overdue(&overdue, today), 1);
        assert_eq!(days_overdue(&upcoming, today), 0);
        assert_eq!(days_overdue(&paid, today), 0);
    }

    #[test]
    fn test_outstanding_balance_exactness() {
        let txn = transaction(150, 3);

        let mut paid = installment(&txn, 1, date(2024, 2, 1));
        paid.status = InstallmentStatus::Paid;
        paid.amount_paid = Money::from_major(50);

        let mut partial = installment(&txn, 2, date(2024, 3, 1));
        partial.status = InstallmentStatus::Partial;
        partial.amount_paid = Money::from_major(30);

        let pending = installment(&txn, 3, date(2024, 4, 1));

        let lines = vec![paid, partial, pending];
        assert_eq!(transaction_outstanding_balance(&txn, &lines), Money::from_major(70));
        assert_eq!(amount_collected(&txn, &lines), Money::from_major(80));
        assert_eq!(paid_count(&txn, &lines), 1);
    }

    #[test]
    fn test_outstanding_ignores_other_transactions() {
        let txn = transaction(100, 1);
        let other = transaction(500, 1);
        let lines = vec![
            installment(&txn, 1, date(2024, 2, 1)),
            installment(&other, 1, date(2024, 2, 1)),
        ];
        assert_eq!(transaction_outstanding_balance(&txn, &lines), Money::from_major(100));
    }

    #[test]
    fn test_remaining_can_go_negative_but_reports_floor() {
        let txn = transaction(100, 1);
        let mut line = installment(&txn, 1, date(2024, 2, 1));
        line.amount_paid = Money::from_major(120);

        assert_eq!(remaining(&line, &txn), Money::from_major(-20));
        assert_eq!(reportable_remaining(&line, &txn), Money::ZERO);
    }

    #[test]
    fn test_derive_status() {
        let txn = transaction(200, 2);
        let today = date(2024, 6, 1);

        let mut first = installment(&txn, 1, date(2024, 4, 1));
        let second = installment(&txn, 2, date(2024, 7, 1));

        // 61 days overdue against a 30 day threshold
        let lines = vec![first.clone(), second.clone()];
        assert_eq!(derive_status(&txn, &lines, today, 30), TransactionStatus::Delinquent);
        assert_eq!(derive_status(&txn, &lines, today, 90), TransactionStatus::Active);

        first.status = InstallmentStatus::Paid;
        let mut last = second;
        last.status = InstallmentStatus::Paid;
        assert_eq!(derive_status(&txn, &[first, last], today, 30), TransactionStatus::Completed);
    }
}
