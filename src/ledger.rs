//! customer account statement
//!
//! A statement has one debit per transaction, for its total on the start
//! date, and one credit per paid installment on the date it was paid. Partial
//! payments only show up here once the installment is settled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::records::{short_id, Installment, Transaction};
use crate::types::{InstallmentId, InstallmentStatus, TransactionId};

/// side of a statement line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// the sale or loan itself
    Sale,
    /// a settled installment
    Payment,
}

/// one statement line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub transaction_id: TransactionId,
    pub installment_id: Option<InstallmentId>,
    pub description: String,
    pub reference: String,
    pub debit: Money,
    pub credit: Money,
    /// running balance after this line
    pub balance: Money,
}

/// a transaction with its installments and the label it shows under
#[derive(Debug, Clone, Copy)]
pub struct AccountActivity<'a> {
    pub transaction: &'a Transaction,
    pub installments: &'a [Installment],
    pub label: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub entries: Vec<LedgerEntry>,
    pub total_debits: Money,
    pub total_credits: Money,
    pub closing_balance: Money,
}

impl Statement {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// lines belonging to one transaction
    pub fn entries_for(&self, transaction_id: TransactionId) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.transaction_id == transaction_id)
    }
}

/// build the statement for one customer's activity
///
/// Lines are sorted by date with a stable sort; on the same day a sale comes
/// before its payments. The balance folds `debit - credit` in that order.
pub fn build_statement<'a>(activity: impl IntoIterator<Item = AccountActivity<'a>>) -> Statement {
    let mut entries = Vec::new();

    for AccountActivity { transaction, installments, label } in activity {
        entries.push(LedgerEntry {
            kind: EntryKind::Sale,
            date: transaction.start_date,
            transaction_id: transaction.id,
            installment_id: None,
            description: label.to_string(),
            reference: transaction.reference(),
            debit: transaction.total_amount,
            credit: Money::ZERO,
            balance: Money::ZERO,
        });

        let mut paid: Vec<&Installment> = installments
            .iter()
            .filter(|i| i.transaction_id == transaction.id && i.is_paid())
            .collect();
        paid.sort_by_key(|i| i.sequence_number);

        for installment in paid {
            let Some(date_paid) = installment.date_paid else {
                continue;
            };
            entries.push(LedgerEntry {
                kind: EntryKind::Payment,
                date: date_paid,
                transaction_id: transaction.id,
                installment_id: Some(installment.id),
                description: format!(
                    "Installment {}/{} - {}",
                    installment.sequence_number, transaction.number_of_installments, label
                ),
                reference: installment
                    .receipt_number
                    .clone()
                    .unwrap_or_else(|| short_id(&installment.id)),
                debit: Money::ZERO,
                credit: installment.amount_paid,
                balance: Money::ZERO,
            });
        }
    }

    entries.sort_by_key(|entry| (entry.date, entry.kind));

    let mut balance = Money::ZERO;
    let mut total_debits = Money::ZERO;
    let mut total_credits = Money::ZERO;
    for entry in &mut entries {
        balance += entry.debit - entry.credit;
        total_debits += entry.debit;
        total_credits += entry.credit;
        entry.balance = balance;
    }

    Statement {
        entries,
        total_debits,
        total_credits,
        closing_balance: balance,
    }
}

/// installments of a sale that must be reset before the sale is removed
pub fn sale_reversal(transaction: &Transaction, installments: &[Installment]) -> Vec<Installment> {
    installments
        .iter()
        .filter(|i| i.transaction_id == transaction.id && i.status == InstallmentStatus::Paid)
        .map(|i| {
            let mut reset = i.clone();
            reset.reset_payment();
            reset
        })
        .collect()
}

/// an installment with its payment undone
///
/// Partial payments can be undone too, although they never appear as
/// statement lines.
pub fn payment_reversal(installment: &Installment) -> Result<Installment> {
    if !installment.is_paid() && installment.amount_paid.is_zero() {
        return Err(BillingError::constraint(format!(
            "installment {} has no payment to revert",
            installment.id
        )));
    }
    let mut reset = installment.clone();
    reset.reset_payment();
    Ok(reset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrears::fixtures::*;

    fn settle(installment: &mut Installment, amount: i64, on: NaiveDate) {
        installment.status = InstallmentStatus::Paid;
        installment.amount_paid = Money::from_major(amount);
        installment.date_paid = Some(on);
    }

    #[test]
    fn test_running_balance() {
        let mut txn = transaction(300, 3);
        txn.start_date = date(2024, 1, 1);

        let mut first = installment(&txn, 1, date(2024, 2, 1));
        let mut second = installment(&txn, 2, date(2024, 3, 1));
        let third = installment(&txn, 3, date(2024, 4, 1));
        // recorded out of order on purpose
        settle(&mut second, 100, date(2024, 1, 10));
        settle(&mut first, 100, date(2024, 1, 5));
        let lines = vec![second, third, first];

        let statement = build_statement([AccountActivity {
            transaction: &txn,
            installments: &lines,
            label: "Fridge",
        }]);

        let balances: Vec<Money> = statement.entries.iter().map(|e| e.balance).collect();
        assert_eq!(
            balances,
            vec![Money::from_major(300), Money::from_major(200), Money::from_major(100)]
        );
        assert_eq!(statement.entries[0].kind, EntryKind::Sale);
        assert_eq!(statement.entries[1].date, date(2024, 1, 5));
        assert_eq!(statement.total_debits, Money::from_major(300));
        assert_eq!(statement.total_credits, Money::from_major(200));
        assert_eq!(statement.closing_balance, Money::from_major(100));
    }

    #[test]
    fn test_partial_and_pending_lines_are_not_credited() {
        let txn = transaction(200, 2);
        let mut partial = installment(&txn, 1, date(2024, 2, 1));
        partial.status = InstallmentStatus::Partial;
        partial.amount_paid = Money::from_major(40);
        let pending = installment(&txn, 2, date(2024, 3, 1));
        let lines = vec![partial, pending];

        let statement = build_statement([AccountActivity {
            transaction: &txn,
            installments: &lines,
            label: "Loan",
        }]);

        assert_eq!(statement.entries.len(), 1);
        assert_eq!(statement.closing_balance, Money::from_major(200));
    }

    #[test]
    fn test_sale_precedes_same_day_payment_across_transactions() {
        let mut early = transaction(100, 1);
        early.start_date = date(2024, 1, 1);
        let mut late = transaction(50, 1);
        late.start_date = date(2024, 1, 20);

        let mut early_line = installment(&early, 1, date(2024, 2, 1));
        settle(&mut early_line, 100, date(2024, 1, 20));
        let early_lines = vec![early_line];

        // the later sale is listed first but still sorts by date
        let statement = build_statement([
            AccountActivity { transaction: &late, installments: &[], label: "Late" },
            AccountActivity { transaction: &early, installments: &early_lines, label: "Early" },
        ]);

        let kinds: Vec<(EntryKind, NaiveDate)> =
            statement.entries.iter().map(|e| (e.kind, e.date)).collect();
        assert_eq!(
            kinds,
            vec![
                (EntryKind::Sale, date(2024, 1, 1)),
                (EntryKind::Sale, date(2024, 1, 20)),
                (EntryKind::Payment, date(2024, 1, 20)),
            ]
        );
        assert_eq!(statement.closing_balance, Money::from_major(50));
        assert_eq!(statement.entries_for(early.id).count(), 2);
    }

    #[test]
    fn test_sale_reversal_resets_only_paid_lines() {
        let txn = transaction(200, 2);
        let mut paid = installment(&txn, 1, date(2024, 2, 1));
        settle(&mut paid, 100, date(2024, 2, 1));
        paid.receipt_number = Some("REC-1".to_string());
        let pending = installment(&txn, 2, date(2024, 3, 1));

        let reset = sale_reversal(&txn, &[paid.clone(), pending]);
        assert_eq!(reset.len(), 1);
        assert_eq!(reset[0].id, paid.id);
        assert_eq!(reset[0].status, InstallmentStatus::Pending);
        assert!(reset[0].amount_paid.is_zero());
        assert_eq!(reset[0].receipt_number, None);
    }

    #[test]
    fn test_payment_reversal() {
        let txn = transaction(100, 1);
        let mut line = installment(&txn, 1, date(2024, 2, 1));
        assert!(matches!(payment_reversal(&line), Err(BillingError::Constraint { .. })));

        settle(&mut line, 100, date(2024, 2, 1));
        let reset = payment_reversal(&line).unwrap();
        assert_eq!(reset.status, InstallmentStatus::Pending);
        assert_eq!(reset.date_paid, None);
    }
}
