//! serializable views handed to the ui and document export

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::{LedgerEntry, Statement};
use crate::records::{Customer, Installment, Transaction};
use crate::types::{
    CustomerId, DueClassification, InstallmentId, InstallmentStatus, PaymentMethod, TransactionId,
};

/// contact details the notification dispatcher needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactView {
    pub customer_id: CustomerId,
    pub full_name: String,
    pub document: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ContactView {
    pub fn from_customer(customer: &Customer) -> Self {
        ContactView {
            customer_id: customer.id,
            full_name: customer.full_name(),
            document: customer.document.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
        }
    }
}

/// an installment needing collection attention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
    pub installment_id: InstallmentId,
    pub transaction_id: TransactionId,
    pub contact: ContactView,
    pub label: String,
    pub sequence_number: u32,
    pub number_of_installments: u32,
    pub due_date: NaiveDate,
    pub days_until: i64,
    pub classification: DueClassification,
    pub status: InstallmentStatus,
    pub rescheduled: bool,
    pub remaining: Money,
    /// what is still owed on the whole transaction
    pub transaction_outstanding: Money,
}

/// a customer's statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementView {
    pub customer: ContactView,
    pub generated_on: NaiveDate,
    pub entries: Vec<LedgerEntry>,
    pub total_debits: Money,
    pub total_credits: Money,
    pub closing_balance: Money,
}

impl StatementView {
    pub fn new(customer: &Customer, statement: Statement, generated_on: NaiveDate) -> Self {
        StatementView {
            customer: ContactView::from_customer(customer),
            generated_on,
            total_debits: statement.total_debits,
            total_credits: statement.total_credits,
            closing_balance: statement.closing_balance,
            entries: statement.entries,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// a payment receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptView {
    pub receipt_number: String,
    pub payment_date: NaiveDate,
    pub customer: ContactView,
    pub transaction_reference: String,
    pub label: String,
    pub installment_id: InstallmentId,
    pub sequence_number: u32,
    pub number_of_installments: u32,
    pub method: PaymentMethod,
    pub amount_tendered: Money,
    pub amount_applied: Money,
    pub installment_status: InstallmentStatus,
    /// left on this installment after the payment
    pub installment_remaining: Money,
    pub transaction_outstanding: Money,
    pub transaction_completed: bool,
    pub operator: String,
}

/// inputs for a receipt that are not on the installment itself
#[derive(Debug, Clone)]
pub struct ReceiptDetails<'a> {
    pub customer: &'a Customer,
    pub transaction: &'a Transaction,
    pub label: &'a str,
    pub receipt_number: &'a str,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub amount_tendered: Money,
    pub amount_applied: Money,
    pub installment_remaining: Money,
    pub transaction_outstanding: Money,
    pub transaction_completed: bool,
    pub operator: &'a str,
}

impl ReceiptView {
    pub fn new(installment: &Installment, details: ReceiptDetails<'_>) -> Self {
        ReceiptView {
            receipt_number: details.receipt_number.to_string(),
            payment_date: details.payment_date,
            customer: ContactView::from_customer(details.customer),
            transaction_reference: details.transaction.reference(),
            label: details.label.to_string(),
            installment_id: installment.id,
            sequence_number: installment.sequence_number,
            number_of_installments: details.transaction.number_of_installments,
            method: details.method,
            amount_tendered: details.amount_tendered,
            amount_applied: details.amount_applied,
            installment_status: installment.status,
            installment_remaining: details.installment_remaining,
            transaction_outstanding: details.transaction_outstanding,
            transaction_completed: details.transaction_completed,
            operator: details.operator.to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl NotificationView {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrears::fixtures::*;
    use crate::ledger::{build_statement, AccountActivity};
    use uuid::Uuid;

    fn customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            name: "Ana".to_string(),
            surname: "Pérez".to_string(),
            document: "30111222".to_string(),
            phone: Some("+54 11 5555 0000".to_string()),
            email: None,
            address: None,
        }
    }

    #[test]
    fn test_statement_view_json() {
        let txn = transaction(300, 3);
        let statement = build_statement([AccountActivity {
            transaction: &txn,
            installments: &[],
            label: "Washer",
        }]);

        let view = StatementView::new(&customer(), statement, date(2024, 5, 1));
        assert_eq!(view.closing_balance, Money::from_major(300));
        assert_eq!(view.customer.full_name, "Ana Pérez");

        let json: serde_json::Value = serde_json::from_str(&view.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["generated_on"], "2024-05-01");
        assert_eq!(json["entries"][0]["kind"], "sale");
        assert_eq!(json["closing_balance"], "300");
    }

    #[test]
    fn test_receipt_view() {
        let customer = customer();
        let txn = transaction(300, 3);
        let mut line = installment(&txn, 2, date(2024, 3, 1));
        line.status = InstallmentStatus::Partial;

        let view = ReceiptView::new(
            &line,
            ReceiptDetails {
                customer: &customer,
                transaction: &txn,
                label: "Cash loan",
                receipt_number: "REC-20240301-000007",
                payment_date: date(2024, 3, 1),
                method: PaymentMethod::Cash,
                amount_tendered: Money::from_major(40),
                amount_applied: Money::from_major(40),
                installment_remaining: Money::from_major(60),
                transaction_outstanding: Money::from_major(260),
                transaction_completed: false,
                operator: "front-desk",
            },
        );

        assert_eq!(view.sequence_number, 2);
        assert_eq!(view.number_of_installments, 3);
        assert_eq!(view.transaction_reference, txn.reference());
        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("REC-20240301-000007"));
        assert!(json.contains("\"installment_status\": \"partial\""));
    }
}
