use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::PaymentCadence;
use crate::decimal::Money;
use crate::types::{
    CustomerId, InstallmentId, InstallmentStatus, OrganizationId, PaymentId, PaymentMethod,
    ProductCategory, ProductId, TransactionId, TransactionKind, TransactionStatus,
};

/// customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub surname: String,
    /// national id; unique per organization and fixed once created
    pub document: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        if self.surname.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.surname)
        }
    }
}

/// catalogue product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Money,
    pub category: ProductCategory,
    pub stock: u32,
}

/// sale or loan repaid over installments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub organization_id: OrganizationId,
    pub customer_id: CustomerId,
    pub product_id: Option<ProductId>,
    pub kind: TransactionKind,
    pub original_amount: Money,
    /// flat percentage, e.g. 20 for 20%
    pub interest_percentage: Decimal,
    pub total_amount: Money,
    pub cadence: PaymentCadence,
    pub number_of_installments: u32,
    pub per_installment_amount: Money,
    pub start_date: NaiveDate,
    pub description: Option<String>,
    pub invoice_number: Option<String>,
    pub status: TransactionStatus,
}

impl Transaction {
    /// label shown on statements and notifications
    pub fn display_name(&self, product: Option<&Product>) -> String {
        match (self.kind, product) {
            (_, Some(product)) => product.name.clone(),
            (TransactionKind::Loan, None) => "Cash loan".to_string(),
            (TransactionKind::Sale, None) => "Sale".to_string(),
        }
    }

    /// invoice number, or a short id when none was issued
    pub fn reference(&self) -> String {
        match &self.invoice_number {
            Some(number) => number.clone(),
            None => short_id(&self.id),
        }
    }
}

/// one scheduled payment line of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub transaction_id: TransactionId,
    pub sequence_number: u32,
    pub base_amount: Money,
    /// custom owed amount set by a reschedule; already includes the surcharge
    pub amount_override: Option<Money>,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub amount_paid: Money,
    /// set only once the installment is fully paid
    pub date_paid: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub receipt_number: Option<String>,
    pub arrears_interest: Money,
    pub reschedule_date: Option<NaiveDate>,
    pub reschedule_reason: Option<String>,
}

impl Installment {
    /// fresh pending installment
    pub fn pending(
        transaction_id: TransactionId,
        sequence_number: u32,
        base_amount: Money,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            sequence_number,
            base_amount,
            amount_override: None,
            due_date,
            status: InstallmentStatus::Pending,
            amount_paid: Money::ZERO,
            date_paid: None,
            payment_method: None,
            notes: None,
            receipt_number: None,
            arrears_interest: Money::ZERO,
            reschedule_date: None,
            reschedule_reason: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    pub fn is_rescheduled(&self) -> bool {
        self.reschedule_date.is_some()
    }

    /// back to an unpaid line; the schedule and any reschedule stay in place
    pub fn reset_payment(&mut self) {
        self.status = InstallmentStatus::Pending;
        self.amount_paid = Money::ZERO;
        self.date_paid = None;
        self.receipt_number = None;
        self.payment_method = None;
    }
}

/// one payment event against an installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub organization_id: OrganizationId,
    pub installment_id: InstallmentId,
    pub transaction_id: TransactionId,
    /// what the customer handed over
    pub amount_tendered: Money,
    /// what was credited to the installment
    pub amount_applied: Money,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub receipt_number: String,
}

/// first eight characters of an id, for references on printed documents
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
