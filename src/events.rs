use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    CustomerId, InstallmentId, OrganizationId, ProductId, TransactionId, TransactionStatus,
};

/// all events emitted by the collections service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // customer events
    CustomerCreated {
        organization_id: OrganizationId,
        customer_id: CustomerId,
        document: String,
    },
    CustomerDeleted {
        organization_id: OrganizationId,
        customer_id: CustomerId,
    },

    // inventory events
    ProductStockAdjusted {
        product_id: ProductId,
        old_stock: u32,
        new_stock: u32,
    },

    // transaction events
    InstallmentsGenerated {
        transaction_id: TransactionId,
        customer_id: CustomerId,
        total: Money,
        installments: u32,
        first_due_date: NaiveDate,
    },
    TransactionCompleted {
        transaction_id: TransactionId,
        date: NaiveDate,
    },
    TransactionStatusChanged {
        transaction_id: TransactionId,
        old_status: TransactionStatus,
        new_status: TransactionStatus,
    },
    TransactionReverted {
        transaction_id: TransactionId,
        installments_reset: u32,
    },

    // payment events
    PaymentApplied {
        transaction_id: TransactionId,
        installment_id: InstallmentId,
        amount_tendered: Money,
        amount_applied: Money,
        settled: bool,
        receipt_number: String,
        date: NaiveDate,
    },
    PaymentReverted {
        transaction_id: TransactionId,
        installment_id: InstallmentId,
        amount_reverted: Money,
    },

    // reschedule events
    InstallmentRescheduled {
        transaction_id: TransactionId,
        installment_id: InstallmentId,
        old_due_date: NaiveDate,
        new_due_date: NaiveDate,
        arrears_interest: Money,
        owed: Money,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
