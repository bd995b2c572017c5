//! collections service
//!
//! Orchestrates the calculation engines over a [`RecordStore`]. Every
//! operation takes the caller's [`SessionContext`] and only sees records of
//! that organization. Operations that depend on "today" take a
//! [`SafeTimeProvider`]; the `*_now` variants use the system clock.
//!
//! Read-then-write sequences (the completion check after a payment, the
//! cascading resets of a reversal) are not atomic against another writer on
//! the same store. Holding the service behind `&mut self` serialises callers
//! that share one instance; separate instances over one backend can still
//! race and leave a transaction status stale until the next
//! [`CollectionsService::refresh_statuses`].

mod collections;
mod customers;
mod products;
mod reports;
mod transactions;

use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};

use crate::calendar::Calendar;
use crate::config::BillingConfig;
use crate::errors::{BillingError, Result};
use crate::events::{Event, EventStore};
use crate::interest::ArrearsEngine;
use crate::payments::ReceiptIssuer;
use crate::records::{Customer, Installment, Product, Transaction};
use crate::store::{fetch, fetch_all, fetch_optional, Direction, Query, Record, RecordStore};
use crate::types::{CustomerId, InstallmentId, SessionContext, TransactionId};

pub use customers::{CustomerContact, NewCustomer};
pub use products::{InventorySummary, NewProduct};
pub use reports::DelinquencyEntry;
pub use transactions::{CreatedTransaction, CustomerHistory, NewTransaction, TransactionSummary};

/// collections service over a record store
pub struct CollectionsService<S: RecordStore> {
    store: S,
    config: BillingConfig,
    calendar: Calendar,
    receipts: ReceiptIssuer,
    arrears: ArrearsEngine,
    events: EventStore,
}

impl<S: RecordStore> CollectionsService<S> {
    /// validate the configuration and wrap the store
    pub fn new(store: S, config: BillingConfig) -> Result<Self> {
        config.validate()?;
        let calendar = config.calendar()?;
        let receipts = ReceiptIssuer::new(config.receipts.prefix.clone());
        let arrears = ArrearsEngine::new(config.arrears.clone());

        Ok(Self {
            store,
            config,
            calendar,
            receipts,
            arrears,
            events: EventStore::new(),
        })
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// the business's calendar date
    pub fn today(&self, time: &SafeTimeProvider) -> NaiveDate {
        self.calendar.today(time)
    }

    fn system_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::System)
    }

    fn currency_decimals(&self) -> u32 {
        self.config.rounding.currency_decimals
    }

    /// a record scoped to the caller's organization
    ///
    /// records of another organization resolve as not found
    fn load_owned<T, F>(&self, ctx: &SessionContext, id: uuid::Uuid, owner: F) -> Result<T>
    where
        T: Record,
        F: Fn(&T) -> uuid::Uuid,
    {
        let record: T = fetch(&self.store, id)?;
        if owner(&record) != ctx.organization_id {
            return Err(BillingError::NotFound {
                entity: T::COLLECTION,
                id,
            });
        }
        Ok(record)
    }

    fn load_customer(&self, ctx: &SessionContext, id: CustomerId) -> Result<Customer> {
        self.load_owned(ctx, id, |c: &Customer| c.organization_id)
    }

    fn load_transaction(&self, ctx: &SessionContext, id: TransactionId) -> Result<Transaction> {
        self.load_owned(ctx, id, |t: &Transaction| t.organization_id)
    }

    /// an installment and the transaction it belongs to
    fn load_installment(&self, ctx: &SessionContext, id: InstallmentId) -> Result<(Installment, Transaction)> {
        let installment: Installment = fetch(&self.store, id)?;
        let transaction = self
            .load_transaction(ctx, installment.transaction_id)
            .map_err(|e| match e {
                BillingError::NotFound { .. } => BillingError::NotFound {
                    entity: Installment::COLLECTION,
                    id,
                },
                other => other,
            })?;
        Ok((installment, transaction))
    }

    /// a transaction's installments in sequence order
    fn installments_of(&self, transaction_id: TransactionId) -> Result<Vec<Installment>> {
        fetch_all(
            &self.store,
            &Query::new()
                .eq("transaction_id", transaction_id)
                .order_by("sequence_number", Direction::Ascending),
        )
    }

    fn tenant_customers(&self, ctx: &SessionContext) -> Result<Vec<Customer>> {
        fetch_all(
            &self.store,
            &Query::new()
                .eq("organization_id", ctx.organization_id)
                .order_by("surname", Direction::Ascending),
        )
    }

    fn tenant_transactions(&self, ctx: &SessionContext) -> Result<Vec<Transaction>> {
        fetch_all(
            &self.store,
            &Query::new()
                .eq("organization_id", ctx.organization_id)
                .order_by("start_date", Direction::Ascending),
        )
    }

    /// every installment belonging to `transactions`
    fn installments_for(&self, transactions: &[Transaction]) -> Result<Vec<Installment>> {
        if transactions.is_empty() {
            return Ok(Vec::new());
        }
        fetch_all(
            &self.store,
            &Query::new()
                .is_in("transaction_id", transactions.iter().map(|t| t.id))
                .order_by("due_date", Direction::Ascending),
        )
    }

    /// statement and notification label: product name, else the kind
    fn label_for(&self, transaction: &Transaction) -> Result<String> {
        let product = match transaction.product_id {
            Some(product_id) => fetch_optional::<Product, _>(&self.store, product_id)?,
            None => None,
        };
        Ok(transaction.display_name(product.as_ref()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::calendar::PaymentCadence;
    use crate::decimal::Money;
    use crate::store::InMemoryStore;
    use crate::types::{ProductCategory, TransactionKind};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// test clock at noon UTC on the given day
    pub fn clock(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    pub fn session() -> SessionContext {
        SessionContext::new(Uuid::new_v4(), "front-desk")
    }

    pub fn service() -> CollectionsService<InMemoryStore> {
        CollectionsService::new(InMemoryStore::new(), BillingConfig::default()).unwrap()
    }

    pub fn new_customer(document: &str) -> NewCustomer {
        NewCustomer {
            name: "Ana".to_string(),
            surname: "Pérez".to_string(),
            document: document.to_string(),
            phone: Some("+54 11 5555 0000".to_string()),
            email: Some("ana@example.com".to_string()),
            address: None,
        }
    }

    pub fn new_product(stock: u32) -> NewProduct {
        NewProduct {
            name: "Fridge".to_string(),
            description: None,
            unit_price: Money::from_major(300),
            category: ProductCategory::Appliance,
            stock,
        }
    }

    /// a zero-interest monthly loan starting on `start`
    pub fn loan(customer_id: CustomerId, total: i64, installments: u32, start: NaiveDate) -> NewTransaction {
        NewTransaction {
            customer_id,
            product_id: None,
            kind: TransactionKind::Loan,
            amount: Some(Money::from_major(total)),
            interest_percentage: Decimal::ZERO,
            cadence: PaymentCadence::Monthly,
            number_of_installments: installments,
            start_date: Some(start),
            description: None,
            invoice_number: None,
        }
    }
}
