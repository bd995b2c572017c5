use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::arrears::{amount_collected, days_overdue, paid_count, transaction_outstanding_balance};
use crate::calendar::PaymentCadence;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::events::Event;
use crate::records::{Customer, Installment, Transaction};
use crate::schedule::{generate, ScheduleRequest, TransactionTerms};
use crate::store::{fetch_all, insert_record, save_record, Direction, Query, RecordStore};
use crate::types::{CustomerId, SessionContext, TransactionId, TransactionKind, TransactionStatus};

use super::CollectionsService;

/// input for a new sale or loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub customer_id: CustomerId,
    pub product_id: Option<Uuid>,
    pub kind: TransactionKind,
    /// financed amount; a sale defaults to the product's unit price
    pub amount: Option<Money>,
    /// flat percentage, e.g. 20 for 20%
    pub interest_percentage: Decimal,
    pub cadence: PaymentCadence,
    pub number_of_installments: u32,
    /// defaults to today
    pub start_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub invoice_number: Option<String>,
}

/// a stored transaction with its generated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedTransaction {
    pub transaction: Transaction,
    pub installments: Vec<Installment>,
}

/// one transaction with its computed figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub transaction: Transaction,
    pub label: String,
    pub installments: Vec<Installment>,
    pub outstanding: Money,
    pub collected: Money,
    pub paid_installments: u32,
    pub overdue_installments: u32,
    /// earliest due date among open installments
    pub next_due_date: Option<NaiveDate>,
}

/// everything a customer has bought or borrowed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerHistory {
    pub customer: Customer,
    pub transactions: Vec<TransactionSummary>,
    pub total_outstanding: Money,
    pub total_collected: Money,
}

impl<S: RecordStore> CollectionsService<S> {
    /// store a sale or loan and generate its installment plan
    ///
    /// Everything is validated before the first write. A sale of a catalogue
    /// product takes one unit out of stock.
    pub fn create_transaction(
        &mut self,
        ctx: &SessionContext,
        input: NewTransaction,
        time: &SafeTimeProvider,
    ) -> Result<CreatedTransaction> {
        let customer = self.load_customer(ctx, input.customer_id)?;
        let product = match input.product_id {
            Some(product_id) => Some(self.product(ctx, product_id)?),
            None => None,
        };

        let sells_stock = input.kind == TransactionKind::Sale && product.is_some();
        if let Some(product) = product.as_ref().filter(|_| sells_stock) {
            if product.stock == 0 {
                return Err(BillingError::constraint(format!("{} is out of stock", product.name)));
            }
        }

        let amount = input
            .amount
            .or(product.as_ref().map(|p| p.unit_price))
            .ok_or_else(|| BillingError::validation("amount is required"))?;

        let terms = TransactionTerms::compute(
            amount,
            input.interest_percentage,
            input.number_of_installments,
            &self.config.rounding,
        )?;
        let start_date = input.start_date.unwrap_or_else(|| self.today(time));
        let schedule = generate(
            &ScheduleRequest {
                total: terms.total_amount,
                installments: terms.number_of_installments,
                start_date,
                cadence: input.cadence,
            },
            &self.config.rounding,
        )?;

        let transaction = Transaction {
            id: Uuid::new_v4(),
            organization_id: ctx.organization_id,
            customer_id: customer.id,
            product_id: product.as_ref().map(|p| p.id),
            kind: input.kind,
            original_amount: terms.original_amount,
            interest_percentage: terms.interest_percentage,
            total_amount: terms.total_amount,
            cadence: input.cadence,
            number_of_installments: terms.number_of_installments,
            per_installment_amount: terms.per_installment_amount,
            start_date,
            description: input.description,
            invoice_number: input.invoice_number,
            status: TransactionStatus::Active,
        };
        let transaction = insert_record(&mut self.store, &transaction)?;

        let mut installments = Vec::with_capacity(schedule.len());
        for line in &schedule {
            let installment =
                Installment::pending(transaction.id, line.sequence_number, line.base_amount, line.due_date);
            installments.push(insert_record(&mut self.store, &installment)?);
        }

        if let Some(mut product) = product.filter(|_| sells_stock) {
            let old_stock = product.stock;
            product.stock -= 1;
            save_record(&mut self.store, &product)?;
            self.events.emit(Event::ProductStockAdjusted {
                product_id: product.id,
                old_stock,
                new_stock: product.stock,
            });
        }

        info!(
            transaction_id = %transaction.id,
            customer_id = %customer.id,
            kind = ?transaction.kind,
            total = %transaction.total_amount,
            installments = transaction.number_of_installments,
            operator = %ctx.operator,
            "transaction created"
        );
        debug!(
            per_installment = %transaction.per_installment_amount,
            financing_charge = %terms.financing_charge(),
            "transaction terms"
        );

        if let Some(first) = installments.first() {
            self.events.emit(Event::InstallmentsGenerated {
                transaction_id: transaction.id,
                customer_id: customer.id,
                total: transaction.total_amount,
                installments: transaction.number_of_installments,
                first_due_date: first.due_date,
            });
        }

        Ok(CreatedTransaction {
            transaction,
            installments,
        })
    }

    pub fn create_transaction_now(&mut self, ctx: &SessionContext, input: NewTransaction) -> Result<CreatedTransaction> {
        self.create_transaction(ctx, input, &Self::system_time())
    }

    pub fn transaction(&self, ctx: &SessionContext, id: TransactionId) -> Result<Transaction> {
        self.load_transaction(ctx, id)
    }

    /// installments of a transaction, in sequence order
    pub fn transaction_installments(&self, ctx: &SessionContext, id: TransactionId) -> Result<Vec<Installment>> {
        let transaction = self.load_transaction(ctx, id)?;
        self.installments_of(transaction.id)
    }

    /// a customer's transactions, oldest first, with their balances
    pub fn customer_history(
        &self,
        ctx: &SessionContext,
        customer_id: CustomerId,
        time: &SafeTimeProvider,
    ) -> Result<CustomerHistory> {
        let customer = self.load_customer(ctx, customer_id)?;
        let today = self.today(time);

        let transactions: Vec<Transaction> = fetch_all(
            &self.store,
            &Query::new()
                .eq("organization_id", ctx.organization_id)
                .eq("customer_id", customer.id)
                .order_by("start_date", Direction::Ascending),
        )?;

        let mut summaries = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let installments = self.installments_of(transaction.id)?;
            summaries.push(TransactionSummary {
                label: self.label_for(&transaction)?,
                outstanding: transaction_outstanding_balance(&transaction, &installments),
                collected: amount_collected(&transaction, &installments),
                paid_installments: paid_count(&transaction, &installments),
                overdue_installments: installments
                    .iter()
                    .filter(|i| days_overdue(i, today) > 0)
                    .count() as u32,
                next_due_date: installments
                    .iter()
                    .filter(|i| !i.is_paid())
                    .map(|i| i.due_date)
                    .min(),
                transaction,
                installments,
            });
        }

        Ok(CustomerHistory {
            customer,
            total_outstanding: summaries.iter().map(|s| s.outstanding).sum(),
            total_collected: summaries.iter().map(|s| s.collected).sum(),
            transactions: summaries,
        })
    }
}
