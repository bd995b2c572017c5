use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::arrears::{base_amount, reportable_remaining, transaction_outstanding_balance};
use crate::calendar::days_between;
use crate::errors::Result;
use crate::events::Event;
use crate::interest::{reschedule, ArrearsSuggestion, RescheduleOutcome, RescheduleRequest};
use crate::ledger::{build_statement, payment_reversal, sale_reversal, AccountActivity};
use crate::payments::{completion_reached, ensure_payable, reconcile, PaymentRequest};
use crate::records::{Installment, PaymentRecord, Product, Transaction};
use crate::store::{
    delete_record, fetch_all, fetch_optional, insert_record, save_record, Collection, Direction, Query,
    RecordStore,
};
use crate::types::{
    CustomerId, InstallmentId, SessionContext, TransactionId, TransactionKind, TransactionStatus,
};
use crate::views::{ReceiptDetails, ReceiptView, StatementView};

use super::CollectionsService;

impl<S: RecordStore> CollectionsService<S> {
    /// apply a payment to an installment and issue its receipt
    ///
    /// Settling the last open installment completes the transaction.
    pub fn register_payment(&mut self, ctx: &SessionContext, request: PaymentRequest) -> Result<ReceiptView> {
        request.validate()?;
        let (installment, mut transaction) = self.load_installment(ctx, request.installment_id)?;
        ensure_payable(&installment)?;

        let receipt_number = self.next_receipt_number(request.payment_date)?;
        let outcome = reconcile(&installment, &transaction, &request, receipt_number)?;

        save_record(&mut self.store, &outcome.installment)?;
        insert_record(&mut self.store, &outcome.payment_record(ctx.organization_id, &request))?;

        info!(
            transaction_id = %transaction.id,
            installment_id = %installment.id,
            tendered = %request.amount,
            applied = %outcome.amount_applied,
            status = outcome.installment.status.as_str(),
            receipt = %outcome.receipt_number,
            operator = %ctx.operator,
            "payment registered"
        );
        if outcome.excess.is_positive() {
            debug!(excess = %outcome.excess, "payment exceeded what was owed; excess not kept");
        }
        self.events.emit(Event::PaymentApplied {
            transaction_id: transaction.id,
            installment_id: installment.id,
            amount_tendered: request.amount,
            amount_applied: outcome.amount_applied,
            settled: outcome.settled(),
            receipt_number: outcome.receipt_number.clone(),
            date: request.payment_date,
        });

        let siblings = self.installments_of(transaction.id)?;
        let completed = completion_reached(&transaction, &siblings);
        if completed && transaction.status != TransactionStatus::Completed {
            self.set_status(&mut transaction, TransactionStatus::Completed)?;
            self.events.emit(Event::TransactionCompleted {
                transaction_id: transaction.id,
                date: request.payment_date,
            });
        }

        let customer = self.load_customer(ctx, transaction.customer_id)?;
        let label = self.label_for(&transaction)?;
        Ok(ReceiptView::new(
            &outcome.installment,
            ReceiptDetails {
                customer: &customer,
                transaction: &transaction,
                label: &label,
                receipt_number: &outcome.receipt_number,
                payment_date: request.payment_date,
                method: request.method,
                amount_tendered: request.amount,
                amount_applied: outcome.amount_applied,
                installment_remaining: reportable_remaining(&outcome.installment, &transaction),
                transaction_outstanding: transaction_outstanding_balance(&transaction, &siblings),
                transaction_completed: completed,
                operator: &ctx.operator,
            },
        ))
    }

    /// payment events recorded against a transaction, oldest first
    pub fn payment_history(&self, ctx: &SessionContext, transaction_id: TransactionId) -> Result<Vec<PaymentRecord>> {
        let transaction = self.load_transaction(ctx, transaction_id)?;
        fetch_all(
            &self.store,
            &Query::new()
                .eq("transaction_id", transaction.id)
                .order_by("payment_date", Direction::Ascending),
        )
    }

    /// move an installment's due date, optionally charging arrears interest
    pub fn reschedule_installment(
        &mut self,
        ctx: &SessionContext,
        installment_id: InstallmentId,
        request: RescheduleRequest,
        time: &SafeTimeProvider,
    ) -> Result<RescheduleOutcome> {
        let (installment, transaction) = self.load_installment(ctx, installment_id)?;
        let today = self.today(time);

        let mut request = request;
        request.arrears_interest = request
            .arrears_interest
            .map(|interest| interest.round_currency(self.currency_decimals()));
        let outcome = reschedule(&installment, &transaction, &request, today)?;
        save_record(&mut self.store, &outcome.installment)?;

        info!(
            installment_id = %installment.id,
            old_due_date = %outcome.previous_due_date,
            new_due_date = %outcome.installment.due_date,
            interest = %outcome.interest_added,
            owed = %outcome.owed,
            operator = %ctx.operator,
            "installment rescheduled"
        );
        self.events.emit(Event::InstallmentRescheduled {
            transaction_id: transaction.id,
            installment_id: installment.id,
            old_due_date: outcome.previous_due_date,
            new_due_date: outcome.installment.due_date,
            arrears_interest: outcome.installment.arrears_interest,
            owed: outcome.owed,
        });

        Ok(outcome)
    }

    pub fn reschedule_installment_now(
        &mut self,
        ctx: &SessionContext,
        installment_id: InstallmentId,
        request: RescheduleRequest,
    ) -> Result<RescheduleOutcome> {
        self.reschedule_installment(ctx, installment_id, request, &Self::system_time())
    }

    /// advisory arrears interest for rescheduling an installment today
    pub fn suggest_interest(
        &self,
        ctx: &SessionContext,
        installment_id: InstallmentId,
        time: &SafeTimeProvider,
    ) -> Result<ArrearsSuggestion> {
        let (installment, transaction) = self.load_installment(ctx, installment_id)?;
        let today = self.today(time);

        let mut suggestion = self.arrears.suggest(
            base_amount(&installment, &transaction),
            days_between(today, installment.due_date),
        );
        suggestion.interest = suggestion.interest.round_currency(self.currency_decimals());
        Ok(suggestion)
    }

    /// a customer's account statement as of today
    pub fn customer_statement(
        &self,
        ctx: &SessionContext,
        customer_id: CustomerId,
        time: &SafeTimeProvider,
    ) -> Result<StatementView> {
        let customer = self.load_customer(ctx, customer_id)?;
        let transactions: Vec<Transaction> = fetch_all(
            &self.store,
            &Query::new()
                .eq("organization_id", ctx.organization_id)
                .eq("customer_id", customer.id),
        )?;
        let installments = self.installments_for(&transactions)?;

        let labels = transactions
            .iter()
            .map(|t| self.label_for(t))
            .collect::<Result<Vec<String>>>()?;
        let statement = build_statement(transactions.iter().zip(&labels).map(|(transaction, label)| {
            AccountActivity {
                transaction,
                installments: &installments,
                label,
            }
        }));

        debug!(
            customer_id = %customer.id,
            entries = statement.entries.len(),
            balance = %statement.closing_balance,
            "statement built"
        );
        Ok(StatementView::new(&customer, statement, self.today(time)))
    }

    pub fn customer_statement_now(&self, ctx: &SessionContext, customer_id: CustomerId) -> Result<StatementView> {
        self.customer_statement(ctx, customer_id, &Self::system_time())
    }

    /// undo a sale: reset its paid installments, then remove it
    ///
    /// The transaction and its payment events are deleted. Its installments
    /// stay in the store, reset to pending and zeroed, so the schedule remains
    /// visible. A sold product gets its unit back. Returns how many paid
    /// installments were reset.
    pub fn revert_sale(&mut self, ctx: &SessionContext, transaction_id: TransactionId) -> Result<u32> {
        let transaction = self.load_transaction(ctx, transaction_id)?;
        let installments = self.installments_of(transaction.id)?;

        let reset = sale_reversal(&transaction, &installments);
        for installment in &reset {
            save_record(&mut self.store, installment)?;
        }

        let payments: Vec<PaymentRecord> =
            fetch_all(&self.store, &Query::new().eq("transaction_id", transaction.id))?;
        for payment in &payments {
            delete_record::<PaymentRecord, _>(&mut self.store, payment.id)?;
        }
        delete_record::<Transaction, _>(&mut self.store, transaction.id)?;

        if transaction.kind == TransactionKind::Sale {
            if let Some(product_id) = transaction.product_id {
                match fetch_optional::<Product, _>(&self.store, product_id)? {
                    Some(mut product) => {
                        let old_stock = product.stock;
                        product.stock += 1;
                        save_record(&mut self.store, &product)?;
                        self.events.emit(Event::ProductStockAdjusted {
                            product_id,
                            old_stock,
                            new_stock: product.stock,
                        });
                    }
                    None => warn!(product_id = %product_id, "sold product no longer exists; stock not restored"),
                }
            }
        }

        let installments_reset = reset.len() as u32;
        info!(
            transaction_id = %transaction.id,
            installments_reset,
            payments_removed = payments.len(),
            operator = %ctx.operator,
            "sale reverted"
        );
        self.events.emit(Event::TransactionReverted {
            transaction_id: transaction.id,
            installments_reset,
        });
        Ok(installments_reset)
    }

    /// undo the payment on one installment, back to pending
    pub fn revert_payment(&mut self, ctx: &SessionContext, installment_id: InstallmentId) -> Result<Installment> {
        let (installment, mut transaction) = self.load_installment(ctx, installment_id)?;

        let reset = payment_reversal(&installment)?;
        save_record(&mut self.store, &reset)?;

        let payments: Vec<PaymentRecord> =
            fetch_all(&self.store, &Query::new().eq("installment_id", installment.id))?;
        for payment in &payments {
            delete_record::<PaymentRecord, _>(&mut self.store, payment.id)?;
        }

        if transaction.status == TransactionStatus::Completed {
            self.set_status(&mut transaction, TransactionStatus::Active)?;
        }

        info!(
            installment_id = %installment.id,
            amount_reverted = %installment.amount_paid,
            operator = %ctx.operator,
            "payment reverted"
        );
        self.events.emit(Event::PaymentReverted {
            transaction_id: transaction.id,
            installment_id: installment.id,
            amount_reverted: installment.amount_paid,
        });
        Ok(reset)
    }

    /// persist a status change and record it
    pub(super) fn set_status(&mut self, transaction: &mut Transaction, status: TransactionStatus) -> Result<()> {
        let old_status = transaction.status;
        transaction.status = status;
        self.store.update(
            Collection::Transactions,
            transaction.id,
            serde_json::json!({ "status": status }),
        )?;

        info!(
            transaction_id = %transaction.id,
            old_status = old_status.as_str(),
            new_status = status.as_str(),
            "transaction status changed"
        );
        self.events.emit(Event::TransactionStatusChanged {
            transaction_id: transaction.id,
            old_status,
            new_status: status,
        });
        Ok(())
    }

    /// next receipt number not already used by a stored payment
    fn next_receipt_number(&mut self, date: NaiveDate) -> Result<String> {
        loop {
            let candidate = self.receipts.issue(date);
            let taken: Vec<PaymentRecord> = fetch_all(
                &self.store,
                &Query::new().eq("receipt_number", &candidate).limit(1),
            )?;
            if taken.is_empty() {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::errors::BillingError;
    use crate::ledger::EntryKind;
    use crate::service::testing::*;
    use crate::service::CollectionsService;
    use crate::store::InMemoryStore;
    use crate::types::{InstallmentStatus, PaymentMethod};
    use crate::config::BillingConfig;
    use crate::records::Customer;
    use chrono::Duration;

    struct Fixture {
        service: CollectionsService<InMemoryStore>,
        ctx: SessionContext,
        customer: Customer,
        transaction: Transaction,
        installments: Vec<Installment>,
    }

    /// a customer with a 300 loan in three monthly installments from Jan 1st
    fn fixture() -> Fixture {
        let mut service = service();
        let ctx = session();
        let customer = service.create_customer(&ctx, new_customer("30111222")).unwrap();
        let created = service
            .create_transaction(&ctx, loan(customer.id, 300, 3, date(2024, 1, 1)), &clock(2024, 1, 1))
            .unwrap();
        service.take_events();

        Fixture {
            service,
            ctx,
            customer,
            transaction: created.transaction,
            installments: created.installments,
        }
    }

    fn pay(f: &mut Fixture, n: usize, amount: i64, on: NaiveDate) -> crate::views::ReceiptView {
        let request = PaymentRequest::new(f.installments[n].id, Money::from_major(amount), on);
        f.service.register_payment(&f.ctx, request).unwrap()
    }

    #[test]
    fn test_register_payment_caps_and_records() {
        let mut f = fixture();

        let receipt = pay(&mut f, 0, 150, date(2024, 2, 1));
        assert_eq!(receipt.amount_applied, Money::from_major(100));
        assert_eq!(receipt.amount_tendered, Money::from_major(150));
        assert_eq!(receipt.installment_status, InstallmentStatus::Paid);
        assert_eq!(receipt.transaction_outstanding, Money::from_major(200));
        assert_eq!(receipt.receipt_number, "REC-20240201-000001");
        assert_eq!(receipt.customer.full_name, f.customer.full_name());

        let stored = f.service.transaction_installments(&f.ctx, f.transaction.id).unwrap();
        assert_eq!(stored[0].amount_paid, Money::from_major(100));
        assert_eq!(stored[0].date_paid, Some(date(2024, 2, 1)));

        let history = f.service.payment_history(&f.ctx, f.transaction.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount_applied, Money::from_major(100));
    }

    #[test]
    fn test_partial_payments_each_get_a_receipt() {
        let mut f = fixture();

        let first = pay(&mut f, 1, 30, date(2024, 2, 1));
        let second = pay(&mut f, 1, 40, date(2024, 2, 2));
        assert_eq!(second.installment_status, InstallmentStatus::Partial);
        assert_eq!(second.installment_remaining, Money::from_major(30));

        let third = pay(&mut f, 1, 30, date(2024, 2, 3));
        assert_eq!(third.installment_status, InstallmentStatus::Paid);

        let numbers = [&first.receipt_number, &second.receipt_number, &third.receipt_number];
        assert_ne!(numbers[0], numbers[1]);
        assert_ne!(numbers[1], numbers[2]);
        assert_eq!(f.service.payment_history(&f.ctx, f.transaction.id).unwrap().len(), 3);
    }

    #[test]
    fn test_completion_cascade() {
        let mut f = fixture();

        pay(&mut f, 0, 100, date(2024, 2, 1));
        pay(&mut f, 1, 100, date(2024, 3, 1));
        assert_eq!(
            f.service.transaction(&f.ctx, f.transaction.id).unwrap().status,
            TransactionStatus::Active
        );

        let last = pay(&mut f, 2, 100, date(2024, 4, 1));
        assert!(last.transaction_completed);
        assert_eq!(
            f.service.transaction(&f.ctx, f.transaction.id).unwrap().status,
            TransactionStatus::Completed
        );
        assert!(f
            .service
            .events()
            .iter()
            .any(|e| matches!(e, Event::TransactionCompleted { .. })));
    }

    #[test]
    fn test_payment_rejections() {
        let mut f = fixture();

        let zero = PaymentRequest::new(f.installments[0].id, Money::ZERO, date(2024, 2, 1));
        assert!(matches!(
            f.service.register_payment(&f.ctx, zero),
            Err(BillingError::InvalidPaymentAmount { .. })
        ));

        let unknown = PaymentRequest::new(uuid::Uuid::new_v4(), Money::from_major(10), date(2024, 2, 1));
        assert!(matches!(
            f.service.register_payment(&f.ctx, unknown),
            Err(BillingError::NotFound { .. })
        ));

        // another organization cannot pay into this transaction
        let foreign = PaymentRequest::new(f.installments[0].id, Money::from_major(10), date(2024, 2, 1));
        assert!(matches!(
            f.service.register_payment(&session(), foreign),
            Err(BillingError::NotFound { .. })
        ));

        assert!(f.service.payment_history(&f.ctx, f.transaction.id).unwrap().is_empty());
    }

    #[test]
    fn test_paid_installment_rejects_second_payment() {
        let mut f = fixture();
        pay(&mut f, 0, 100, date(2024, 2, 1));

        let again = PaymentRequest::new(f.installments[0].id, Money::from_major(50), date(2024, 6, 1));
        assert!(matches!(
            f.service.register_payment(&f.ctx, again),
            Err(BillingError::Constraint { .. })
        ));

        let stored = &f.service.transaction_installments(&f.ctx, f.transaction.id).unwrap()[0];
        assert_eq!(stored.date_paid, Some(date(2024, 2, 1)));
        assert_eq!(stored.receipt_number.as_deref(), Some("REC-20240201-000001"));
        assert_eq!(f.service.payment_history(&f.ctx, f.transaction.id).unwrap().len(), 1);
    }

    #[test]
    fn test_store_failure_propagates() {
        let mut f = fixture();
        f.service.store_mut().set_offline(true);

        let request = PaymentRequest::new(f.installments[0].id, Money::from_major(10), date(2024, 2, 1));
        assert!(matches!(
            f.service.register_payment(&f.ctx, request),
            Err(BillingError::Store { .. })
        ));
    }

    #[test]
    fn test_receipts_stay_unique_across_service_instances() {
        let mut f = fixture();
        let first = pay(&mut f, 0, 10, date(2024, 2, 1));

        let store = f.service.into_store();
        let mut restarted = CollectionsService::new(store, BillingConfig::default()).unwrap();
        let request = PaymentRequest::new(f.installments[0].id, Money::from_major(10), date(2024, 2, 1))
            .with_method(PaymentMethod::Transfer);
        let second = restarted.register_payment(&f.ctx, request).unwrap();

        assert_ne!(first.receipt_number, second.receipt_number);
    }

    #[test]
    fn test_reschedule_and_suggestion() {
        let mut f = fixture();
        let time = clock(2024, 3, 5);
        let first = f.installments[0].id;

        // due Feb 1st, 33 days late: two started blocks of 1%
        let suggestion = f.service.suggest_interest(&f.ctx, first, &time).unwrap();
        assert_eq!(suggestion.days_overdue, 33);
        assert_eq!(suggestion.interest, Money::from_major(2));

        let outcome = f
            .service
            .reschedule_installment(
                &f.ctx,
                first,
                RescheduleRequest::to(date(2024, 3, 20))
                    .with_interest(Money::from_major(15))
                    .with_reason("lost job"),
                &time,
            )
            .unwrap();
        assert_eq!(outcome.owed, Money::from_major(115));

        let stored = &f.service.transaction_installments(&f.ctx, f.transaction.id).unwrap()[0];
        assert_eq!(stored.status, InstallmentStatus::Rescheduled);
        assert_eq!(stored.reschedule_date, Some(date(2024, 3, 5)));
        assert_eq!(
            f.service.suggest_interest(&f.ctx, first, &time).unwrap().interest,
            Money::ZERO
        );

        let receipt = pay(&mut f, 0, 115, date(2024, 3, 20));
        assert_eq!(receipt.amount_applied, Money::from_major(115));
        assert_eq!(receipt.installment_status, InstallmentStatus::Paid);
    }

    #[test]
    fn test_statement_running_balance() {
        let mut f = fixture();
        pay(&mut f, 0, 100, date(2024, 1, 5));
        pay(&mut f, 1, 100, date(2024, 1, 10));

        let view = f
            .service
            .customer_statement(&f.ctx, f.customer.id, &clock(2024, 1, 31))
            .unwrap();

        let balances: Vec<Money> = view.entries.iter().map(|e| e.balance).collect();
        assert_eq!(
            balances,
            vec![Money::from_major(300), Money::from_major(200), Money::from_major(100)]
        );
        assert_eq!(view.entries[0].kind, EntryKind::Sale);
        assert_eq!(view.entries[0].description, "Cash loan");
        assert_eq!(view.generated_on, date(2024, 1, 31));
    }

    #[test]
    fn test_revert_payment() {
        let mut f = fixture();
        for n in 0..3 {
            pay(&mut f, n, 100, date(2024, 2, 1) + Duration::days(n as i64));
        }
        assert_eq!(
            f.service.transaction(&f.ctx, f.transaction.id).unwrap().status,
            TransactionStatus::Completed
        );

        let reset = f.service.revert_payment(&f.ctx, f.installments[1].id).unwrap();
        assert_eq!(reset.status, InstallmentStatus::Pending);
        assert!(reset.amount_paid.is_zero());
        assert_eq!(reset.receipt_number, None);
        assert_eq!(
            f.service.transaction(&f.ctx, f.transaction.id).unwrap().status,
            TransactionStatus::Active
        );
        assert_eq!(f.service.payment_history(&f.ctx, f.transaction.id).unwrap().len(), 2);

        // nothing left to revert
        assert!(matches!(
            f.service.revert_payment(&f.ctx, f.installments[1].id),
            Err(BillingError::Constraint { .. })
        ));
    }

    #[test]
    fn test_revert_sale() {
        let mut f = fixture();
        let product = f.service.create_product(&f.ctx, new_product(1)).unwrap();
        let sale = crate::service::NewTransaction {
            product_id: Some(product.id),
            kind: TransactionKind::Sale,
            amount: None,
            ..loan(f.customer.id, 0, 2, date(2024, 1, 1))
        };
        let created = f.service.create_transaction(&f.ctx, sale, &clock(2024, 1, 1)).unwrap();
        let request = PaymentRequest::new(created.installments[0].id, Money::from_major(150), date(2024, 2, 1));
        f.service.register_payment(&f.ctx, request).unwrap();

        let reset = f.service.revert_sale(&f.ctx, created.transaction.id).unwrap();
        assert_eq!(reset, 1);

        assert!(f.service.transaction(&f.ctx, created.transaction.id).is_err());
        assert_eq!(f.service.product(&f.ctx, product.id).unwrap().stock, 1);
        assert_eq!(f.service.store().len(Collection::Payments), 0);

        // the sale's schedule is kept, reset to pending and zeroed
        assert_eq!(f.service.store().len(Collection::Installments), 5);
        let kept: Vec<Installment> = fetch_all(
            f.service.store(),
            &Query::new().eq("transaction_id", created.transaction.id),
        )
        .unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|i| i.status == InstallmentStatus::Pending));
        assert!(kept.iter().all(|i| i.amount_paid.is_zero() && i.date_paid.is_none()));
        assert!(kept.iter().all(|i| i.receipt_number.is_none()));

        // the remaining loan is untouched and the customer still has history
        let view = f
            .service
            .customer_statement(&f.ctx, f.customer.id, &clock(2024, 2, 2))
            .unwrap();
        assert_eq!(view.closing_balance, Money::from_major(300));
    }
}
