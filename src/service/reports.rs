use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::arrears::{
    base_amount, classify, dashboard_metrics, days_overdue, derive_status, remaining,
    reportable_remaining, DashboardMetrics, PortfolioSnapshot,
};
use crate::calendar::days_between;
use crate::decimal::Money;
use crate::errors::Result;
use crate::records::{Customer, Installment, Transaction};
use crate::store::RecordStore;
use crate::types::{CustomerId, SessionContext, TransactionId};
use crate::views::{ContactView, NotificationView};

use super::CollectionsService;

/// a transaction with installments past due
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyEntry {
    pub contact: ContactView,
    pub transaction_id: TransactionId,
    pub label: String,
    pub oldest_due_date: NaiveDate,
    /// days the oldest open installment is late
    pub days_overdue: u32,
    pub overdue_installments: u32,
    pub overdue_amount: Money,
    pub outstanding: Money,
    /// advisory arrears interest summed over the overdue installments
    pub suggested_interest: Money,
}

/// the organization's transactions and installments, loaded once per report
struct Portfolio {
    customers: HashMap<CustomerId, Customer>,
    transactions: Vec<Transaction>,
    installments: Vec<Installment>,
    /// position of each transaction in `transactions`
    index: HashMap<TransactionId, usize>,
}

impl Portfolio {
    fn new(customers: HashMap<CustomerId, Customer>, transactions: Vec<Transaction>, installments: Vec<Installment>) -> Self {
        let index = transactions.iter().enumerate().map(|(n, t)| (t.id, n)).collect();
        Self {
            customers,
            transactions,
            installments,
            index,
        }
    }

    fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.index.get(&id).map(|&n| &self.transactions[n])
    }

    /// outstanding balance of every transaction, in one pass over the installments
    fn outstanding_balances(&self) -> HashMap<TransactionId, Money> {
        let mut balances: HashMap<TransactionId, Money> =
            self.transactions.iter().map(|t| (t.id, Money::ZERO)).collect();
        for installment in self.installments.iter().filter(|i| !i.is_paid()) {
            if let Some(transaction) = self.transaction(installment.transaction_id) {
                *balances.entry(transaction.id).or_default() += remaining(installment, transaction);
            }
        }
        balances
    }

    fn installments_of<'a>(&'a self, id: TransactionId) -> impl Iterator<Item = &'a Installment> + 'a {
        self.installments.iter().filter(move |i| i.transaction_id == id)
    }
}

impl<S: RecordStore> CollectionsService<S> {
    fn portfolio(&self, ctx: &SessionContext) -> Result<Portfolio> {
        let customers = self
            .tenant_customers(ctx)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let transactions = self.tenant_transactions(ctx)?;
        let installments = self.installments_for(&transactions)?;
        Ok(Portfolio::new(customers, transactions, installments))
    }

    /// open installments overdue or due within `window_days`, soonest first
    ///
    /// `None` uses the configured notification window.
    pub fn notifications(
        &self,
        ctx: &SessionContext,
        window_days: Option<u32>,
        time: &SafeTimeProvider,
    ) -> Result<Vec<NotificationView>> {
        let today = self.today(time);
        let window = i64::from(window_days.unwrap_or(self.config.collections.notification_window_days));
        let portfolio = self.portfolio(ctx)?;

        let outstanding = portfolio.outstanding_balances();
        let mut labels: HashMap<TransactionId, String> = HashMap::new();
        let mut notifications = Vec::new();

        for installment in &portfolio.installments {
            let Some(classification) = classify(installment, today) else {
                continue;
            };
            let days_until = days_between(today, installment.due_date);
            if days_until > window {
                continue;
            }
            let Some(transaction) = portfolio.transaction(installment.transaction_id) else {
                continue;
            };
            let Some(customer) = portfolio.customers.get(&transaction.customer_id) else {
                continue;
            };

            let label = match labels.get(&transaction.id) {
                Some(label) => label.clone(),
                None => {
                    let label = self.label_for(transaction)?;
                    labels.insert(transaction.id, label.clone());
                    label
                }
            };

            notifications.push(NotificationView {
                installment_id: installment.id,
                transaction_id: transaction.id,
                contact: ContactView::from_customer(customer),
                label,
                sequence_number: installment.sequence_number,
                number_of_installments: transaction.number_of_installments,
                due_date: installment.due_date,
                days_until,
                classification,
                status: installment.status,
                rescheduled: installment.is_rescheduled(),
                remaining: reportable_remaining(installment, transaction),
                transaction_outstanding: outstanding.get(&transaction.id).copied().unwrap_or(Money::ZERO),
            });
        }

        notifications.sort_by_key(|n| (n.due_date, n.sequence_number));
        debug!(count = notifications.len(), window, "notifications computed");
        Ok(notifications)
    }

    pub fn notifications_now(&self, ctx: &SessionContext, window_days: Option<u32>) -> Result<Vec<NotificationView>> {
        self.notifications(ctx, window_days, &Self::system_time())
    }

    /// headline collection figures for today
    pub fn dashboard(&self, ctx: &SessionContext, time: &SafeTimeProvider) -> Result<DashboardMetrics> {
        let today = self.today(time);
        let portfolio = self.portfolio(ctx)?;

        Ok(dashboard_metrics(
            PortfolioSnapshot {
                total_customers: portfolio.customers.len() as u32,
                transactions: &portfolio.transactions,
                installments: &portfolio.installments,
            },
            today,
            &self.config.collections,
            self.currency_decimals(),
        ))
    }

    /// transactions whose oldest open installment is at least `min_days` late,
    /// most overdue first
    pub fn delinquency_report(
        &self,
        ctx: &SessionContext,
        min_days: u32,
        time: &SafeTimeProvider,
    ) -> Result<Vec<DelinquencyEntry>> {
        let today = self.today(time);
        let portfolio = self.portfolio(ctx)?;
        let min_days = min_days.max(1);
        let outstanding = portfolio.outstanding_balances();
        let mut entries = Vec::new();

        for transaction in &portfolio.transactions {
            let overdue: Vec<&Installment> = portfolio
                .installments_of(transaction.id)
                .filter(|i| days_overdue(i, today) > 0)
                .collect();
            let Some(oldest) = overdue.iter().min_by_key(|i| i.due_date) else {
                continue;
            };
            let worst = days_overdue(oldest, today);
            if worst < min_days {
                continue;
            }
            let Some(customer) = portfolio.customers.get(&transaction.customer_id) else {
                continue;
            };

            entries.push(DelinquencyEntry {
                contact: ContactView::from_customer(customer),
                transaction_id: transaction.id,
                label: self.label_for(transaction)?,
                oldest_due_date: oldest.due_date,
                days_overdue: worst,
                overdue_installments: overdue.len() as u32,
                overdue_amount: overdue.iter().map(|i| reportable_remaining(i, transaction)).sum(),
                outstanding: outstanding.get(&transaction.id).copied().unwrap_or(Money::ZERO),
                suggested_interest: overdue
                    .iter()
                    .map(|i| {
                        self.arrears.suggest_rounded(
                            base_amount(i, transaction),
                            days_between(today, i.due_date),
                            self.currency_decimals(),
                        )
                    })
                    .sum(),
            });
        }

        entries.sort_by(|a, b| {
            b.days_overdue
                .cmp(&a.days_overdue)
                .then_with(|| b.overdue_amount.cmp(&a.overdue_amount))
        });
        Ok(entries)
    }

    /// re-derive every transaction's status; returns how many changed
    pub fn refresh_statuses(&mut self, ctx: &SessionContext, time: &SafeTimeProvider) -> Result<u32> {
        let today = self.today(time);
        let threshold = self.config.collections.delinquency_threshold_days;
        let portfolio = self.portfolio(ctx)?;
        let mut changed = 0;

        for mut transaction in portfolio.transactions {
            let status = derive_status(&transaction, &portfolio.installments, today, threshold);
            if status != transaction.status {
                self.set_status(&mut transaction, status)?;
                changed += 1;
            }
        }

        info!(organization_id = %ctx.organization_id, changed, "transaction statuses refreshed");
        Ok(changed)
    }

    pub fn refresh_statuses_now(&mut self, ctx: &SessionContext) -> Result<u32> {
        self.refresh_statuses(ctx, &Self::system_time())
    }
}
