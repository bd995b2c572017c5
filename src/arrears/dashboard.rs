use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::calendar::{days_between, month_start};
use crate::config::CollectionsConfig;
use crate::decimal::{Money, Rate};
use crate::records::{Installment, Transaction};
use crate::types::{CustomerId, DueClassification, TransactionId};

use super::{classify, reportable_remaining, transaction_outstanding_balance};

/// count and amount of a group of installments
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DueBucket {
    pub count: u32,
    pub amount: Money,
}

impl DueBucket {
    fn add(&mut self, amount: Money) {
        self.count += 1;
        self.amount += amount;
    }
}

/// open installments grouped by due-date proximity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DueSummary {
    pub overdue: DueBucket,
    pub due_today: DueBucket,
    /// upcoming within the "due soon" window
    pub due_soon: DueBucket,
    /// upcoming beyond the window
    pub later: DueBucket,
}

impl DueSummary {
    /// overdue plus due today
    pub fn urgent_amount(&self) -> Money {
        self.overdue.amount + self.due_today.amount
    }
}

/// bucket every open installment by classification
pub fn summarize_due<'a>(
    lines: impl IntoIterator<Item = (&'a Installment, &'a Transaction)>,
    today: NaiveDate,
    due_soon_days: u32,
) -> DueSummary {
    let mut summary = DueSummary::default();

    for (installment, transaction) in lines {
        let Some(classification) = classify(installment, today) else {
            continue;
        };
        let amount = reportable_remaining(installment, transaction);

        match classification {
            DueClassification::Overdue => summary.overdue.add(amount),
            DueClassification::DueToday => summary.due_today.add(amount),
            DueClassification::Upcoming => {
                if days_between(today, installment.due_date) <= due_soon_days as i64 {
                    summary.due_soon.add(amount);
                } else {
                    summary.later.add(amount);
                }
            }
        }
    }

    summary
}

/// the data a dashboard is computed from
#[derive(Debug, Clone, Copy)]
pub struct PortfolioSnapshot<'a> {
    pub total_customers: u32,
    pub transactions: &'a [Transaction],
    pub installments: &'a [Installment],
}

/// headline collection figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub as_of: NaiveDate,
    pub total_customers: u32,
    pub due: DueSummary,
    pub total_outstanding: Money,
    /// transactions started this month
    pub sales_this_month: Money,
    /// installments settled this month
    pub collections_this_month: Money,
    pub customers_with_overdue: u32,
    /// collections over sales this month
    pub collection_effectiveness: Rate,
    pub average_outstanding_per_customer: Money,
}

impl DashboardMetrics {
    /// share of customers with at least one overdue installment
    pub fn delinquent_customer_share(&self) -> Rate {
        if self.total_customers == 0 {
            return Rate::ZERO;
        }
        Rate::from_decimal(
            Decimal::from(self.customers_with_overdue) / Decimal::from(self.total_customers),
        )
    }
}

/// `currency_decimals` rounds the per-customer average
pub fn dashboard_metrics(
    snapshot: PortfolioSnapshot<'_>,
    today: NaiveDate,
    collections: &CollectionsConfig,
    currency_decimals: u32,
) -> DashboardMetrics {
    let by_id: HashMap<TransactionId, &Transaction> =
        snapshot.transactions.iter().map(|t| (t.id, t)).collect();

    let lines: Vec<(&Installment, &Transaction)> = snapshot
        .installments
        .iter()
        .filter_map(|i| by_id.get(&i.transaction_id).map(|t| (i, *t)))
        .collect();

    let due = summarize_due(lines.iter().copied(), today, collections.due_soon_days);

    let total_outstanding: Money = snapshot
        .transactions
        .iter()
        .map(|t| transaction_outstanding_balance(t, snapshot.installments))
        .sum();

    let month_begins = month_start(today);
    let in_month = |date: NaiveDate| date >= month_begins && date <= today;

    let sales_this_month: Money = snapshot
        .transactions
        .iter()
        .filter(|t| in_month(t.start_date))
        .map(|t| t.total_amount)
        .sum();

    let collections_this_month: Money = lines
        .iter()
        .filter(|(i, _)| i.is_paid() && i.date_paid.map(in_month).unwrap_or(false))
        .map(|(i, _)| i.amount_paid)
        .sum();

    let overdue_customers: HashSet<CustomerId> = lines
        .iter()
        .filter(|(i, _)| classify(i, today) == Some(DueClassification::Overdue))
        .map(|(_, t)| t.customer_id)
        .collect();

    let collection_effectiveness = if sales_this_month.is_positive() {
        Rate::from_decimal(collections_this_month.as_decimal() / sales_this_month.as_decimal())
    } else {
        Rate::ZERO
    };

    let average_outstanding_per_customer = if snapshot.total_customers > 0 {
        (total_outstanding / Decimal::from(snapshot.total_customers)).round_currency(currency_decimals)
    } else {
        Money::ZERO
    };

    DashboardMetrics {
        as_of: today,
        total_customers: snapshot.total_customers,
        due,
        total_outstanding,
        sales_this_month,
        collections_this_month,
        customers_with_overdue: overdue_customers.len() as u32,
        collection_effectiveness,
        average_outstanding_per_customer,
    }
}
