pub mod arrears;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod ledger;
pub mod payments;
pub mod records;
pub mod schedule;
pub mod service;
pub mod store;
pub mod types;
pub mod views;

// re-export key types
pub use arrears::{
    classify, owed_amount, remaining, transaction_outstanding_balance, DashboardMetrics, DueSummary,
};
pub use calendar::{days_until, parse_due_date, Calendar, PaymentCadence};
pub use config::BillingConfig;
pub use decimal::{Money, Rate};
pub use errors::{BillingError, Result};
pub use events::{Event, EventStore};
pub use interest::{suggested_interest, ArrearsEngine, RescheduleRequest};
pub use ledger::{build_statement, AccountActivity, EntryKind, LedgerEntry, Statement};
pub use payments::{reconcile, PaymentRequest, ReceiptIssuer};
pub use records::{Customer, Installment, PaymentRecord, Product, Transaction};
pub use schedule::{generate, ScheduleRequest, ScheduledInstallment, TransactionTerms};
pub use service::{CollectionsService, NewCustomer, NewProduct, NewTransaction};
pub use store::{Collection, InMemoryStore, Query, RecordStore};
pub use types::{
    DueClassification, InstallmentStatus, PaymentMethod, ProductCategory, SessionContext,
    TransactionKind, TransactionStatus,
};
pub use views::{NotificationView, ReceiptView, StatementView};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
