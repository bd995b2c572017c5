pub mod generator;
pub mod terms;

pub use generator::{generate, ScheduleRequest, ScheduledInstallment};
pub use terms::TransactionTerms;
