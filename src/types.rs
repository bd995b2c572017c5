use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type CustomerId = Uuid;
pub type ProductId = Uuid;
pub type TransactionId = Uuid;
pub type InstallmentId = Uuid;
pub type PaymentId = Uuid;
pub type OrganizationId = Uuid;

/// what was financed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// goods sold on installments
    Sale,
    /// cash lent out
    Loan,
}

/// transaction lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Active,
    /// every installment paid
    Completed,
    /// an open installment is past the delinquency threshold
    Delinquent,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Active => "active",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Delinquent => "delinquent",
        }
    }
}

/// installment payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    /// due date moved, possibly with an arrears surcharge
    Rescheduled,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Partial => "partial",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Rescheduled => "rescheduled",
        }
    }

    /// still owes money
    pub fn is_open(&self) -> bool {
        !matches!(self, InstallmentStatus::Paid)
    }

    /// the statuses a collections query asks the store for
    pub fn open_statuses() -> [InstallmentStatus; 3] {
        [
            InstallmentStatus::Pending,
            InstallmentStatus::Partial,
            InstallmentStatus::Rescheduled,
        ]
    }
}

/// product catalogue category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Appliance,
    Loan,
}

/// how the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Transfer,
    DebitCard,
    CreditCard,
    Check,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::Check => "check",
        };
        f.write_str(label)
    }
}

/// where an open installment sits relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueClassification {
    Overdue,
    DueToday,
    Upcoming,
}

impl DueClassification {
    pub fn from_days_until(days: i64) -> Self {
        if days < 0 {
            DueClassification::Overdue
        } else if days == 0 {
            DueClassification::DueToday
        } else {
            DueClassification::Upcoming
        }
    }
}

/// explicit caller context; replaces any ambient "current user" state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub organization_id: OrganizationId,
    pub operator: String,
}

impl SessionContext {
    pub fn new(organization_id: OrganizationId, operator: impl Into<String>) -> Self {
        Self {
            organization_id,
            operator: operator.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(DueClassification::from_days_until(-1), DueClassification::Overdue);
        assert_eq!(DueClassification::from_days_until(0), DueClassification::DueToday);
        assert_eq!(DueClassification::from_days_until(1), DueClassification::Upcoming);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&InstallmentStatus::Rescheduled).unwrap();
        assert_eq!(json, "\"rescheduled\"");

        let status: TransactionStatus = serde_json::from_str("\"delinquent\"").unwrap();
        assert_eq!(status, TransactionStatus::Delinquent);
    }

    #[test]
    fn test_open_statuses() {
        assert!(InstallmentStatus::Rescheduled.is_open());
        assert!(InstallmentStatus::Partial.is_open());
        assert!(!InstallmentStatus::Paid.is_open());
        assert!(!InstallmentStatus::open_statuses().contains(&InstallmentStatus::Paid));
    }
}
