use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::store::Collection;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: Collection,
        id: Uuid,
    },

    #[error("constraint violated: {message}")]
    Constraint {
        message: String,
    },

    #[error("record store failure: {message}")]
    Store {
        message: String,
    },

    #[error("record mapping failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation {
            message: message.into(),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        BillingError::Constraint {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        BillingError::Store {
            message: message.into(),
        }
    }

    /// true for the input errors a caller should show back to the operator
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BillingError::Validation { .. }
                | BillingError::InvalidPaymentAmount { .. }
                | BillingError::InvalidDate { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
