//! abstract record store
//!
//! Persistence is a collaborator: anything that can find, insert, update and
//! delete JSON documents by collection can back the service. Typed records
//! cross this boundary only through [`mapping`].

pub mod mapping;
pub mod memory;

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use rust_decimal::Decimal;

use crate::errors::Result;

pub use mapping::{delete_record, fetch, fetch_all, fetch_optional, insert_record, save_record, Record};
pub use memory::InMemoryStore;

/// record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Customers,
    Products,
    Transactions,
    Installments,
    Payments,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Customers => "customers",
            Collection::Products => "products",
            Collection::Transactions => "transactions",
            Collection::Installments => "installments",
            Collection::Payments => "payments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CRUD access to JSON documents
pub trait RecordStore {
    /// records matching every filter, ordered and limited as the query asks
    fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>>;

    /// store a new record; it must carry a string `id`
    fn insert(&mut self, collection: Collection, record: Value) -> Result<Value>;

    /// shallow-merge `patch` into the record with `id`
    fn update(&mut self, collection: Collection, id: Uuid, patch: Value) -> Result<()>;

    fn delete(&mut self, collection: Collection, id: Uuid) -> Result<()>;
}

/// field filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
    Lt(String, Value),
    Lte(String, Value),
    Gt(String, Value),
    Gte(String, Value),
}

impl Filter {
    pub fn matches(&self, record: &Value) -> bool {
        let field_value = |field: &str| record.get(field).unwrap_or(&Value::Null);

        match self {
            Filter::Eq(field, expected) => values_equal(field_value(field), expected),
            Filter::In(field, candidates) => {
                let actual = field_value(field);
                candidates.iter().any(|c| values_equal(actual, c))
            }
            Filter::Lt(field, bound) => compare_values(field_value(field), bound) == Some(Ordering::Less),
            Filter::Lte(field, bound) => matches!(
                compare_values(field_value(field), bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Filter::Gt(field, bound) => {
                compare_values(field_value(field), bound) == Some(Ordering::Greater)
            }
            Filter::Gte(field, bound) => matches!(
                compare_values(field_value(field), bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

/// sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// filters, one order-by field and an optional limit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), to_filter_value(value)));
        self
    }

    pub fn is_in<T: Serialize>(mut self, field: &str, values: impl IntoIterator<Item = T>) -> Self {
        let values = values.into_iter().map(to_filter_value).collect();
        self.filters.push(Filter::In(field.to_string(), values));
        self
    }

    pub fn lt(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters.push(Filter::Lt(field.to_string(), to_filter_value(value)));
        self
    }

    pub fn lte(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters.push(Filter::Lte(field.to_string(), to_filter_value(value)));
        self
    }

    pub fn gt(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters.push(Filter::Gt(field.to_string(), to_filter_value(value)));
        self
    }

    pub fn gte(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters.push(Filter::Gte(field.to_string(), to_filter_value(value)));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// apply ordering and limit to already-filtered records
    pub fn arrange(&self, mut records: Vec<Value>) -> Vec<Value> {
        if let Some(order) = &self.order_by {
            records.sort_by(|a, b| {
                let a = a.get(&order.field).unwrap_or(&Value::Null);
                let b = b.get(&order.field).unwrap_or(&Value::Null);
                let ordering = compare_values(a, b).unwrap_or(Ordering::Equal);
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }
        records
    }
}

// ids, dates and enums always serialize
fn to_filter_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// equality for filters; strings match only when identical, so "0123" and
/// "123" stay distinct documents
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a == b,
        _ => compare_values(a, b) == Some(Ordering::Equal),
    }
}

/// order two stored values; decimal strings compare numerically, other
/// strings (ids, `YYYY-MM-DD` dates, enum tags) lexically
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                Some(a.cmp(&b))
            } else {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
        }
        (Value::String(a), Value::String(b)) => {
            match (Decimal::from_str(a), Decimal::from_str(b)) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        _ => None,
    }
}
