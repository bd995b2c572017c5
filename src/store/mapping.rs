//! typed adapter over the record store
//!
//! Storage shapes drift; the calculation code never sees a raw document.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{BillingError, Result};
use crate::records::{Customer, Installment, PaymentRecord, Product, Transaction};

use super::{Collection, Query, RecordStore};

/// a typed record living in one collection
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;
}

impl Record for Customer {
    const COLLECTION: Collection = Collection::Customers;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Product {
    const COLLECTION: Collection = Collection::Products;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Transaction {
    const COLLECTION: Collection = Collection::Transactions;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Installment {
    const COLLECTION: Collection = Collection::Installments;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for PaymentRecord {
    const COLLECTION: Collection = Collection::Payments;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// fetch one record by id
pub fn fetch<T: Record, S: RecordStore + ?Sized>(store: &S, id: Uuid) -> Result<T> {
    fetch_optional(store, id)?.ok_or(BillingError::NotFound {
        entity: T::COLLECTION,
        id,
    })
}

/// fetch one record by id, `None` when absent
pub fn fetch_optional<T: Record, S: RecordStore + ?Sized>(store: &S, id: Uuid) -> Result<Option<T>> {
    let query = Query::new().eq("id", id).limit(1);
    match store.find(T::COLLECTION, &query)?.into_iter().next() {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// fetch every record matching `query`
pub fn fetch_all<T: Record, S: RecordStore + ?Sized>(store: &S, query: &Query) -> Result<Vec<T>> {
    store
        .find(T::COLLECTION, query)?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(BillingError::from))
        .collect()
}

pub fn insert_record<T: Record, S: RecordStore + ?Sized>(store: &mut S, record: &T) -> Result<T> {
    let stored = store.insert(T::COLLECTION, serde_json::to_value(record)?)?;
    Ok(serde_json::from_value(stored)?)
}

/// write the whole record back over its stored version
pub fn save_record<T: Record, S: RecordStore + ?Sized>(store: &mut S, record: &T) -> Result<()> {
    store.update(T::COLLECTION, record.id(), serde_json::to_value(record)?)
}

pub fn delete_record<T: Record, S: RecordStore + ?Sized>(store: &mut S, id: Uuid) -> Result<()> {
    store.delete(T::COLLECTION, id)
}
