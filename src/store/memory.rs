use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{BillingError, Result};

use super::{Collection, Query, RecordStore};

/// record store held in memory, keeping insertion order per collection
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: HashMap<Collection, Vec<Value>>,
    offline: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// simulate an unreachable backend; every call fails while set
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collections.get(&collection).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(BillingError::store("record store unreachable"));
        }
        Ok(())
    }

    fn position(&self, collection: Collection, id: Uuid) -> Option<usize> {
        let id = id.to_string();
        self.collections
            .get(&collection)?
            .iter()
            .position(|record| record.get("id").and_then(Value::as_str) == Some(id.as_str()))
    }
}

fn record_id(record: &Value) -> Result<Uuid> {
    let raw = record
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| BillingError::store("record has no string id"))?;
    Uuid::parse_str(raw).map_err(|e| BillingError::store(format!("record id '{}' is not a uuid: {}", raw, e)))
}

impl RecordStore for InMemoryStore {
    fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Value>> {
        self.check_online()?;
        let matching = self
            .collections
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| query.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(query.arrange(matching))
    }

    fn insert(&mut self, collection: Collection, record: Value) -> Result<Value> {
        self.check_online()?;
        if !record.is_object() {
            return Err(BillingError::store(format!("{} records must be objects", collection)));
        }
        let id = record_id(&record)?;
        if self.position(collection, id).is_some() {
            return Err(BillingError::store(format!("duplicate id {} in {}", id, collection)));
        }

        self.collections.entry(collection).or_default().push(record.clone());
        Ok(record)
    }

    fn update(&mut self, collection: Collection, id: Uuid, patch: Value) -> Result<()> {
        self.check_online()?;
        let Value::Object(patch) = patch else {
            return Err(BillingError::store("patch must be an object"));
        };

        let index = self
            .position(collection, id)
            .ok_or(BillingError::NotFound { entity: collection, id })?;
        let records = self
            .collections
            .get_mut(&collection)
            .ok_or(BillingError::NotFound { entity: collection, id })?;

        if let Some(Value::Object(record)) = records.get_mut(index) {
            for (key, value) in patch {
                // ids are immutable
                if key != "id" {
                    record.insert(key, value);
                }
            }
        }
        Ok(())
    }

    fn delete(&mut self, collection: Collection, id: Uuid) -> Result<()> {
        self.check_online()?;
        let index = self
            .position(collection, id)
            .ok_or(BillingError::NotFound { entity: collection, id })?;
        if let Some(records) = self.collections.get_mut(&collection) {
            records.remove(index);
        }
        Ok(())
    }
}
