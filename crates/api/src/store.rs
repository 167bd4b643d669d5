//! In-memory record store standing in for the host's persistence layer.

use std::collections::BTreeMap;

use items_core::record::Record;
use items_core::types::DbId;
use serde::Serialize;
use serde_json::{Map, Value};

/// A stored record: an id plus free-form JSON attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub id: DbId,
    pub attributes: Map<String, Value>,
}

impl Record for StoredRecord {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }
}

#[derive(Debug, Default)]
pub struct RecordStore {
    last_id: DbId,
    records: BTreeMap<DbId, StoredRecord>,
}

impl RecordStore {
    pub fn insert(&mut self, attributes: Map<String, Value>) -> StoredRecord {
        self.last_id += 1;
        let record = StoredRecord {
            id: self.last_id,
            attributes,
        };
        self.records.insert(record.id, record.clone());
        record
    }

    pub fn get(&self, id: DbId) -> Option<&StoredRecord> {
        self.records.get(&id)
    }

    /// Replace a record. Returns `false` when no record has `record.id`.
    pub fn save(&mut self, record: StoredRecord) -> bool {
        match self.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }

    pub fn list(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.values()
    }
}
