//! Persistence boundary: the in-memory record a field writes into.

use serde_json::{Map, Value};

/// A record whose attributes can be read and assigned by name.
///
/// Saving the record to storage is the host's concern; fields only ever
/// assign attributes in memory.
pub trait Record {
    fn attribute(&self, name: &str) -> Option<&Value>;

    fn set_attribute(&mut self, name: &str, value: Value);
}

impl Record for Map<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.insert(name.to_string(), value);
    }
}
