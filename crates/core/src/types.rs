/// Record identifiers handed out by the host's record store.
pub type DbId = i64;

/// Validation messages keyed by dotted attribute path, in insertion order.
pub type ErrorBag = indexmap::IndexMap<String, Vec<String>>;
