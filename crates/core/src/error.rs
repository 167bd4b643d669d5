use crate::types::{DbId, ErrorBag};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The submitted value for `field` could not be decoded as JSON.
    #[error("Malformed payload for '{field}': {reason}")]
    MalformedPayload { field: String, reason: String },

    /// The submitted value is not an array, or one or more rows failed the
    /// configured item rules. Keys are request attributes, never row paths.
    #[error("Validation failed: {}", summarize(.0))]
    SchemaViolation(ErrorBag),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The error bag carried by a [`CoreError::SchemaViolation`], if any.
    pub fn errors(&self) -> Option<&ErrorBag> {
        match self {
            Self::SchemaViolation(bag) => Some(bag),
            _ => None,
        }
    }
}

fn summarize(bag: &ErrorBag) -> String {
    bag.values()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
