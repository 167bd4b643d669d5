//! Row-relative error remapping.
//!
//! The rule engine reports row failures under paths such as `items.0`, and
//! its messages name that path ("The items.0 field must be at least 3.").
//! The row-list widget has no notion of indices, so every message is
//! rewritten to name the field's value label instead and the whole bag is
//! collapsed onto the field's request attribute.

use regex::{NoExpand, Regex};

use crate::error::CoreError;
use crate::types::ErrorBag;

/// Collapse `errors` into a single entry keyed by `field`.
///
/// In every message the first occurrence of `<field>.<index>` is replaced
/// with `label`. The field name is matched literally, so names containing
/// regex metacharacters are safe. Messages from all rows are kept in row
/// order; repeated messages (two rows failing the same rule) appear once.
pub fn collapse_row_errors(
    errors: &ErrorBag,
    field: &str,
    label: &str,
) -> Result<ErrorBag, CoreError> {
    let row_path = Regex::new(&format!(r"{}\.[0-9]+", regex::escape(field)))
        .map_err(|e| CoreError::Internal(format!("row path pattern for '{field}': {e}")))?;

    let mut messages: Vec<String> = Vec::new();
    for message in errors.values().flatten() {
        let remapped = row_path.replace(message, NoExpand(label)).into_owned();
        if !messages.contains(&remapped) {
            messages.push(remapped);
        }
    }

    let mut collapsed = ErrorBag::new();
    if !messages.is_empty() {
        collapsed.insert(field.to_string(), messages);
    }
    Ok(collapsed)
}
