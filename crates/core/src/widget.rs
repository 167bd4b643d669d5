//! View projections for the row-list widget.
//!
//! The widget itself lives in the front end. This module computes what each
//! of its three registered components is given to render, so capability
//! flags are enforced the same way whichever client draws the list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::items::FieldMeta;

/// The three contexts the widget is registered under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Index,
    #[default]
    Detail,
    Form,
}

impl DisplayMode {
    /// Registered component name, e.g. `form-items`.
    pub fn component(self, base: &str) -> String {
        let prefix = match self {
            Self::Index => "index",
            Self::Detail => "detail",
            Self::Form => "form",
        };
        format!("{prefix}-{base}")
    }
}

/// Per-row controls offered in form mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableRow {
    pub index: usize,
    pub value: Value,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetBody {
    /// Index badge showing how many rows the attribute holds.
    Count { count: usize },
    /// Read-only ordered rows.
    List { heading: String, rows: Vec<Value> },
    /// Editable ordered rows.
    Editor {
        heading: String,
        rows: Vec<EditableRow>,
        /// Present only when rows may be added.
        #[serde(skip_serializing_if = "Option::is_none")]
        add_action: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetView {
    pub component: String,
    pub field: FieldMeta,
    pub body: WidgetBody,
}

/// Build the view a widget component receives for `value` in `mode`.
///
/// A missing or `null` value renders as an empty list.
pub fn render_view(meta: &FieldMeta, value: Option<&Value>, mode: DisplayMode) -> WidgetView {
    let rows = rows_of(&meta.attribute, value);

    let body = match mode {
        DisplayMode::Index if meta.index_count_item => WidgetBody::Count { count: rows.len() },
        DisplayMode::Index | DisplayMode::Detail => WidgetBody::List {
            heading: meta.value_label.clone(),
            rows,
        },
        DisplayMode::Form => {
            let mut actions = Vec::new();
            if meta.can_edit_row {
                actions.push(RowAction::Edit);
            }
            if meta.can_delete_row {
                actions.push(RowAction::Delete);
            }
            WidgetBody::Editor {
                heading: meta.value_label.clone(),
                rows: rows
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| EditableRow {
                        index,
                        value,
                        actions: actions.clone(),
                    })
                    .collect(),
                add_action: meta.can_add_row.then(|| meta.action_text.clone()),
            }
        }
    };

    WidgetView {
        component: mode.component(&meta.component),
        field: meta.clone(),
        body,
    }
}

/// Encode rows the way the form component submits them: a JSON string
/// placed under the field's request attribute, rows in display order.
pub fn encode_rows(rows: &[Value]) -> Result<String, CoreError> {
    serde_json::to_string(rows).map_err(|e| CoreError::Internal(format!("encode rows: {e}")))
}

fn rows_of(attribute: &str, value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(rows)) => rows.clone(),
        Some(other) => {
            tracing::warn!(%attribute, kind = json_kind(other), "Items attribute is not an array");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
