//! The "Items" field descriptor: configuration, fill/validate/persist, and
//! the configuration snapshot consumed by the row-list widget.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::record::Record;
use crate::submission::Submission;
use crate::validation::remap::collapse_row_errors;
use crate::validation::{DefaultRuleEngine, Rule, RuleEngine, RuleSet};

/// Front-end component name the widget is registered under.
pub const COMPONENT: &str = "items";

pub const DEFAULT_VALUE_LABEL: &str = "Value";
pub const DEFAULT_ACTION_TEXT: &str = "Add item";

/// Field descriptor for a JSON array attribute edited as a list of rows.
///
/// Built once when the field registry boots and read-only afterwards. The
/// configuration methods consume and return the field so definitions read
/// as a single chain:
///
/// ```
/// use items_core::items::ItemsField;
/// use items_core::validation::Rule;
///
/// let field = ItemsField::new("Amounts")
///     .with_item_rules(vec![Rule::Numeric, Rule::Min(3.0)])
///     .with_value_label("Amount")
///     .disable_deleting_rows();
/// assert_eq!(field.attribute(), "amounts");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ItemsField {
    name: String,
    attribute: String,
    item_rules: Vec<Rule>,
    value_label: Option<String>,
    action_text: Option<String>,
    index_count_item: bool,
    can_edit_row: bool,
    can_add_row: bool,
    can_delete_row: bool,
}

impl ItemsField {
    /// A field named `name`, bound to the snake-cased form of the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let attribute = snake_case(&name);
        Self::with_attribute(name, attribute)
    }

    /// A field named `name`, bound to an explicit record attribute.
    pub fn with_attribute(name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
            item_rules: Vec::new(),
            value_label: None,
            action_text: None,
            index_count_item: true,
            can_edit_row: true,
            can_add_row: true,
            can_delete_row: true,
        }
    }

    // -- configuration -----------------------------------------------------

    /// Rules every row must satisfy. An empty list disables row validation.
    pub fn with_item_rules(mut self, rules: Vec<Rule>) -> Self {
        self.item_rules = rules;
        self
    }

    /// Label used for the value column and in row error messages.
    pub fn with_value_label(mut self, label: impl Into<String>) -> Self {
        self.value_label = Some(label.into());
        self
    }

    /// Label of the "add row" control.
    pub fn with_action_text(mut self, label: impl Into<String>) -> Self {
        self.action_text = Some(label.into());
        self
    }

    /// Show the full list of rows on index views instead of a count.
    pub fn disable_index_count_item(mut self) -> Self {
        self.index_count_item = false;
        self
    }

    pub fn disable_editing_rows(mut self) -> Self {
        self.can_edit_row = false;
        self
    }

    pub fn disable_adding_rows(mut self) -> Self {
        self.can_add_row = false;
        self
    }

    pub fn disable_deleting_rows(mut self) -> Self {
        self.can_delete_row = false;
        self
    }

    // -- accessors ---------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn item_rules(&self) -> &[Rule] {
        &self.item_rules
    }

    pub fn value_label(&self) -> Option<&str> {
        self.value_label.as_deref()
    }

    pub fn action_text(&self) -> Option<&str> {
        self.action_text.as_deref()
    }

    // -- fill --------------------------------------------------------------

    /// Fill the field's own attribute from the same-named request value.
    pub fn fill<R: Record + ?Sized>(
        &self,
        submission: &Submission,
        record: &mut R,
    ) -> Result<(), CoreError> {
        self.fill_attribute_from_request(submission, &self.attribute, record, &self.attribute)
    }

    /// Decode, validate and assign the submitted rows using the bundled
    /// rule engine. See [`ItemsField::fill_attribute_from_request_with`].
    pub fn fill_attribute_from_request<R: Record + ?Sized>(
        &self,
        submission: &Submission,
        request_attribute: &str,
        record: &mut R,
        attribute: &str,
    ) -> Result<(), CoreError> {
        self.fill_attribute_from_request_with(
            &DefaultRuleEngine,
            submission,
            request_attribute,
            record,
            attribute,
        )
    }

    /// Decode the JSON array submitted under `request_attribute`, validate
    /// it with `engine`, and assign it to `attribute` on `record`.
    ///
    /// - An absent request value leaves the record untouched.
    /// - Invalid JSON fails with [`CoreError::MalformedPayload`].
    /// - A non-array value, or rows failing the item rules, fail with
    ///   [`CoreError::SchemaViolation`] keyed by `request_attribute`.
    ///
    /// The record is only written when every check passes.
    pub fn fill_attribute_from_request_with<R: Record + ?Sized>(
        &self,
        engine: &dyn RuleEngine,
        submission: &Submission,
        request_attribute: &str,
        record: &mut R,
        attribute: &str,
    ) -> Result<(), CoreError> {
        let Some(raw) = submission.get(request_attribute) else {
            tracing::debug!(field = %request_attribute, "Items value not submitted, skipping fill");
            return Ok(());
        };

        let rows = decode_rows(request_attribute, raw)?;
        self.validate_rows(engine, request_attribute, &rows)?;

        tracing::debug!(
            field = %request_attribute,
            attribute = %attribute,
            rows = rows.as_array().map_or(0, Vec::len),
            "Filling items attribute"
        );
        record.set_attribute(attribute, rows);
        Ok(())
    }

    fn validate_rows(
        &self,
        engine: &dyn RuleEngine,
        request_attribute: &str,
        rows: &Value,
    ) -> Result<(), CoreError> {
        let mut rules = RuleSet::new();
        rules.insert(request_attribute.to_string(), vec![Rule::Array]);
        if !self.item_rules.is_empty() {
            rules.insert(format!("{request_attribute}.*"), self.item_rules.clone());
        }

        let mut context = Map::new();
        context.insert(request_attribute.to_string(), rows.clone());

        let Err(errors) = engine.validate(&context, &rules) else {
            return Ok(());
        };

        let label = self.value_label.as_deref().unwrap_or(request_attribute);
        let collapsed = collapse_row_errors(&errors, request_attribute, label)?;
        tracing::debug!(
            field = %request_attribute,
            failed_paths = errors.len(),
            "Items value failed validation"
        );
        Err(CoreError::SchemaViolation(collapsed))
    }

    // -- serialization -----------------------------------------------------

    /// Snapshot of the current configuration for the row-list widget, with
    /// unset labels resolved to their defaults.
    pub fn meta(&self) -> FieldMeta {
        FieldMeta {
            component: COMPONENT.to_string(),
            name: self.name.clone(),
            attribute: self.attribute.clone(),
            value_label: self
                .value_label
                .clone()
                .unwrap_or_else(|| DEFAULT_VALUE_LABEL.to_string()),
            action_text: self
                .action_text
                .clone()
                .unwrap_or_else(|| DEFAULT_ACTION_TEXT.to_string()),
            index_count_item: self.index_count_item,
            can_edit_row: self.can_edit_row,
            can_add_row: self.can_add_row,
            can_delete_row: self.can_delete_row,
        }
    }
}

impl Serialize for ItemsField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.meta().serialize(serializer)
    }
}

/// Serialized field configuration as consumed by the row-list widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub component: String,
    pub name: String,
    pub attribute: String,
    pub value_label: String,
    pub action_text: String,
    pub index_count_item: bool,
    pub can_edit_row: bool,
    pub can_add_row: bool,
    pub can_delete_row: bool,
}

/// Decode a submitted value into rows.
///
/// The widget sends a JSON string; clients posting native JSON may send the
/// array itself, which is taken as-is.
fn decode_rows(request_attribute: &str, raw: &Value) -> Result<Value, CoreError> {
    match raw {
        Value::String(encoded) => {
            serde_json::from_str(encoded).map_err(|e| CoreError::MalformedPayload {
                field: request_attribute.to_string(),
                reason: e.to_string(),
            })
        }
        other => Ok(other.clone()),
    }
}

/// `"Line Items"` -> `"line_items"`.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if ch.is_uppercase() && prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = ch.is_lowercase() || ch.is_numeric();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorBag;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn record_with(attribute: &str, value: Value) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert(attribute.to_string(), value);
        record
    }

    #[test]
    fn attribute_is_derived_from_name() {
        assert_eq!(ItemsField::new("Line Items").attribute(), "line_items");
        assert_eq!(ItemsField::new("lineItems").attribute(), "line_items");
        assert_eq!(ItemsField::new("Tags").attribute(), "tags");
        assert_eq!(ItemsField::with_attribute("Tags", "labels").attribute(), "labels");
    }

    #[test]
    fn absent_request_value_is_a_no_op() {
        let field = ItemsField::new("Items").with_item_rules(vec![Rule::Required]);
        let mut record = record_with("items", json!(["kept"]));

        field
            .fill_attribute_from_request(&Submission::new(), "items", &mut record, "items")
            .unwrap();

        assert_eq!(record["items"], json!(["kept"]));
    }

    #[test]
    fn rows_round_trip_in_order_without_rules() {
        let rows = json!([
            {"key": "b", "value": 2},
            {"key": "a", "value": 1},
            "plain",
            3,
            null,
        ]);
        let submission = Submission::new().with("items", rows.to_string());
        let mut record = Map::new();

        ItemsField::new("Items").fill(&submission, &mut record).unwrap();

        assert_eq!(record["items"], rows);
    }

    #[test]
    fn empty_rules_skip_row_validation() {
        let submission = Submission::new().with("items", r#"[null, "", {"bad": []}]"#);
        let mut record = Map::new();

        ItemsField::new("Items").fill(&submission, &mut record).unwrap();

        assert_eq!(record["items"], json!([null, "", {"bad": []}]));
    }

    #[test]
    fn native_array_values_are_accepted() {
        let submission = Submission::new().with("items", json!([1, 2]));
        let mut record = Map::new();

        ItemsField::new("Items").fill(&submission, &mut record).unwrap();

        assert_eq!(record["items"], json!([1, 2]));
    }

    #[test]
    fn request_and_record_attributes_may_differ() {
        let submission = Submission::new().with("form_rows", "[1]");
        let mut record = Map::new();

        ItemsField::new("Items")
            .fill_attribute_from_request(&submission, "form_rows", &mut record, "rows")
            .unwrap();

        assert_eq!(record["rows"], json!([1]));
        assert!(!record.contains_key("form_rows"));
    }

    #[test]
    fn malformed_json_is_rejected_before_validation() {
        let field = ItemsField::new("Items");
        let mut record = record_with("items", json!([1]));

        for payload in ["[1, 2", "", "not json"] {
            let submission = Submission::new().with("items", payload);
            let err = field.fill(&submission, &mut record).unwrap_err();
            assert_matches!(err, CoreError::MalformedPayload { ref field, .. } if field == "items");
        }
        assert_eq!(record["items"], json!([1]));
    }

    #[test]
    fn non_array_values_are_rejected_even_without_rules() {
        let field = ItemsField::new("Items");
        let mut record = record_with("items", json!([1]));

        for payload in [json!(r#"{"a": 1}"#), json!("5"), Value::Null] {
            let submission = Submission::new().with("items", payload);
            let err = field.fill(&submission, &mut record).unwrap_err();
            let errors = err.errors().expect("schema violation");
            assert_eq!(errors["items"], vec!["The items field must be an array."]);
        }
        assert_eq!(record["items"], json!([1]));
    }

    #[test]
    fn failing_rows_are_remapped_to_the_value_label() {
        let field = ItemsField::new("Items")
            .with_item_rules(vec![Rule::Min(3.0)])
            .with_value_label("Amount");
        let submission = Submission::new().with("items", "[5, 1]");
        let mut record = Map::new();

        let err = field.fill(&submission, &mut record).unwrap_err();

        let errors = err.errors().expect("schema violation");
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["items"]);
        let messages = &errors["items"];
        assert!(messages.iter().any(|m| m.contains("Amount")));
        assert!(messages.iter().all(|m| !m.contains(".0") && !m.contains(".1")));
        assert!(!record.contains_key("items"));
    }

    #[test]
    fn failing_rows_fall_back_to_the_field_name() {
        let field = ItemsField::new("Items").with_item_rules(vec![Rule::Numeric]);
        let submission = Submission::new().with("items", r#"[1, "x"]"#);
        let mut record = Map::new();

        let err = field.fill(&submission, &mut record).unwrap_err();

        assert_eq!(
            err.errors().unwrap()["items"],
            vec!["The items field must be a number."]
        );
    }

    #[test]
    fn errors_from_every_failing_row_are_kept() {
        let field = ItemsField::new("Items")
            .with_item_rules(vec![Rule::Numeric, Rule::Max(10.0)])
            .with_value_label("Amount");
        let submission = Submission::new().with("items", r#"["x", 5, 50]"#);
        let mut record = Map::new();

        let err = field.fill(&submission, &mut record).unwrap_err();

        assert_eq!(
            err.errors().unwrap()["items"],
            vec![
                "The Amount field must be a number.",
                "The Amount field must not be greater than 10.",
            ]
        );
    }

    #[test]
    fn failed_validation_leaves_existing_value_untouched() {
        let field = ItemsField::new("Items").with_item_rules(vec![Rule::Integer]);
        let original = json!([1, 2, 3]);
        let mut record = record_with("items", original.clone());

        let submission = Submission::new().with("items", "[1.5]");
        assert_matches!(
            field.fill(&submission, &mut record),
            Err(CoreError::SchemaViolation(_))
        );

        assert_eq!(record["items"], original);
    }

    #[test]
    fn dotted_attributes_are_still_validated() {
        let field = ItemsField::with_attribute("Line Items", "line.items")
            .with_item_rules(vec![Rule::Min(3.0)])
            .with_value_label("Amount");
        let submission = Submission::new().with("line.items", "[5, 1]");
        let mut record = Map::new();

        let err = field.fill(&submission, &mut record).unwrap_err();

        assert_eq!(
            err.errors().unwrap()["line.items"],
            vec!["The Amount field must be at least 3."]
        );
        assert!(record.is_empty());
    }

    #[test]
    fn dotted_attributes_must_hold_arrays() {
        let field = ItemsField::with_attribute("Line Items", "line.items");
        let submission = Submission::new().with("line.items", r#"{"a": 1}"#);
        let mut record = Map::new();

        assert_matches!(
            field.fill(&submission, &mut record),
            Err(CoreError::SchemaViolation(_))
        );
        assert!(record.is_empty());
    }

    #[test]
    fn custom_engines_are_consulted() {
        struct RejectAll;
        impl RuleEngine for RejectAll {
            fn validate(&self, _: &Map<String, Value>, rules: &RuleSet) -> Result<(), ErrorBag> {
                let mut errors = ErrorBag::new();
                for path in rules.keys() {
                    let concrete = path.replace('*', "0");
                    errors.insert(concrete.clone(), vec![format!("{concrete} rejected")]);
                }
                Err(errors)
            }
        }

        let field = ItemsField::new("Items").with_value_label("Row");
        let submission = Submission::new().with("items", "[1]");
        let mut record = Map::new();

        let err = field
            .fill_attribute_from_request_with(&RejectAll, &submission, "items", &mut record, "items")
            .unwrap_err();

        assert_eq!(err.errors().unwrap()["items"], vec!["items rejected"]);
        assert!(record.is_empty());
    }

    #[test]
    fn meta_resolves_default_labels() {
        let meta = ItemsField::new("Items").meta();
        assert_eq!(meta.value_label, "Value");
        assert_eq!(meta.action_text, "Add item");
        assert_eq!(meta.component, "items");
    }

    #[test]
    fn capability_flags_default_to_true() {
        let json = serde_json::to_value(ItemsField::new("Items")).unwrap();
        assert_eq!(json["indexCountItem"], true);
        assert_eq!(json["canEditRow"], true);
        assert_eq!(json["canAddRow"], true);
        assert_eq!(json["canDeleteRow"], true);
    }

    #[test]
    fn disabled_flags_stay_disabled() {
        let field = ItemsField::new("Items")
            .disable_index_count_item()
            .disable_editing_rows()
            .disable_adding_rows()
            .disable_deleting_rows()
            .with_value_label("Amount")
            .with_action_text("Add amount")
            .with_item_rules(vec![Rule::Numeric]);

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            json!({
                "component": "items",
                "name": "Items",
                "attribute": "items",
                "valueLabel": "Amount",
                "actionText": "Add amount",
                "indexCountItem": false,
                "canEditRow": false,
                "canAddRow": false,
                "canDeleteRow": false,
            })
        );
    }

    #[test]
    fn meta_reflects_configuration_at_call_time() {
        let field = ItemsField::new("Items");
        assert_eq!(field.meta().value_label, "Value");
        let field = field.with_value_label("Amount");
        assert_eq!(field.meta().value_label, "Amount");
    }
}
