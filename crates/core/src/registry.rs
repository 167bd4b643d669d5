//! Field registry: the set of items fields a host boots with.
//!
//! Fields are declared either in code with the [`ItemsField`] builder or in
//! a JSON definition file, and are immutable once registered.

use indexmap::IndexMap;
use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;
use crate::items::ItemsField;
use crate::record::Record;
use crate::submission::Submission;
use crate::types::ErrorBag;
use crate::validation::Rule;

/// One field as written in a definition file.
///
/// ```json
/// {
///   "name": "Amounts",
///   "itemRules": ["numeric", {"min": 3}],
///   "valueLabel": "Amount",
///   "canDeleteRow": false
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDefinition {
    #[validate(length(min = 1, message = "field name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "attribute must not be empty"))]
    pub attribute: Option<String>,
    #[serde(default)]
    pub item_rules: Vec<Rule>,
    pub value_label: Option<String>,
    pub action_text: Option<String>,
    #[serde(default = "enabled")]
    pub index_count_item: bool,
    #[serde(default = "enabled")]
    pub can_edit_row: bool,
    #[serde(default = "enabled")]
    pub can_add_row: bool,
    #[serde(default = "enabled")]
    pub can_delete_row: bool,
}

fn enabled() -> bool {
    true
}

impl FieldDefinition {
    /// Check the definition and build the field it describes.
    pub fn build(&self) -> Result<ItemsField, CoreError> {
        self.validate().map_err(|e| {
            CoreError::Configuration(format!("field '{}': {e}", self.name))
        })?;

        let mut field = match &self.attribute {
            Some(attribute) => ItemsField::with_attribute(&self.name, attribute),
            None => ItemsField::new(&self.name),
        }
        .with_item_rules(self.item_rules.clone());

        if field.attribute().is_empty() {
            return Err(CoreError::Configuration(format!(
                "field '{}': no attribute can be derived from the name, set one explicitly",
                self.name
            )));
        }

        if let Some(label) = &self.value_label {
            field = field.with_value_label(label);
        }
        if let Some(text) = &self.action_text {
            field = field.with_action_text(text);
        }
        if !self.index_count_item {
            field = field.disable_index_count_item();
        }
        if !self.can_edit_row {
            field = field.disable_editing_rows();
        }
        if !self.can_add_row {
            field = field.disable_adding_rows();
        }
        if !self.can_delete_row {
            field = field.disable_deleting_rows();
        }
        Ok(field)
    }
}

/// Registered fields keyed by record attribute, in registration order.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: IndexMap<String, ItemsField>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field. Two fields may not bind the same attribute.
    pub fn register(&mut self, field: ItemsField) -> Result<(), CoreError> {
        if field.attribute().is_empty() {
            return Err(CoreError::Configuration(format!(
                "field '{}' does not bind a record attribute",
                field.name()
            )));
        }
        if self.fields.contains_key(field.attribute()) {
            return Err(CoreError::Configuration(format!(
                "attribute '{}' is already bound to a field",
                field.attribute()
            )));
        }
        tracing::debug!(name = %field.name(), attribute = %field.attribute(), "Registered items field");
        self.fields.insert(field.attribute().to_string(), field);
        Ok(())
    }

    pub fn from_definitions(definitions: &[FieldDefinition]) -> Result<Self, CoreError> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition.build()?)?;
        }
        Ok(registry)
    }

    /// Parse a JSON array of [`FieldDefinition`]s.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let definitions: Vec<FieldDefinition> = serde_json::from_str(json)
            .map_err(|e| CoreError::Configuration(format!("field definitions: {e}")))?;
        Self::from_definitions(&definitions)
    }

    pub fn get(&self, attribute: &str) -> Option<&ItemsField> {
        self.fields.get(attribute)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemsField> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fill every registered field from `submission` into `record`.
    ///
    /// All fields are checked before anything is written: validation errors
    /// from every failing field are merged into one
    /// [`CoreError::SchemaViolation`] and the record is left untouched. A
    /// malformed payload aborts immediately.
    pub fn fill_all<R: Record + ?Sized>(
        &self,
        submission: &Submission,
        record: &mut R,
    ) -> Result<(), CoreError> {
        let mut staged = serde_json::Map::new();
        let mut errors = ErrorBag::new();

        for field in self.fields.values() {
            match field.fill(submission, &mut staged) {
                Ok(()) => {}
                Err(CoreError::SchemaViolation(bag)) => errors.extend(bag),
                Err(other) => return Err(other),
            }
        }

        if !errors.is_empty() {
            return Err(CoreError::SchemaViolation(errors));
        }

        for (attribute, value) in staged {
            record.set_attribute(&attribute, value);
        }
        Ok(())
    }
}
