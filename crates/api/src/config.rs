use std::path::PathBuf;

use items_core::error::CoreError;
use items_core::items::ItemsField;
use items_core::registry::FieldRegistry;
use items_core::validation::Rule;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JSON file of field definitions. When unset the built-in fields are used.
    pub fields_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `ITEMS_FIELDS_PATH`    | unset                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let fields_path = std::env::var("ITEMS_FIELDS_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            fields_path,
        }
    }

    /// Boot the field registry from `fields_path`, or the built-in fields.
    pub fn load_registry(&self) -> Result<FieldRegistry, CoreError> {
        match &self.fields_path {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    CoreError::Configuration(format!("reading {}: {e}", path.display()))
                })?;
                FieldRegistry::from_json_str(&json)
            }
            None => default_registry(),
        }
    }
}

/// Fields registered when no definition file is configured.
pub fn default_registry() -> Result<FieldRegistry, CoreError> {
    let mut registry = FieldRegistry::new();
    registry.register(
        ItemsField::new("Tags")
            .with_value_label("Tag")
            .with_action_text("Add tag")
            .with_item_rules(vec![Rule::String, Rule::Distinct])
            .disable_index_count_item(),
    )?;
    registry.register(
        ItemsField::new("Amounts")
            .with_item_rules(vec![Rule::Required, Rule::Numeric, Rule::Min(3.0)])
            .with_value_label("Amount"),
    )?;
    registry.register(ItemsField::new("Notes").disable_editing_rows())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_registry_boots() {
        let registry = default_registry().unwrap();
        let attributes: Vec<&str> = registry.iter().map(ItemsField::attribute).collect();
        assert_eq!(attributes, vec!["tags", "amounts", "notes"]);
    }

    #[test]
    fn missing_definition_file_is_a_configuration_error() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
            fields_path: Some(PathBuf::from("/nonexistent/items-fields.json")),
        };
        assert_matches!(config.load_registry(), Err(CoreError::Configuration(_)));
    }
}
