//! Validation rule types.
//!
//! Rules are written the way admin-panel field definitions usually spell
//! them: `"required"`, `"numeric"`, `"min:3"`, `"in:draft,live"`. In JSON
//! configuration they may also appear in keyed form, e.g. `{"min": 3}` or
//! `{"in": ["draft", "live"]}`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Mapping from dotted path patterns (`items`, `items.*`) to the rules that
/// apply to every value the pattern matches.
pub type RuleSet = indexmap::IndexMap<String, Vec<Rule>>;

/// A single validation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    /// A `null` value skips every other rule on the same path.
    Nullable,
    Array,
    String,
    Numeric,
    Integer,
    Boolean,
    /// Lower bound on the value's size (number, string length, item count).
    Min(f64),
    /// Upper bound on the value's size (number, string length, item count).
    Max(f64),
    In(Vec<String>),
    Regex(String),
    /// No other value matched by the same wildcard path may be equal.
    Distinct,
}

impl Rule {
    /// The rule's name as it appears in its string form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Nullable => "nullable",
            Self::Array => "array",
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::In(_) => "in",
            Self::Regex(_) => "regex",
            Self::Distinct => "distinct",
        }
    }

    fn from_parts(name: &str, param: Option<&str>) -> Result<Self, RuleParseError> {
        let require_param = || {
            param
                .filter(|p| !p.is_empty())
                .ok_or_else(|| RuleParseError::MissingParameter(name.to_string()))
        };
        let number = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| RuleParseError::InvalidParameter {
                    rule: name.to_string(),
                    value: raw.to_string(),
                })
        };

        let rule = match name {
            "required" => Self::Required,
            "nullable" => Self::Nullable,
            "array" => Self::Array,
            "string" => Self::String,
            "numeric" => Self::Numeric,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "distinct" => Self::Distinct,
            "min" => Self::Min(number(require_param()?)?),
            "max" => Self::Max(number(require_param()?)?),
            "in" => Self::In(
                require_param()?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            ),
            "regex" => Self::Regex(strip_delimiters(require_param()?).to_string()),
            other => return Err(RuleParseError::UnknownRule(other.to_string())),
        };
        Ok(rule)
    }
}

/// Accept both `/^a+$/` and `^a+$` spellings of a pattern.
fn strip_delimiters(pattern: &str) -> &str {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        &pattern[1..pattern.len() - 1]
    } else {
        pattern
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleParseError {
    #[error("unknown validation rule '{0}'")]
    UnknownRule(String),

    #[error("validation rule '{0}' requires a parameter")]
    MissingParameter(String),

    #[error("invalid parameter '{value}' for validation rule '{rule}'")]
    InvalidParameter { rule: String, value: String },
}

impl FromStr for Rule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some((name, param)) => Self::from_parts(name.trim(), Some(param)),
            None => Self::from_parts(s.trim(), None),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min(n) | Self::Max(n) => write!(f, "{}:{n}", self.name()),
            Self::In(values) => write!(f, "in:{}", values.join(",")),
            Self::Regex(pattern) => write!(f, "regex:/{pattern}/"),
            other => f.write_str(other.name()),
        }
    }
}

impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Keyed(serde_json::Map<String, Value>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(de::Error::custom),
            Repr::Keyed(map) => {
                let mut entries = map.into_iter();
                let (name, param) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(de::Error::custom(
                            "keyed validation rule must have exactly one key",
                        ))
                    }
                };
                let param = keyed_param(&param).map_err(de::Error::custom)?;
                Self::from_parts(&name, param.as_deref()).map_err(de::Error::custom)
            }
        }
    }
}

/// Flatten the value side of a keyed rule into its string parameter.
///
/// `true` / `null` mean "no parameter" so that `{"required": true}` works.
fn keyed_param(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null | Value::Bool(true) => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                other => Err(format!("unsupported list entry {other}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| Some(parts.join(","))),
        other => Err(format!("unsupported rule parameter {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn parses_flag_rules() {
        assert_eq!("required".parse::<Rule>().unwrap(), Rule::Required);
        assert_eq!(" numeric ".parse::<Rule>().unwrap(), Rule::Numeric);
        assert_eq!("distinct".parse::<Rule>().unwrap(), Rule::Distinct);
    }

    #[test]
    fn parses_parameterised_rules() {
        assert_eq!("min:3".parse::<Rule>().unwrap(), Rule::Min(3.0));
        assert_eq!("max:2.5".parse::<Rule>().unwrap(), Rule::Max(2.5));
        assert_eq!(
            "in:draft, live".parse::<Rule>().unwrap(),
            Rule::In(vec!["draft".to_string(), "live".to_string()])
        );
        assert_eq!(
            "regex:/^[a-z]+$/".parse::<Rule>().unwrap(),
            Rule::Regex("^[a-z]+$".to_string())
        );
    }

    #[test]
    fn regex_parameter_may_contain_colons() {
        assert_eq!(
            "regex:^\\d{2}:\\d{2}$".parse::<Rule>().unwrap(),
            Rule::Regex("^\\d{2}:\\d{2}$".to_string())
        );
    }

    #[test]
    fn rejects_unknown_and_incomplete_rules() {
        assert_matches!("uuid".parse::<Rule>(), Err(RuleParseError::UnknownRule(_)));
        assert_matches!("min".parse::<Rule>(), Err(RuleParseError::MissingParameter(_)));
        assert_matches!(
            "max:lots".parse::<Rule>(),
            Err(RuleParseError::InvalidParameter { .. })
        );
    }

    #[test]
    fn display_matches_string_form() {
        assert_eq!(Rule::Min(3.0).to_string(), "min:3");
        assert_eq!(Rule::Max(0.5).to_string(), "max:0.5");
        assert_eq!(Rule::Regex("^a$".into()).to_string(), "regex:/^a$/");
        assert_eq!(
            Rule::In(vec!["a".into(), "b".into()]).to_string(),
            "in:a,b"
        );
    }

    #[test]
    fn deserializes_string_and_keyed_forms() {
        let rules: Vec<Rule> = serde_json::from_value(json!([
            "required",
            {"min": 3},
            {"in": ["a", 2]},
            {"nullable": true},
        ]))
        .unwrap();
        assert_eq!(
            rules,
            vec![
                Rule::Required,
                Rule::Min(3.0),
                Rule::In(vec!["a".into(), "2".into()]),
                Rule::Nullable,
            ]
        );
    }

    #[test]
    fn keyed_form_requires_single_key() {
        let result: Result<Rule, _> = serde_json::from_value(json!({"min": 1, "max": 2}));
        assert!(result.is_err());
    }

    #[test]
    fn serializes_to_string_form() {
        let json = serde_json::to_value(vec![Rule::Numeric, Rule::Min(3.0)]).unwrap();
        assert_eq!(json, json!(["numeric", "min:3"]));
    }
}
