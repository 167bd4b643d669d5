//! Rule evaluator: pure logic over a plain key/value context.

use regex::Regex;
use serde_json::{Map, Value};

use super::rules::{Rule, RuleSet};
use crate::types::ErrorBag;

/// A pluggable rule-evaluation backend.
///
/// `context` is the data under validation; `rules` maps dotted path patterns
/// (`*` matches every index of an array or key of an object) to the rules
/// applied at each matched path. Failures are reported as messages keyed by
/// the concrete matched path, e.g. `items.2`.
pub trait RuleEngine {
    fn validate(&self, context: &Map<String, Value>, rules: &RuleSet) -> Result<(), ErrorBag>;
}

/// The bundled rule engine backed by [`evaluate_rules`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRuleEngine;

impl RuleEngine for DefaultRuleEngine {
    fn validate(&self, context: &Map<String, Value>, rules: &RuleSet) -> Result<(), ErrorBag> {
        let errors = evaluate_rules(rules, context);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A concrete path matched by a pattern, with the value found there.
type PathMatch<'a> = (String, Option<&'a Value>);

/// Evaluate every rule set entry against `data`.
///
/// Paths appear in the result in rule-set order, then match order; messages
/// for one path appear in rule order.
pub fn evaluate_rules(rules: &RuleSet, data: &Map<String, Value>) -> ErrorBag {
    let mut errors = ErrorBag::new();

    for (pattern, path_rules) in rules {
        let matches = expand_path(data, pattern);
        for (index, (path, value)) in matches.iter().enumerate() {
            let messages = evaluate_value(path, *value, path_rules, &matches, index);
            if !messages.is_empty() {
                errors.entry(path.clone()).or_default().extend(messages);
            }
        }
    }

    errors
}

fn expand_path<'a>(data: &'a Map<String, Value>, pattern: &str) -> Vec<PathMatch<'a>> {
    let segments: Vec<&str> = pattern.split('.').collect();

    // Context keys may contain dots themselves; the longest literal prefix
    // naming a key wins over descending segment by segment.
    let literal = segments
        .iter()
        .position(|s| *s == "*")
        .unwrap_or(segments.len());
    let root = (1..=literal).rev().find_map(|len| {
        let key = segments[..len].join(".");
        data.get(&key).map(|value| ((key, Some(value)), len))
    });

    let (mut current, consumed): (Vec<PathMatch<'a>>, usize) = match root {
        Some((found, len)) => (vec![found], len),
        None => match segments[0] {
            "*" => (data.iter().map(|(k, v)| (k.clone(), Some(v))).collect(), 1),
            key => (vec![(key.to_string(), data.get(key))], 1),
        },
    };

    for segment in &segments[consumed..] {
        current = current
            .into_iter()
            .flat_map(|(path, value)| descend(path, value, segment))
            .collect();
    }

    current
}

fn descend<'a>(path: String, value: Option<&'a Value>, segment: &str) -> Vec<PathMatch<'a>> {
    match (segment, value) {
        ("*", Some(Value::Array(items))) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (format!("{path}.{i}"), Some(item)))
            .collect(),
        ("*", Some(Value::Object(map))) => map
            .iter()
            .map(|(k, v)| (format!("{path}.{k}"), Some(v)))
            .collect(),
        ("*", _) => Vec::new(),
        (key, Some(Value::Object(map))) => vec![(format!("{path}.{key}"), map.get(key))],
        (key, Some(Value::Array(items))) => {
            let item = key.parse::<usize>().ok().and_then(|i| items.get(i));
            vec![(format!("{path}.{key}"), item)]
        }
        (key, _) => vec![(format!("{path}.{key}"), None)],
    }
}

fn evaluate_value(
    path: &str,
    value: Option<&Value>,
    rules: &[Rule],
    siblings: &[PathMatch<'_>],
    index: usize,
) -> Vec<String> {
    let mut messages = Vec::new();

    if rules.contains(&Rule::Required) && is_blank(value) {
        messages.push(format!("The {path} field is required."));
    }

    let value = match value {
        None => return messages,
        Some(Value::Null) if rules.contains(&Rule::Nullable) => return messages,
        Some(v) => v,
    };

    let numeric_context = rules
        .iter()
        .any(|r| matches!(r, Rule::Numeric | Rule::Integer));

    for rule in rules {
        let failed = match rule {
            Rule::Required | Rule::Nullable => false,
            Rule::Array => !value.is_array(),
            Rule::String => !value.is_string(),
            Rule::Numeric => !is_numeric(value),
            Rule::Integer => !is_integer(value),
            Rule::Boolean => !is_boolean_like(value),
            Rule::Min(bound) => size_of(value, numeric_context).is_some_and(|s| s.value() < *bound),
            Rule::Max(bound) => size_of(value, numeric_context).is_some_and(|s| s.value() > *bound),
            Rule::In(allowed) => !value.is_null() && !scalar_token(value).is_some_and(|t| allowed.contains(&t)),
            Rule::Regex(pattern) => !value.is_null() && !matches_pattern(pattern, value),
            Rule::Distinct => siblings
                .iter()
                .enumerate()
                .any(|(i, (_, other))| i != index && *other == Some(value)),
        };

        if failed {
            messages.push(failure_message(rule, path, value, numeric_context));
        }
    }

    messages
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        _ => false,
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_boolean_like(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => n.as_u64().is_some_and(|n| n <= 1),
        Value::String(s) => matches!(s.as_str(), "0" | "1" | "true" | "false"),
        _ => false,
    }
}

/// The size a `min`/`max` rule compares against.
#[derive(Debug, Clone, Copy)]
enum Size {
    Number(f64),
    Chars(usize),
    Items(usize),
}

impl Size {
    fn value(self) -> f64 {
        match self {
            Self::Number(n) => n,
            Self::Chars(n) | Self::Items(n) => n as f64,
        }
    }
}

fn size_of(value: &Value, numeric_context: bool) -> Option<Size> {
    match value {
        Value::Number(n) => n.as_f64().map(Size::Number),
        // Under a numeric rule a non-numeric string has no size; the numeric
        // rule already reports it.
        Value::String(s) if numeric_context => s.trim().parse::<f64>().ok().map(Size::Number),
        Value::String(s) => Some(Size::Chars(s.chars().count())),
        Value::Array(items) => Some(Size::Items(items.len())),
        Value::Object(map) => Some(Size::Items(map.len())),
        Value::Null | Value::Bool(_) => None,
    }
}

fn scalar_token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches_pattern(pattern: &str, value: &Value) -> bool {
    let Some(text) = scalar_token(value).filter(|_| !value.is_boolean()) else {
        return false;
    };
    match Regex::new(pattern) {
        Ok(re) => re.is_match(&text),
        Err(err) => {
            // An unusable pattern never blocks a submission.
            tracing::warn!(%pattern, error = %err, "Ignoring invalid regex validation rule");
            true
        }
    }
}

fn failure_message(rule: &Rule, path: &str, value: &Value, numeric_context: bool) -> String {
    let size = size_of(value, numeric_context);
    match rule {
        Rule::Required => format!("The {path} field is required."),
        Rule::Nullable => String::new(),
        Rule::Array => format!("The {path} field must be an array."),
        Rule::String => format!("The {path} field must be a string."),
        Rule::Numeric => format!("The {path} field must be a number."),
        Rule::Integer => format!("The {path} field must be an integer."),
        Rule::Boolean => format!("The {path} field must be true or false."),
        Rule::Min(bound) => match size {
            Some(Size::Chars(_)) => format!("The {path} field must be at least {bound} characters."),
            Some(Size::Items(_)) => format!("The {path} field must have at least {bound} items."),
            _ => format!("The {path} field must be at least {bound}."),
        },
        Rule::Max(bound) => match size {
            Some(Size::Chars(_)) => {
                format!("The {path} field must not be greater than {bound} characters.")
            }
            Some(Size::Items(_)) => format!("The {path} field must not have more than {bound} items."),
            _ => format!("The {path} field must not be greater than {bound}."),
        },
        Rule::In(_) => format!("The selected {path} is invalid."),
        Rule::Regex(_) => format!("The {path} field format is invalid."),
        Rule::Distinct => format!("The {path} field has a duplicate value."),
    }
}
