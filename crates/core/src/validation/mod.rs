//! Row validation engine.
//!
//! Provides the rule vocabulary, a pure-logic evaluator over a plain
//! key/value context, and the row-path remapping applied to its errors, all
//! without any request or storage dependencies.

pub mod evaluator;
pub mod remap;
pub mod rules;

pub use evaluator::{DefaultRuleEngine, RuleEngine};
pub use rules::{Rule, RuleParseError, RuleSet};
