//! Predicate condition evaluation.
//!
//! A predicate route is selected by evaluating a list of
//! key/operator/value conditions against the request's query-state bag
//! rather than by path shape. Conditions AND together and evaluation
//! fails fast on the first unsatisfied one, so condition ordering matters
//! for performance but never for correctness.
use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Special condition key that compares against the raw request path
/// instead of the query-state bag.
pub const REQUEST_PATH_KEY: &str = "request";

/// Errors raised while evaluating predicate conditions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PredicateError {
    /// The condition carries an operator token this engine does not know.
    /// This is a configuration-time bug, not a runtime condition to
    /// tolerate silently.
    #[error("operator '{0}' is not supported")]
    UnsupportedOperator(String),

    /// A `like` / `!like` condition value is not a valid regex.
    #[error("invalid regex '{pattern}' in '{operator}' condition: {source}")]
    InvalidConditionRegex {
        operator: String,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Result type for predicate evaluation.
pub type PredicateResult<T> = Result<T, PredicateError>;

/// A single key/operator/value condition.
///
/// The operator is held as its raw wire token and parsed at evaluation
/// time, so declaratively configured conditions and fluently built ones
/// share one code path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(key: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            operator: operator.into(),
            value,
        }
    }
}

/// The closed set of supported condition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Like,
    NotLike,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
}

impl Operator {
    /// Parse a wire token into an operator.
    pub fn parse(token: &str) -> PredicateResult<Self> {
        match token {
            "=" => Ok(Self::Equals),
            "!=" => Ok(Self::NotEquals),
            "in" => Ok(Self::In),
            "!in" => Ok(Self::NotIn),
            "like" => Ok(Self::Like),
            "!like" => Ok(Self::NotLike),
            "contains" => Ok(Self::Contains),
            "!contains" => Ok(Self::NotContains),
            "starts" => Ok(Self::StartsWith),
            "!starts" => Ok(Self::NotStartsWith),
            "ends" => Ok(Self::EndsWith),
            "!ends" => Ok(Self::NotEndsWith),
            other => Err(PredicateError::UnsupportedOperator(other.to_string())),
        }
    }

    /// The wire token for this operator.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::In => "in",
            Self::NotIn => "!in",
            Self::Like => "like",
            Self::NotLike => "!like",
            Self::Contains => "contains",
            Self::NotContains => "!contains",
            Self::StartsWith => "starts",
            Self::NotStartsWith => "!starts",
            Self::EndsWith => "ends",
            Self::NotEndsWith => "!ends",
        }
    }
}

/// Evaluate a condition list against a request path and query-state bag.
///
/// Conditions are a logical AND; the first unsatisfied one short-circuits
/// the rest. String values read from the bag are percent-decoded before
/// comparison.
pub fn is_satisfied(
    conditions: &[Condition],
    request_path: &str,
    data: &BTreeMap<String, Value>,
) -> PredicateResult<bool> {
    for condition in conditions {
        let operator = Operator::parse(&condition.operator)?;

        let actual = if condition.key == REQUEST_PATH_KEY {
            Value::String(request_path.to_string())
        } else {
            decoded(data.get(&condition.key))
        };

        if !evaluate(&actual, operator, &condition.value)? {
            return Ok(false);
        }
    }

    Ok(true)
}

fn decoded(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(s)) => match urlencoding::decode(s) {
            Ok(decoded) => Value::String(decoded.into_owned()),
            Err(_) => Value::String(s.clone()),
        },
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

fn evaluate(actual: &Value, operator: Operator, expected: &Value) -> PredicateResult<bool> {
    Ok(match operator {
        Operator::Equals => loose_eq(actual, expected),
        Operator::NotEquals => !loose_eq(actual, expected),
        Operator::In => in_set(actual, expected),
        Operator::NotIn => !in_set(actual, expected),
        Operator::Like => regex_match(actual, expected, Operator::Like)?,
        Operator::NotLike => !regex_match(actual, expected, Operator::NotLike)?,
        Operator::Contains => string_op(actual, expected, |a, e| a.contains(e)),
        Operator::NotContains => !string_op(actual, expected, |a, e| a.contains(e)),
        Operator::StartsWith => string_op(actual, expected, |a, e| a.starts_with(e)),
        Operator::NotStartsWith => !string_op(actual, expected, |a, e| a.starts_with(e)),
        Operator::EndsWith => string_op(actual, expected, |a, e| a.ends_with(e)),
        Operator::NotEndsWith => !string_op(actual, expected, |a, e| a.ends_with(e)),
    })
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Equality after a single numeric coercion: when the actual side looks
/// numeric, both sides compare as integers; otherwise as plain values.
fn loose_eq(actual: &Value, expected: &Value) -> bool {
    if let Some(a) = coerce_int(actual)
        && let Some(e) = coerce_int(expected)
    {
        return a == e;
    }
    match (actual, expected) {
        (Value::String(a), Value::String(e)) => a == e,
        _ => actual == expected,
    }
}

fn in_set(actual: &Value, expected: &Value) -> bool {
    match expected {
        Value::Array(items) => items.iter().any(|item| loose_eq(actual, item)),
        single => loose_eq(actual, single),
    }
}

fn as_comparable_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_op(actual: &Value, expected: &Value, op: impl Fn(&str, &str) -> bool) -> bool {
    match (as_comparable_string(actual), as_comparable_string(expected)) {
        (Some(a), Some(e)) => op(&a, &e),
        _ => false,
    }
}

fn regex_match(actual: &Value, expected: &Value, operator: Operator) -> PredicateResult<bool> {
    let Some(pattern) = as_comparable_string(expected) else {
        return Ok(false);
    };
    let regex = Regex::new(&pattern).map_err(|source| PredicateError::InvalidConditionRegex {
        operator: operator.token().to_string(),
        pattern,
        source: Box::new(source),
    })?;

    Ok(match as_comparable_string(actual) {
        Some(a) => regex.is_match(&a),
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bag(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_equals_and_not_equals() {
        let data = bag(&[("tag", json!("red"))]);

        let eq = vec![Condition::new("tag", "=", json!("red"))];
        assert!(is_satisfied(&eq, "", &data).unwrap());

        let neq = vec![Condition::new("tag", "!=", json!("red"))];
        assert!(!is_satisfied(&neq, "", &data).unwrap());
    }

    #[test]
    fn test_numeric_coercion_compares_as_integers() {
        let data = bag(&[("page", json!("5"))]);

        let conditions = vec![Condition::new("page", "=", json!(5))];
        assert!(is_satisfied(&conditions, "", &data).unwrap());
    }

    #[test]
    fn test_missing_key_compares_as_null() {
        let data = bag(&[]);

        let absent = vec![Condition::new("s", "=", Value::Null)];
        assert!(is_satisfied(&absent, "", &data).unwrap());

        let present = vec![Condition::new("s", "!=", Value::Null)];
        assert!(!is_satisfied(&present, "", &data).unwrap());
    }

    #[test]
    fn test_in_set() {
        let data = bag(&[("category", json!("chairs"))]);

        let conditions = vec![Condition::new("category", "in", json!(["tables", "chairs"]))];
        assert!(is_satisfied(&conditions, "", &data).unwrap());

        let conditions = vec![Condition::new("category", "!in", json!(["tables", "chairs"]))];
        assert!(!is_satisfied(&conditions, "", &data).unwrap());
    }

    #[test]
    fn test_like_matches_regex() {
        let data = bag(&[("slug", json!("hello-world"))]);

        let conditions = vec![Condition::new("slug", "like", json!("^hello"))];
        assert!(is_satisfied(&conditions, "", &data).unwrap());

        let conditions = vec![Condition::new("slug", "!like", json!("^goodbye"))];
        assert!(is_satisfied(&conditions, "", &data).unwrap());
    }

    #[test]
    fn test_invalid_like_regex_is_an_error() {
        let data = bag(&[("slug", json!("x"))]);
        let conditions = vec![Condition::new("slug", "like", json!("[unclosed"))];

        let err = is_satisfied(&conditions, "", &data).unwrap_err();
        assert!(matches!(err, PredicateError::InvalidConditionRegex { .. }));
    }

    #[test]
    fn test_string_containment_operators() {
        let data = bag(&[("path_info", json!("shop/products/42"))]);

        for (op, expected, outcome) in [
            ("contains", "products", true),
            ("!contains", "products", false),
            ("starts", "shop", true),
            ("!starts", "shop", false),
            ("ends", "42", true),
            ("!ends", "42", false),
        ] {
            let conditions = vec![Condition::new("path_info", op, json!(expected))];
            assert_eq!(
                is_satisfied(&conditions, "", &data).unwrap(),
                outcome,
                "operator {op}"
            );
        }
    }

    #[test]
    fn test_request_key_targets_raw_path() {
        let conditions = vec![Condition::new(REQUEST_PATH_KEY, "starts", json!("shop/"))];
        assert!(is_satisfied(&conditions, "shop/products", &bag(&[])).unwrap());
        assert!(!is_satisfied(&conditions, "blog/article", &bag(&[])).unwrap());
    }

    #[test]
    fn test_percent_decoded_actuals() {
        let data = bag(&[("title", json!("caf%C3%A9"))]);

        let conditions = vec![Condition::new("title", "=", json!("café"))];
        assert!(is_satisfied(&conditions, "", &data).unwrap());
    }

    #[test]
    fn test_unsupported_operator_is_fatal() {
        let data = bag(&[("tag", json!("red"))]);
        let conditions = vec![Condition::new("tag", "><", json!("red"))];

        let err = is_satisfied(&conditions, "", &data).unwrap_err();
        assert!(matches!(err, PredicateError::UnsupportedOperator(token) if token == "><"));
    }

    #[test]
    fn test_fails_fast_on_first_unsatisfied() {
        // The unsupported operator in the second condition is never
        // reached because the first condition already fails.
        let data = bag(&[("tag", json!("blue"))]);
        let conditions = vec![
            Condition::new("tag", "=", json!("red")),
            Condition::new("tag", "><", json!("red")),
        ];

        assert!(!is_satisfied(&conditions, "", &data).unwrap());
    }
}
