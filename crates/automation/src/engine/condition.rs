//! Condition evaluation for trigger filters and action gates.
//!
//! An expression is a conjunction of simple field comparisons against dotted
//! paths into the event payload. Evaluation is pure and total: malformed
//! expressions, missing fields, and type-mismatched comparisons evaluate to
//! false, so one bad condition can never break an execution. This is
//! deliberately not an expression language: no loops, no calls, no side
//! effects.

use serde::{Deserialize, Serialize};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Lt,
    /// Field is present and non-null; `value` is ignored.
    Exists,
}

/// One field comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// Dotted path into the event payload (e.g. `"member.status"`).
    pub field: String,
    pub op: Op,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// A conjunction of comparisons. Accepts either `{"all": [...]}` or a bare
/// array of comparisons.
#[derive(Debug, Clone, Serialize)]
pub struct Condition {
    pub all: Vec<Comparison>,
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Wrapped { all: Vec<Comparison> },
            Bare(Vec<Comparison>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Wrapped { all } => Condition { all },
            Repr::Bare(all) => Condition { all },
        })
    }
}

impl Condition {
    /// Parse a condition from its JSON representation.
    pub fn parse(expr: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(expr.clone())
    }

    /// Evaluate the conjunction against a payload.
    pub fn matches(&self, payload: &serde_json::Value) -> bool {
        self.all.iter().all(|c| compare(c, payload))
    }
}

/// Evaluate a raw expression against a payload.
///
/// Total: a malformed expression evaluates to false.
pub fn evaluate(expr: &serde_json::Value, payload: &serde_json::Value) -> bool {
    match Condition::parse(expr) {
        Ok(condition) => condition.matches(payload),
        Err(_) => false,
    }
}

/// Resolve a dotted path into a JSON value.
pub fn lookup<'a>(payload: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = payload;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn compare(comparison: &Comparison, payload: &serde_json::Value) -> bool {
    let found = lookup(payload, &comparison.field);

    match comparison.op {
        Op::Exists => matches!(found, Some(v) if !v.is_null()),
        Op::Eq | Op::Ne => {
            let (Some(actual), Some(expected)) = (found, comparison.value.as_ref()) else {
                return false;
            };
            match equal(actual, expected) {
                Some(eq) => {
                    if comparison.op == Op::Eq {
                        eq
                    } else {
                        !eq
                    }
                }
                None => false,
            }
        }
        Op::Gt | Op::Lt => {
            let (Some(actual), Some(expected)) = (found, comparison.value.as_ref()) else {
                return false;
            };
            let (Some(a), Some(b)) = (as_number(actual), as_number(expected)) else {
                return false;
            };
            if comparison.op == Op::Gt {
                a > b
            } else {
                a < b
            }
        }
    }
}

/// Equality with numeric coercion. `None` marks a type mismatch, which the
/// caller treats as false for both `eq` and `ne`.
fn equal(actual: &serde_json::Value, expected: &serde_json::Value) -> Option<bool> {
    if let (Some(a), Some(b)) = (as_number(actual), as_number(expected)) {
        return Some(a == b);
    }

    use serde_json::Value::*;
    match (actual, expected) {
        (String(a), String(b)) => Some(a == b),
        (Bool(a), Bool(b)) => Some(a == b),
        (Null, Null) => Some(true),
        (Array(a), Array(b)) => Some(a == b),
        (Object(a), Object(b)) => Some(a == b),
        _ => None,
    }
}

/// Coerce a JSON value to a number. Numeric strings coerce; everything else
/// does not.
fn as_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
