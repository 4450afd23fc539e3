//! Comparison operator evaluation
//!
//! Mirrors the SQL the compiler emits for the same condition, including the
//! null rewrites (`is null` / `is not null`) and the empty-list tautologies.

use super::pattern::{like_matches, regexp_matches};
use crate::error::{Result, RuntimeError};
use crate::options::MatcherOptions;
use quarry_core::{CoreError, Operator, Value};
use std::cmp::Ordering;

/// Evaluate `left op right` with default matcher options
pub fn evaluate_if(left: &Value, op: Operator, right: &Value) -> Result<bool> {
    evaluate_if_with(left, op, right, &MatcherOptions::default())
}

/// Evaluate `left op right`; `left` is the row value, `right` the condition value
pub fn evaluate_if_with(left: &Value, op: Operator, right: &Value, options: &MatcherOptions) -> Result<bool> {
    if right.is_null() {
        if op.is_ordering() {
            return Err(CoreError::UnsupportedNullComparison {
                field: left.to_string(),
                operator: op,
            }
            .into());
        }
        return Ok(left.is_null() != op.is_negative());
    }

    let result = match op {
        Operator::Eq | Operator::In => member_of(left, right),
        // A list renders as `not in`, so it follows the `NotIn` null rules
        Operator::Neq if right.is_array() => not_member_of(left, right),
        // Plain negation, also for a null row value
        Operator::Neq => left != right,
        Operator::NotIn => not_member_of(left, right),
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => ordering(left, op, right)?,
        Operator::Like | Operator::NotLike | Operator::Regexp | Operator::NotRegexp => {
            let Some(text) = text_of(left) else {
                // NULL never matches a pattern, negated or not
                return Ok(false);
            };
            let pattern = right.as_str().ok_or_else(|| unsupported(op, left, right))?;
            let matched = match op {
                Operator::Like | Operator::NotLike => like_matches(&text, pattern, options)?,
                _ => regexp_matches(&text, pattern, options)?,
            };
            matched != op.is_negative()
        }
    };

    tracing::trace!(%left, %op, %right, result, "Evaluated comparison");
    Ok(result)
}

/// Strict equality against a scalar, membership in a list
fn member_of(left: &Value, right: &Value) -> bool {
    match right {
        Value::Array(items) => items.iter().any(|item| item == left),
        scalar => left == scalar,
    }
}

/// `not in`: a null row value is never outside a non-empty list
fn not_member_of(left: &Value, right: &Value) -> bool {
    match right {
        Value::Array(items) if items.is_empty() => true,
        _ => !left.is_null() && !member_of(left, right),
    }
}

fn ordering(left: &Value, op: Operator, right: &Value) -> Result<bool> {
    if left.is_null() {
        return Ok(false);
    }
    let ord = left.compare(right).ok_or_else(|| unsupported(op, left, right))?;
    Ok(match op {
        Operator::Gt => ord == Ordering::Greater,
        Operator::Gte => ord != Ordering::Less,
        Operator::Lt => ord == Ordering::Less,
        _ => ord != Ordering::Greater,
    })
}

/// Text form used by pattern operators; numbers and booleans are matched
/// the way SQL casts them
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) => Some(value.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

fn unsupported(op: Operator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperator {
        operator: op,
        left: left.type_name().to_string(),
        right: right.type_name().to_string(),
    }
}
