//! Field references and condition values

use super::Condition;
use crate::error::{CoreError, Result};
use crate::expr::{ArgumentValue, Expression};
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

/// Separator between relationship hops in a field path
pub const HOP_SEPARATOR: char = '/';

/// Terminal path segment standing for "number of related records"
pub const COUNT_SEGMENT: &str = "#";

/// The left-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef {
    /// Field name, possibly crossing relationships: `orders/lines/qty`
    Path(String),
    /// Raw expression used in place of a field
    Expression(Expression),
}

impl FieldRef {
    pub fn path(&self) -> Option<&str> {
        match self {
            FieldRef::Path(path) => Some(path),
            FieldRef::Expression(_) => None,
        }
    }

    /// Split off the first relationship hop, if the path has one
    pub fn split_hop(&self) -> Option<(&str, &str)> {
        self.path()?.split_once(HOP_SEPARATOR)
    }

    pub fn describe(&self) -> String {
        match self {
            FieldRef::Path(path) => path.clone(),
            FieldRef::Expression(expr) => expr.template().unwrap_or("<expression>").to_string(),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(path: &str) -> Self {
        FieldRef::Path(path.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(path: String) -> Self {
        FieldRef::Path(path)
    }
}

impl From<Expression> for FieldRef {
    fn from(expr: Expression) -> Self {
        FieldRef::Expression(expr)
    }
}

/// A value computed from the condition it belongs to, at evaluation time.
///
/// Returning `None` drops the condition: it imposes no constraint.
#[derive(Clone)]
pub struct ComputedValue(Arc<dyn Fn(&Condition) -> Option<Value> + Send + Sync>);

impl ComputedValue {
    pub fn new(f: impl Fn(&Condition) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn resolve(&self, condition: &Condition) -> Option<Value> {
        (self.0)(condition)
    }
}

impl fmt::Debug for ComputedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComputedValue(..)")
    }
}

impl PartialEq for ComputedValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The right-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Null,
    Scalar(Value),
    List(Vec<Value>),
    Expression(Expression),
    Computed(ComputedValue),
}

impl ConditionValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ConditionValue::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ConditionValue::List(_))
    }

    pub fn as_value(&self) -> Option<Value> {
        match self {
            ConditionValue::Null => Some(Value::Null),
            ConditionValue::Scalar(v) => Some(v.clone()),
            ConditionValue::List(items) => Some(Value::Array(items.clone())),
            ConditionValue::Expression(_) | ConditionValue::Computed(_) => None,
        }
    }

    /// Argument form for rendering. Computed values must be resolved first.
    pub fn to_argument(&self) -> Result<ArgumentValue> {
        match self {
            ConditionValue::Expression(expr) => Ok(ArgumentValue::Expression(expr.clone())),
            ConditionValue::Computed(_) => Err(CoreError::InvalidValue(
                "computed value must be resolved before rendering".to_string(),
            )),
            other => Ok(ArgumentValue::Literal(other.as_value().unwrap_or(Value::Null))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ConditionValue::Expression(expr) => expr.template().unwrap_or("<expression>").to_string(),
            ConditionValue::Computed(_) => "<computed>".to_string(),
            other => other.as_value().unwrap_or(Value::Null).to_string(),
        }
    }
}

impl From<Value> for ConditionValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ConditionValue::Null,
            Value::Array(items) => ConditionValue::List(items),
            other => ConditionValue::Scalar(other),
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Scalar(Value::from(value))
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        ConditionValue::Scalar(Value::from(value))
    }
}

impl From<i32> for ConditionValue {
    fn from(value: i32) -> Self {
        ConditionValue::Scalar(Value::from(value))
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        ConditionValue::Scalar(Value::from(value))
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        ConditionValue::Scalar(Value::from(value))
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        ConditionValue::Scalar(Value::from(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for ConditionValue {
    fn from(items: Vec<T>) -> Self {
        ConditionValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Expression> for ConditionValue {
    fn from(expr: Expression) -> Self {
        ConditionValue::Expression(expr)
    }
}

impl From<ComputedValue> for ConditionValue {
    fn from(computed: ComputedValue) -> Self {
        ConditionValue::Computed(computed)
    }
}
