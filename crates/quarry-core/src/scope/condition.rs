//! Leaf predicates

use super::value::{ConditionValue, FieldRef};
use crate::error::{CoreError, Result};
use crate::expr::Expression;
use crate::operator::Operator;
use crate::types::Value;

/// A single `field op value` predicate.
///
/// Conditions are plain data; compiling them to SQL or evaluating them
/// against a row is left to the backends.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    field: Option<FieldRef>,
    operator: Option<Operator>,
    value: Option<ConditionValue>,
}

impl Condition {
    /// Full form. Fails on array values the operator cannot take.
    pub fn new(
        field: impl Into<FieldRef>,
        operator: Operator,
        value: impl Into<ConditionValue>,
    ) -> Result<Self> {
        let value = value.into();
        validate(operator, &value)?;
        Ok(Self {
            field: Some(field.into()),
            operator: Some(operator),
            value: Some(value),
        })
    }

    /// Two-argument form, `field = value`
    pub fn eq(field: impl Into<FieldRef>, value: impl Into<ConditionValue>) -> Result<Self> {
        Self::new(field, Operator::Eq, value)
    }

    /// Field without operator or value: a boolean expression, or a
    /// relationship existence check such as `orders/#`
    pub fn bare(field: impl Into<FieldRef>) -> Self {
        Self {
            field: Some(field.into()),
            operator: None,
            value: None,
        }
    }

    pub fn expression(expr: Expression) -> Self {
        Self::bare(FieldRef::Expression(expr))
    }

    pub fn field(&self) -> Option<&FieldRef> {
        self.field.as_ref()
    }

    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    pub fn value(&self) -> Option<&ConditionValue> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.operator.is_none() && self.value.is_none()
    }

    /// Provisional default recorded by equality conditions: a new record
    /// created under this condition starts with `field = value`.
    pub fn default_value(&self) -> Option<(&str, &Value)> {
        match (&self.field, self.operator, &self.value) {
            (Some(FieldRef::Path(path)), Some(Operator::Eq), Some(ConditionValue::Scalar(value)))
                if !path.contains(super::value::HOP_SEPARATOR) =>
            {
                Some((path.as_str(), value))
            }
            _ => None,
        }
    }

    /// Replace the operator with its negation partner
    pub fn negate(&mut self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        match self.operator {
            Some(op) => {
                self.operator = Some(op.negate());
                Ok(())
            }
            None => Err(CoreError::NegationNotSupported(self.describe())),
        }
    }

    pub fn negated(&self) -> Result<Self> {
        let mut negated = self.clone();
        negated.negate()?;
        Ok(negated)
    }

    /// Resolve a computed value against this condition.
    ///
    /// `None` means the condition drops out: it was empty, or its computed
    /// value declined to produce a constraint.
    pub fn resolved(&self) -> Result<Option<Condition>> {
        if self.is_empty() {
            return Ok(None);
        }
        match &self.value {
            Some(ConditionValue::Computed(computed)) => match computed.resolve(self) {
                None => Ok(None),
                Some(value) => {
                    let value = ConditionValue::from(value);
                    if let Some(op) = self.operator {
                        validate(op, &value)?;
                    }
                    Ok(Some(Condition {
                        value: Some(value),
                        ..self.clone()
                    }))
                }
            },
            _ => Ok(Some(self.clone())),
        }
    }

    /// Copy of this condition pointing at another field
    pub fn with_field(&self, field: impl Into<FieldRef>) -> Self {
        Condition {
            field: Some(field.into()),
            ..self.clone()
        }
    }

    /// `field op value` for messages
    pub fn describe(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(field) = &self.field {
            parts.push(field.describe());
        }
        if let Some(op) = self.operator {
            parts.push(op.to_string());
        }
        if let Some(value) = &self.value {
            parts.push(value.describe());
        }
        parts.join(" ")
    }
}

fn validate(operator: Operator, value: &ConditionValue) -> Result<()> {
    match value {
        ConditionValue::List(items) => {
            if !operator.accepts_array() {
                return Err(CoreError::InvalidValue(format!(
                    "operator {} does not accept an array value",
                    operator
                )));
            }
            if items.iter().any(|v| matches!(v, Value::Array(_) | Value::Object(_))) {
                return Err(CoreError::InvalidValue(
                    "multi-dimensional array as condition value is not supported".to_string(),
                ));
            }
            Ok(())
        }
        ConditionValue::Scalar(Value::Object(_)) => Err(CoreError::InvalidValue(
            "object as condition value is not supported".to_string(),
        )),
        _ => Ok(()),
    }
}
