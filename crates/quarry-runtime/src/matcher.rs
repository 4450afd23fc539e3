//! In-memory scope matcher
//!
//! Evaluates a scope against a row without SQL. Leaves go through the same
//! codecs as the compiler, so the row is read under each codec's storage
//! key and compared with the encoded condition value.

use crate::error::{Result, RuntimeError};
use crate::operators::evaluate_if_with;
use crate::options::MatcherOptions;
use quarry_compiler::{CodecSource, PassthroughCodecs};
use quarry_core::{
    ArgumentValue, Condition, CoreError, FieldRef, Junction, Operator, RootScope, Row, Scope,
    ScopeNode, Value,
};
use std::sync::Arc;

/// Matches rows against condition scopes
#[derive(Clone)]
pub struct Matcher {
    options: MatcherOptions,
    codecs: Arc<dyn CodecSource>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self::with_options(MatcherOptions::default())
    }

    pub fn with_options(options: MatcherOptions) -> Self {
        Self {
            options,
            codecs: Arc::new(PassthroughCodecs),
        }
    }

    pub fn with_codecs(mut self, codecs: impl CodecSource + 'static) -> Self {
        self.codecs = Arc::new(codecs);
        self
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    /// Does `row` satisfy the root scope? An empty scope matches everything.
    pub fn matches_root(&self, row: &Row, root: &RootScope) -> Result<bool> {
        self.matches_scope(root.context(), row, root.scope())
    }

    pub fn matches_scope(&self, entity: &str, row: &Row, scope: &Scope) -> Result<bool> {
        Ok(self.evaluate_scope(entity, row, scope)?.unwrap_or(true))
    }

    pub fn matches(&self, entity: &str, row: &Row, node: &ScopeNode) -> Result<bool> {
        Ok(self.evaluate(entity, row, node)?.unwrap_or(true))
    }

    /// Rows matching the root scope, in input order
    pub fn filter<'r>(&self, rows: &'r [Row], root: &RootScope) -> Result<Vec<&'r Row>> {
        let mut matched = Vec::new();
        for row in rows {
            if self.matches_root(row, root)? {
                matched.push(row);
            }
        }
        tracing::debug!(
            context = root.context(),
            total = rows.len(),
            matched = matched.len(),
            "Filtered rows"
        );
        Ok(matched)
    }

    /// `None` when the node imposes no constraint
    fn evaluate(&self, entity: &str, row: &Row, node: &ScopeNode) -> Result<Option<bool>> {
        match node {
            ScopeNode::Condition(condition) => self.evaluate_condition(entity, row, condition),
            ScopeNode::Scope(scope) => self.evaluate_scope(entity, row, scope),
        }
    }

    fn evaluate_scope(&self, entity: &str, row: &Row, scope: &Scope) -> Result<Option<bool>> {
        let mut seen = false;
        for child in scope.children() {
            let Some(result) = self.evaluate(entity, row, child)? else {
                continue;
            };
            seen = true;
            match (scope.junction(), result) {
                (Junction::Or, true) => return Ok(Some(true)),
                (Junction::And, false) => return Ok(Some(false)),
                _ => {}
            }
        }
        if !seen {
            return Ok(None);
        }
        Ok(Some(scope.junction() == Junction::And))
    }

    fn evaluate_condition(&self, entity: &str, row: &Row, condition: &Condition) -> Result<Option<bool>> {
        let Some(condition) = condition.resolved()? else {
            return Ok(None);
        };
        let path = match condition.field() {
            Some(FieldRef::Path(path)) if !path.contains(quarry_core::scope::HOP_SEPARATOR) => path,
            _ => return Err(RuntimeError::UnsupportedFormat(condition.describe())),
        };

        let codec = self.codecs.codec(entity, path)?;
        let args = codec.query_arguments(condition.operator(), condition.value())?;
        let actual = row.get(codec.key()).unwrap_or(&Value::Null);

        let Some(value) = args.value else {
            return Ok(Some(truthy(actual, &condition)?));
        };
        let ArgumentValue::Literal(expected) = value else {
            return Err(RuntimeError::UnsupportedFormat(condition.describe()));
        };
        let operator = args.operator.unwrap_or(Operator::Eq);

        let result = evaluate_if_with(actual, operator, &expected, &self.options).map_err(|e| match e {
            RuntimeError::Core(CoreError::UnsupportedNullComparison { operator, .. }) => {
                CoreError::UnsupportedNullComparison {
                    field: path.to_string(),
                    operator,
                }
                .into()
            }
            other => other,
        })?;
        tracing::trace!(field = %path, key = codec.key(), result, "Matched condition");
        Ok(Some(result))
    }
}

/// Bare field: the row value read as a boolean
fn truthy(value: &Value, condition: &Condition) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(*n != 0.0),
        _ => Err(RuntimeError::UnsupportedFormat(condition.describe())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::Expression;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_empty_scope_matches() {
        let root = RootScope::new("t");
        assert!(Matcher::new().matches_root(&row(&[]), &root).unwrap());

        let mut nested_empty = RootScope::new("t");
        nested_empty.add(Scope::or().push(Scope::and()));
        assert!(Matcher::new().matches_root(&row(&[]), &nested_empty).unwrap());
    }

    #[test]
    fn test_empty_children_skipped() {
        let scope = Scope::and()
            .push(Condition::default())
            .push(Condition::eq("a", 1).unwrap());
        let matcher = Matcher::new();
        assert!(matcher.matches_scope("t", &row(&[("a", Value::from(1))]), &scope).unwrap());
        assert!(!matcher.matches_scope("t", &row(&[("a", Value::from(2))]), &scope).unwrap());
    }

    #[test]
    fn test_missing_key_reads_null() {
        let mut root = RootScope::new("t");
        root.add(Condition::eq("deleted_at", Value::Null).unwrap());
        assert!(Matcher::new().matches_root(&row(&[]), &root).unwrap());
    }

    #[test]
    fn test_hops_and_expressions_unsupported() {
        let matcher = Matcher::new();
        let hop = ScopeNode::from(Condition::eq("orders/total", 1).unwrap());
        assert!(matches!(
            matcher.matches("t", &row(&[]), &hop),
            Err(RuntimeError::UnsupportedFormat(_))
        ));

        let expr = ScopeNode::from(Condition::expression(Expression::new("1 = 1")));
        assert!(matches!(
            matcher.matches("t", &row(&[]), &expr),
            Err(RuntimeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_null_ordering_names_field() {
        let node = ScopeNode::from(Condition::new("age", Operator::Gt, Value::Null).unwrap());
        let err = Matcher::new().matches("t", &row(&[]), &node).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported operator for null value: age >"
        );
    }

    #[test]
    fn test_bare_field_truthiness() {
        let node = ScopeNode::from(Condition::bare("is_admin"));
        let matcher = Matcher::new();
        assert!(matcher.matches("t", &row(&[("is_admin", Value::Bool(true))]), &node).unwrap());
        assert!(!matcher.matches("t", &row(&[("is_admin", Value::from(0))]), &node).unwrap());
        assert!(!matcher.matches("t", &row(&[]), &node).unwrap());
    }
}
