//! Condition scopes: the boolean tree evaluated by both backends
//!
//! A [`Scope`] joins child nodes with a [`Junction`]; leaves are
//! [`Condition`]s. The tree is owned top-down, so every node has exactly one
//! parent. A [`RootScope`] is the top-level `And` scope bound to a query
//! context (table or entity name).
//!
//! # Syntax
//!
//! Scopes can be built in code or parsed from text and serde documents:
//! ```yaml
//! all:
//!   - age >= 18
//!   - any:
//!       - status in ["open", "pending"]
//!       - orders/# > 2
//! not:
//!   - name like "test%"
//! ```

mod condition;
mod parser;
mod spec;
mod value;

pub use condition::Condition;
pub use parser::ScopeParser;
pub use spec::{ScopeSpec, ScopeSpecGroup};
pub use value::{ComputedValue, ConditionValue, FieldRef, COUNT_SEGMENT, HOP_SEPARATOR};

use crate::error::{CoreError, Result};
use crate::operator::Operator;
use crate::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Junction {
    #[default]
    And,
    Or,
}

impl Junction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Junction::And => "and",
            Junction::Or => "or",
        }
    }

    pub fn flip(self) -> Junction {
        match self {
            Junction::And => Junction::Or,
            Junction::Or => Junction::And,
        }
    }
}

/// A child of a scope
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeNode {
    Condition(Condition),
    Scope(Scope),
}

impl ScopeNode {
    pub fn is_empty(&self) -> bool {
        match self {
            ScopeNode::Condition(c) => c.is_empty(),
            ScopeNode::Scope(s) => s.is_empty(),
        }
    }

    pub fn negate(&mut self) -> Result<()> {
        match self {
            ScopeNode::Condition(c) => c.negate(),
            ScopeNode::Scope(s) => s.negate(),
        }
    }

    /// Collapse single-child scope chains
    pub fn simplify(self) -> ScopeNode {
        match self {
            ScopeNode::Scope(scope) => scope.simplify(),
            condition => condition,
        }
    }

    pub fn simplified(&self) -> ScopeNode {
        self.clone().simplify()
    }
}

impl From<Condition> for ScopeNode {
    fn from(condition: Condition) -> Self {
        ScopeNode::Condition(condition)
    }
}

impl From<Scope> for ScopeNode {
    fn from(scope: Scope) -> Self {
        ScopeNode::Scope(scope)
    }
}

/// A junction of child nodes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scope {
    junction: Junction,
    children: Vec<ScopeNode>,
}

impl Scope {
    pub fn new(junction: Junction) -> Self {
        Self {
            junction,
            children: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(Junction::And)
    }

    pub fn or() -> Self {
        Self::new(Junction::Or)
    }

    pub fn with_children(junction: Junction, children: Vec<ScopeNode>) -> Self {
        Self { junction, children }
    }

    pub fn junction(&self) -> Junction {
        self.junction
    }

    pub fn children(&self) -> &[ScopeNode] {
        &self.children
    }

    pub fn add(&mut self, node: impl Into<ScopeNode>) -> &mut Self {
        self.children.push(node.into());
        self
    }

    pub fn add_condition(
        &mut self,
        field: &str,
        operator: Operator,
        value: impl Into<ConditionValue>,
    ) -> Result<&mut Self> {
        let condition = Condition::new(field, operator, value)?;
        Ok(self.add(condition))
    }

    /// Builder form of [`Scope::add`]
    pub fn push(mut self, node: impl Into<ScopeNode>) -> Self {
        self.children.push(node.into());
        self
    }

    /// True when no child imposes a constraint
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(ScopeNode::is_empty)
    }

    pub fn is_compound(&self) -> bool {
        self.children.len() > 1
    }

    /// Collapse a chain of single-child scopes to that child
    pub fn simplify(mut self) -> ScopeNode {
        if self.children.len() == 1 {
            if let Some(only) = self.children.pop() {
                return only.simplify();
            }
        }
        ScopeNode::Scope(self)
    }

    /// De Morgan: flip the junction and negate every child
    pub fn negate(&mut self) -> Result<()> {
        let mut children = self.children.clone();
        for child in &mut children {
            child.negate()?;
        }
        self.children = children;
        self.junction = self.junction.flip();
        Ok(())
    }
}

/// The top-level `And` scope of a query context
#[derive(Debug, Clone, PartialEq)]
pub struct RootScope {
    context: String,
    scope: Scope,
}

impl RootScope {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            scope: Scope::and(),
        }
    }

    /// Name of the table or entity this scope filters
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn add(&mut self, node: impl Into<ScopeNode>) -> &mut Self {
        self.scope.add(node);
        self
    }

    pub fn add_condition(
        &mut self,
        field: &str,
        operator: Operator,
        value: impl Into<ConditionValue>,
    ) -> Result<&mut Self> {
        self.scope.add_condition(field, operator, value)?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.scope.is_empty()
    }

    pub fn negate(&mut self) -> Result<()> {
        Err(CoreError::RootNegation(self.context.clone()))
    }

    /// Field defaults implied by equality conditions every match must satisfy
    pub fn field_defaults(&self) -> Vec<(String, Value)> {
        let mut defaults = Vec::new();
        collect_defaults(&self.scope, &mut defaults);
        defaults
    }
}

fn collect_defaults(scope: &Scope, out: &mut Vec<(String, Value)>) {
    // Only an OR-free path guarantees the field value
    if scope.junction == Junction::Or && scope.is_compound() {
        return;
    }
    for child in &scope.children {
        match child {
            ScopeNode::Condition(c) => {
                if let Some((field, value)) = c.default_value() {
                    out.push((field.to_string(), value.clone()));
                }
            }
            ScopeNode::Scope(s) => collect_defaults(s, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(field: &str, op: Operator, value: i64) -> ScopeNode {
        Condition::new(field, op, value).unwrap().into()
    }

    #[test]
    fn test_empty_and_compound() {
        let empty = Scope::and().push(Condition::default()).push(Scope::or());
        assert!(empty.is_empty());
        assert!(empty.is_compound());

        let single = Scope::and().push(cond("x", Operator::Eq, 1));
        assert!(!single.is_empty());
        assert!(!single.is_compound());
    }

    #[test]
    fn test_simplify_collapses_chain() {
        let leaf = cond("x", Operator::Eq, 1);
        let nested = Scope::and().push(Scope::or().push(leaf.clone()));
        assert_eq!(nested.simplify(), leaf);
    }

    #[test]
    fn test_de_morgan() {
        let mut scope = Scope::and()
            .push(cond("a", Operator::Eq, 1))
            .push(Scope::or().push(cond("b", Operator::Gt, 2)).push(cond("c", Operator::Lt, 3)));
        scope.negate().unwrap();

        assert_eq!(scope.junction(), Junction::Or);
        assert_eq!(scope.children()[0], cond("a", Operator::Neq, 1));
        match &scope.children()[1] {
            ScopeNode::Scope(inner) => {
                assert_eq!(inner.junction(), Junction::And);
                assert_eq!(inner.children()[0], cond("b", Operator::Lte, 2));
                assert_eq!(inner.children()[1], cond("c", Operator::Gte, 3));
            }
            other => panic!("expected scope, got {:?}", other),
        }
    }

    #[test]
    fn test_root_refuses_negation() {
        let mut root = RootScope::new("users");
        let err = root.negate().unwrap_err();
        assert_eq!(err, CoreError::RootNegation("users".to_string()));
    }

    #[test]
    fn test_field_defaults_skip_or_branches() {
        let mut root = RootScope::new("tickets");
        root.add_condition("status", Operator::Eq, "open")
            .unwrap()
            .add_condition("priority", Operator::Gt, 2)
            .unwrap()
            .add(
                Scope::or()
                    .push(Condition::eq("owner", "ann").unwrap())
                    .push(Condition::eq("owner", "bob").unwrap()),
            )
            .add(Scope::and().push(Condition::eq("queue", "support").unwrap()));

        assert_eq!(
            root.field_defaults(),
            vec![
                ("status".to_string(), Value::from("open")),
                ("queue".to_string(), Value::from("support")),
            ]
        );
    }
}
