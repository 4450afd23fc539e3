//! Expression nodes and the recursive renderer

use super::session::{RenderSession, Rendered};
use super::template::{tokenize, Escape, Segment, TagKey};
use super::TagSource;
use crate::dialect::Dialect;
use crate::error::{CoreError, Result};
use crate::statement::Statement;
use crate::types::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A value substituted into a template tag
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// Scalar (or array) literal, escaped according to the tag
    Literal(Value),
    /// Nested expression, rendered in place
    Expression(Expression),
    /// Nested statement, rendered as a parenthesized sub-query
    Statement(Box<Statement>),
    /// Items rendered one by one, joined with `, ` inside parentheses
    List(Vec<ArgumentValue>),
}

impl ArgumentValue {
    /// True for an empty list literal or an empty `List`
    pub fn is_empty_list(&self) -> bool {
        match self {
            ArgumentValue::Literal(Value::Array(items)) => items.is_empty(),
            ArgumentValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            ArgumentValue::Literal(Value::Array(_)) | ArgumentValue::List(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArgumentValue::Literal(Value::Null))
    }

    /// Short human-readable form used in error messages
    pub fn describe(&self) -> String {
        match self {
            ArgumentValue::Literal(v) => v.to_string(),
            ArgumentValue::Expression(e) => e.template().unwrap_or("<no template>").to_string(),
            ArgumentValue::Statement(_) => "<sub-query>".to_string(),
            ArgumentValue::List(items) => {
                let items: Vec<String> = items.iter().map(ArgumentValue::describe).collect();
                format!("({})", items.join(", "))
            }
        }
    }
}

impl From<Value> for ArgumentValue {
    fn from(value: Value) -> Self {
        ArgumentValue::Literal(value)
    }
}

impl From<&str> for ArgumentValue {
    fn from(value: &str) -> Self {
        ArgumentValue::Literal(Value::from(value))
    }
}

impl From<String> for ArgumentValue {
    fn from(value: String) -> Self {
        ArgumentValue::Literal(Value::from(value))
    }
}

impl From<i64> for ArgumentValue {
    fn from(value: i64) -> Self {
        ArgumentValue::Literal(Value::from(value))
    }
}

impl From<f64> for ArgumentValue {
    fn from(value: f64) -> Self {
        ArgumentValue::Literal(Value::from(value))
    }
}

impl From<bool> for ArgumentValue {
    fn from(value: bool) -> Self {
        ArgumentValue::Literal(Value::from(value))
    }
}

impl From<Expression> for ArgumentValue {
    fn from(value: Expression) -> Self {
        ArgumentValue::Expression(value)
    }
}

impl From<Statement> for ArgumentValue {
    fn from(value: Statement) -> Self {
        ArgumentValue::Statement(Box::new(value))
    }
}

impl From<Vec<ArgumentValue>> for ArgumentValue {
    fn from(value: Vec<ArgumentValue>) -> Self {
        ArgumentValue::List(value)
    }
}

/// Positional and named arguments of a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<ArgumentValue>,
    named: BTreeMap<String, ArgumentValue>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: ArgumentValue) {
        self.positional.push(value);
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgumentValue) {
        self.named.insert(name.into(), value);
    }

    pub fn get(&self, key: &TagKey) -> Option<&ArgumentValue> {
        match key {
            TagKey::Index(i) => self.positional.get(*i),
            TagKey::Name(name) => self.named.get(name),
        }
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A renderable template node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    template: Option<String>,
    args: Arguments,
    wrap_in_parens: bool,
}

impl Expression {
    /// Create an expression from a template
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            args: Arguments::new(),
            wrap_in_parens: false,
        }
    }

    /// Create an expression with positional arguments
    pub fn with_args(template: impl Into<String>, args: Vec<ArgumentValue>) -> Self {
        let mut expr = Self::new(template);
        for arg in args {
            expr.args.push(arg);
        }
        expr
    }

    /// Add a positional argument
    pub fn arg(mut self, value: impl Into<ArgumentValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Add a named argument
    pub fn named(mut self, name: impl Into<String>, value: impl Into<ArgumentValue>) -> Self {
        self.args.insert(name, value.into());
        self
    }

    /// Render wrapped in parentheses when nested inside another template
    pub fn wrapped(mut self) -> Self {
        self.wrap_in_parens = true;
        self
    }

    pub fn wrap_in_parens(&self) -> bool {
        self.wrap_in_parens
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// Render to SQL text plus bound parameters
    pub fn render(&self, dialect: Dialect) -> Result<Rendered> {
        let mut session = RenderSession::new(dialect);
        let sql = self.render_into(&mut session)?;
        log::debug!("Rendered expression: {} ({} params)", sql, session.params().len());
        Ok(session.finish(sql))
    }

    /// Render with parameter values inlined, for human inspection only
    pub fn render_debug(&self, dialect: Dialect) -> Result<String> {
        let mut session = RenderSession::debug(dialect);
        self.render_into(&mut session)
    }

    /// Render inside an existing session, sharing its counter and parameters
    pub fn render_into(&self, session: &mut RenderSession) -> Result<String> {
        let template = self.template.as_deref().ok_or(CoreError::TemplateNotDefined)?;
        render_template(template, &self.args, None, session)
    }
}

/// Render a template against an argument bag, falling back to `tags` for
/// named tags the bag does not hold.
pub(crate) fn render_template(
    template: &str,
    args: &Arguments,
    tags: Option<&dyn TagSource>,
    session: &mut RenderSession,
) -> Result<String> {
    let mut out = String::with_capacity(template.len());

    for segment in tokenize(template) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Tag { key, escape } => {
                let value = resolve(&key, args, tags, session.dialect())?.ok_or_else(|| {
                    CoreError::TemplateTagUnresolved {
                        tag: key.label(),
                        template: template.to_string(),
                    }
                })?;
                out.push_str(&render_value(&value, escape, session)?);
            }
        }
    }

    Ok(out)
}

fn resolve<'a>(
    key: &TagKey,
    args: &'a Arguments,
    tags: Option<&dyn TagSource>,
    dialect: Dialect,
) -> Result<Option<Cow<'a, ArgumentValue>>> {
    if let Some(value) = args.get(key) {
        return Ok(Some(Cow::Borrowed(value)));
    }
    match (key, tags) {
        (TagKey::Name(name), Some(source)) => Ok(source.resolve_tag(name, dialect)?.map(Cow::Owned)),
        _ => Ok(None),
    }
}

fn render_value(value: &ArgumentValue, escape: Escape, session: &mut RenderSession) -> Result<String> {
    match value {
        ArgumentValue::Literal(Value::Array(items)) if escape == Escape::Param => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| session.add_param(item.clone()))
                .collect();
            Ok(format!("({})", rendered.join(", ")))
        }
        ArgumentValue::Literal(value) => Ok(match escape {
            Escape::Param => session.add_param(value.clone()),
            Escape::Identifier => session.quote_identifier(&value.to_string()),
            Escape::SoftIdentifier => session.soft_identifier(&value.to_string()),
        }),
        ArgumentValue::Expression(expr) => {
            let sql = expr.render_into(session)?;
            Ok(if expr.wrap_in_parens() {
                format!("({})", sql)
            } else {
                sql
            })
        }
        ArgumentValue::Statement(statement) => Ok(format!("({})", statement.render_into(session)?)),
        ArgumentValue::List(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                rendered.push(render_value(item, escape, session)?);
            }
            Ok(format!("({})", rendered.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_positional_args() {
        let expr = Expression::with_args(
            "{{}} > []",
            vec![ArgumentValue::from("users.age"), ArgumentValue::from(18i64)],
        );
        let rendered = expr.render(Dialect::Generic).unwrap();
        assert_eq!(rendered.sql, r#""users"."age" > :a"#);
        assert_eq!(rendered.params, vec![("a".to_string(), Value::from(18))]);
    }

    #[test]
    fn test_render_named_args() {
        let expr = Expression::new("{col} = [val]")
            .named("col", "name")
            .named("val", "alice");
        let rendered = expr.render(Dialect::MySql).unwrap();
        assert_eq!(rendered.sql, "`name` = :a");
    }

    #[test]
    fn test_render_nested_shares_counter() {
        let inner = Expression::new("[] + []").arg(1i64).arg(2i64).wrapped();
        let outer = Expression::new("[] * []").arg(inner).arg(3i64);
        let rendered = outer.render(Dialect::Generic).unwrap();
        assert_eq!(rendered.sql, "(:a + :b) * :c");
        assert_eq!(rendered.params.len(), 3);
    }

    #[test]
    fn test_render_list() {
        let expr = Expression::new("{{}} in []").arg("id").arg(ArgumentValue::List(vec![
            ArgumentValue::from(1i64),
            ArgumentValue::from(2i64),
        ]));
        assert_eq!(expr.render(Dialect::Generic).unwrap().sql, r#""id" in (:a, :b)"#);
    }

    #[test]
    fn test_render_is_idempotent() {
        let expr = Expression::new("[] = []").arg("a").arg("b");
        let first = expr.render(Dialect::Generic).unwrap();
        let second = expr.render(Dialect::Generic).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.params[0].0, "a");
    }

    #[test]
    fn test_unresolved_tag() {
        let err = Expression::new("select [missing]").render(Dialect::Generic).unwrap_err();
        assert!(matches!(err, CoreError::TemplateTagUnresolved { ref tag, .. } if tag == "missing"));
    }

    #[test]
    fn test_missing_positional_is_unresolved() {
        let err = Expression::new("[] and []").arg(1i64).render(Dialect::Generic).unwrap_err();
        assert!(matches!(err, CoreError::TemplateTagUnresolved { ref tag, .. } if tag == "1"));
    }

    #[test]
    fn test_template_not_defined() {
        let err = Expression::default().render(Dialect::Generic).unwrap_err();
        assert_eq!(err, CoreError::TemplateNotDefined);
    }

    #[test]
    fn test_render_debug_inlines_values() {
        let expr = Expression::new("{{}} = []").arg("name").arg("O'Hara");
        assert_eq!(
            expr.render_debug(Dialect::Generic).unwrap(),
            r#""name" = 'O''Hara'"#
        );
    }
}
