//! Scope text parser
//!
//! Parses condition strings like:
//! - `age > 18`
//! - `name like "A%"`
//! - `status in ["open", "pending"]`
//! - `deleted_at != null`
//! - `owner_id == {user_id}` (resolved from the parser context)
//! - `orders/# >= 1`

use super::spec::{ScopeSpec, ScopeSpecGroup};
use super::{Condition, ConditionValue, RootScope, Scope, ScopeNode};
use crate::error::{CoreError, Result};
use crate::operator::Operator;
use crate::types::Value;
use std::collections::HashMap;

/// Operator spellings; word operators carry their surrounding spaces
const OPERATORS: [(&str, Operator); 14] = [
    ("==", Operator::Eq),
    ("!=", Operator::Neq),
    ("<>", Operator::Neq),
    (">=", Operator::Gte),
    ("<=", Operator::Lte),
    ("=", Operator::Eq),
    (">", Operator::Gt),
    ("<", Operator::Lt),
    (" not like ", Operator::NotLike),
    (" like ", Operator::Like),
    (" not in ", Operator::NotIn),
    (" in ", Operator::In),
    (" not regexp ", Operator::NotRegexp),
    (" regexp ", Operator::Regexp),
];

/// Builds scopes from condition strings and [`ScopeSpec`] documents
#[derive(Debug, Default)]
pub struct ScopeParser {
    /// Values for `{name}` placeholders
    context: HashMap<String, Value>,
}

impl ScopeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: HashMap<String, Value>) -> Self {
        Self { context }
    }

    pub fn set_context(&mut self, context: HashMap<String, Value>) {
        self.context = context;
    }

    /// Parse a document into the root scope of `context`
    pub fn parse_root(&self, context: &str, spec: &ScopeSpec) -> Result<RootScope> {
        let mut root = RootScope::new(context);
        root.add(self.parse_spec(spec)?);
        Ok(root)
    }

    pub fn parse_spec(&self, spec: &ScopeSpec) -> Result<Scope> {
        match spec {
            ScopeSpec::Simple(text) => Ok(Scope::and().push(self.parse_condition(text)?)),
            ScopeSpec::Group(group) => self.parse_group(group),
        }
    }

    fn parse_group(&self, group: &ScopeSpecGroup) -> Result<Scope> {
        let mut scope = Scope::and();
        if let Some(all) = &group.all {
            for item in all {
                scope.add(self.parse_node(item)?);
            }
        }
        if let Some(any) = &group.any {
            let mut or = Scope::or();
            for item in any {
                or.add(self.parse_node(item)?);
            }
            scope.add(or);
        }
        if let Some(not) = &group.not {
            let mut negated = Scope::and();
            for item in not {
                negated.add(self.parse_node(item)?);
            }
            negated.negate()?;
            scope.add(negated);
        }
        Ok(scope)
    }

    fn parse_node(&self, spec: &ScopeSpec) -> Result<ScopeNode> {
        match spec {
            ScopeSpec::Simple(text) => Ok(self.parse_condition(text)?.into()),
            ScopeSpec::Group(group) => Ok(self.parse_group(group)?.into()),
        }
    }

    /// AND of several condition strings
    pub fn parse_all(&self, conditions: &[&str]) -> Result<Scope> {
        let mut scope = Scope::and();
        for text in conditions {
            scope.add(self.parse_condition(text)?);
        }
        Ok(scope)
    }

    /// OR of several condition strings
    pub fn parse_any(&self, conditions: &[&str]) -> Result<Scope> {
        let mut scope = Scope::or();
        for text in conditions {
            scope.add(self.parse_condition(text)?);
        }
        Ok(scope)
    }

    /// Parse a single `field op value` string.
    ///
    /// A lone field with no operator becomes a bare condition, which is how
    /// relationship existence checks (`orders/#`) are written.
    pub fn parse_condition(&self, text: &str) -> Result<Condition> {
        let text = text.trim();
        if text.is_empty() {
            return Err(parse_error(text, "Empty condition"));
        }

        let Some((pos, len, operator)) = find_operator(text) else {
            if text.contains(char::is_whitespace) {
                return Err(parse_error(text, "No operator found"));
            }
            return Ok(Condition::bare(text));
        };

        let field = text[..pos].trim();
        let value_str = text[pos + len..].trim();
        if field.is_empty() {
            return Err(parse_error(text, "Empty field name"));
        }
        if value_str.is_empty() {
            return Err(parse_error(text, "Missing value"));
        }

        let value = self.parse_value(value_str)?;
        Condition::new(field, operator, ConditionValue::from(value))
    }

    /// Parse a value literal.
    ///
    /// Supported formats:
    /// - Quoted strings: `"value"` or `'value'`
    /// - Numbers: `100`, `3.14`, `-42`
    /// - Booleans and `null`
    /// - Arrays: `["a", "b", 1, 2]`
    /// - Placeholders: `{name}` or `"{name}"`
    pub fn parse_value(&self, value_str: &str) -> Result<Value> {
        let value_str = value_str.trim();

        if let Some(name) = placeholder(value_str) {
            return self.resolve_placeholder(name);
        }

        if value_str.len() >= 2
            && ((value_str.starts_with('"') && value_str.ends_with('"'))
                || (value_str.starts_with('\'') && value_str.ends_with('\'')))
        {
            let unquoted = &value_str[1..value_str.len() - 1];
            if let Some(name) = placeholder(unquoted) {
                return self.resolve_placeholder(name);
            }
            return Ok(Value::String(unquoted.to_string()));
        }

        match value_str.to_ascii_lowercase().as_str() {
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            "null" => return Ok(Value::Null),
            _ => {}
        }

        if value_str.starts_with('[') && value_str.ends_with(']') {
            let elements = self.parse_array_elements(&value_str[1..value_str.len() - 1])?;
            return Ok(Value::Array(elements));
        }

        if let Ok(num) = value_str.parse::<f64>() {
            return Ok(Value::Number(num));
        }

        Ok(Value::String(value_str.to_string()))
    }

    fn resolve_placeholder(&self, name: &str) -> Result<Value> {
        self.context
            .get(name)
            .cloned()
            .ok_or_else(|| parse_error(name, "Unresolved placeholder"))
    }

    /// Split `"a", "b", 1` on commas outside quotes
    fn parse_array_elements(&self, content: &str) -> Result<Vec<Value>> {
        let mut elements = Vec::new();
        let mut current = String::new();
        let mut quote: Option<char> = None;

        for c in content.chars() {
            match (c, quote) {
                ('"' | '\'', None) => {
                    quote = Some(c);
                    current.push(c);
                }
                (c, Some(q)) if c == q => {
                    quote = None;
                    current.push(c);
                }
                (',', None) => {
                    self.push_element(&current, &mut elements)?;
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        self.push_element(&current, &mut elements)?;

        Ok(elements)
    }

    fn push_element(&self, raw: &str, elements: &mut Vec<Value>) -> Result<()> {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            elements.push(self.parse_value(trimmed)?);
        }
        Ok(())
    }
}

/// Earliest operator in `text`; the longest spelling wins a tie
fn find_operator(text: &str) -> Option<(usize, usize, Operator)> {
    let lower = text.to_ascii_lowercase();
    OPERATORS
        .iter()
        .filter_map(|(spelling, op)| lower.find(spelling).map(|pos| (pos, spelling.len(), *op)))
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
}

fn placeholder(text: &str) -> Option<&str> {
    text.strip_prefix('{')?.strip_suffix('}')
}

fn parse_error(input: &str, message: &str) -> CoreError {
    CoreError::Parse {
        input: input.to_string(),
        message: message.to_string(),
    }
}
