//! Render-time state

use crate::dialect::Dialect;
use crate::types::Value;

/// Final output of a render call
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    /// Placeholder name (without the `:` prefix) and bound value, in order
    pub params: Vec<(String, Value)>,
}

impl Rendered {
    pub fn param_values(&self) -> Vec<&Value> {
        self.params.iter().map(|(_, v)| v).collect()
    }
}

/// State threaded through one render call: the dialect, the placeholder
/// counter and the collected parameters.
///
/// A fresh session per top-level render is what makes rendering idempotent.
#[derive(Debug, Clone)]
pub struct RenderSession {
    dialect: Dialect,
    quote: char,
    inline_params: bool,
    params: Vec<(String, Value)>,
}

impl RenderSession {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            quote: dialect.identifier_quote(),
            inline_params: false,
            params: Vec::new(),
        }
    }

    /// A session that inlines parameter values as SQL literals.
    /// Output is for humans only, never for execution.
    pub fn debug(dialect: Dialect) -> Self {
        Self {
            inline_params: true,
            ..Self::new(dialect)
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Register a value and return the text that stands in for it
    pub fn add_param(&mut self, value: Value) -> String {
        if self.inline_params {
            return value.to_sql_literal();
        }
        let name = placeholder_name(self.params.len());
        let text = format!(":{}", name);
        self.params.push((name, value));
        text
    }

    /// Strict identifier quoting, doubling embedded quote characters
    pub fn quote_identifier(&self, name: &str) -> String {
        let quote = self.quote.to_string();
        let doubled = format!("{0}{0}", self.quote);
        format!("{0}{1}{0}", self.quote, name.replace(&quote, &doubled))
    }

    /// Soft identifier quoting.
    ///
    /// Strings that already look like expressions pass through untouched;
    /// otherwise each `.`-separated segment is quoted on its own.
    pub fn soft_identifier(&self, name: &str) -> String {
        if name == "*" || name.contains('(') || name.contains(self.quote) || name.contains('"') {
            return name.to_string();
        }
        name.split('.')
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    self.quote_identifier(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    pub fn finish(self, sql: String) -> Rendered {
        Rendered {
            sql,
            params: self.params,
        }
    }
}

/// Placeholder name for the n-th parameter: `a`..`z`, then `aa`, `ab`, ...
pub fn placeholder_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        n -= 1;
        name.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_names() {
        assert_eq!(placeholder_name(0), "a");
        assert_eq!(placeholder_name(25), "z");
        assert_eq!(placeholder_name(26), "aa");
        assert_eq!(placeholder_name(27), "ab");
        assert_eq!(placeholder_name(26 * 27), "aaa");
    }

    #[test]
    fn test_add_param_numbers_sequentially() {
        let mut session = RenderSession::new(Dialect::Generic);
        assert_eq!(session.add_param(Value::from(1)), ":a");
        assert_eq!(session.add_param(Value::from("x")), ":b");
        let rendered = session.finish(String::new());
        assert_eq!(rendered.params[1], ("b".to_string(), Value::from("x")));
    }

    #[test]
    fn test_debug_session_inlines() {
        let mut session = RenderSession::debug(Dialect::Generic);
        assert_eq!(session.add_param(Value::from("bob")), "'bob'");
        assert!(session.params().is_empty());
    }

    #[test]
    fn test_quote_identifier_doubles_quote() {
        let session = RenderSession::new(Dialect::MySql);
        assert_eq!(session.quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_soft_identifier() {
        let session = RenderSession::new(Dialect::Postgres);
        assert_eq!(session.soft_identifier("users.name"), r#""users"."name""#);
        assert_eq!(session.soft_identifier("users.*"), r#""users".*"#);
        assert_eq!(session.soft_identifier("*"), "*");
        assert_eq!(session.soft_identifier("count(*)"), "count(*)");
        assert_eq!(session.soft_identifier(r#""already""#), r#""already""#);
    }
}
