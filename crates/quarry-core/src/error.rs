//! Error types for Quarry Core

use crate::operator::Operator;
use crate::statement::Mode;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The node being rendered carries no template
    #[error("Template not defined")]
    TemplateNotDefined,

    /// A named or positional tag had neither an argument nor a clause renderer
    #[error("Template could not resolve tag [{tag}] in \"{template}\"")]
    TemplateTagUnresolved { tag: String, template: String },

    #[error("Alias must be unique: {kind} \"{alias}\" is already defined")]
    AliasNotUnique { kind: &'static str, alias: String },

    #[error("Statement mode is already {current}, cannot switch to {requested}")]
    ModeAlreadySet { current: Mode, requested: Mode },

    /// The statement needs a table for its mode but none was added
    #[error("Statement in {0} mode requires a table")]
    MissingTable(Mode),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Negation not supported for this operator: {0}")]
    NegationNotSupported(String),

    #[error("Root scope of \"{0}\" cannot be negated")]
    RootNegation(String),

    /// Ordering comparisons against NULL have no IS/IS NOT rewrite
    #[error("Unsupported operator for null value: {field} {operator}")]
    UnsupportedNullComparison { field: String, operator: Operator },

    #[error("Failed to parse '{input}': {message}")]
    Parse { input: String, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_unresolved_message() {
        let error = CoreError::TemplateTagUnresolved {
            tag: "limit".to_string(),
            template: "select [limit]".to_string(),
        };
        assert!(error.to_string().contains("could not resolve tag [limit]"));
        assert!(error.to_string().contains("select [limit]"));
    }

    #[test]
    fn test_null_comparison_message() {
        let error = CoreError::UnsupportedNullComparison {
            field: "age".to_string(),
            operator: Operator::Gt,
        };
        assert_eq!(error.to_string(), "Unsupported operator for null value: age >");
    }
}
