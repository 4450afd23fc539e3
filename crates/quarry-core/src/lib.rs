//! Quarry Core - query-condition core for the Quarry data-access layer
//!
//! This crate provides the types shared by both condition backends:
//! - Value types for literals and rows
//! - Operators with their negation table
//! - Template expressions and SQL statements with per-dialect templates
//! - Condition scopes (the boolean tree) and their text/serde parser
//! - Error types

pub mod dialect;
pub mod error;
pub mod expr;
pub mod operator;
pub mod scope;
pub mod statement;
pub mod types;

// Re-export commonly used types
pub use dialect::Dialect;
pub use error::{CoreError, Result};
pub use expr::{ArgumentValue, Expression, RenderSession, Rendered, TagSource};
pub use operator::Operator;
pub use scope::{
    ComputedValue, Condition, ConditionValue, FieldRef, Junction, RootScope, Scope, ScopeNode,
    ScopeParser, ScopeSpec, ScopeSpecGroup,
};
pub use statement::{JoinKind, JoinOn, Mode, SortDirection, Statement, WhereEntry};
pub use types::{Row, Value};
