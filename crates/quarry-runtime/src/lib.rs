//! Quarry Runtime - in-memory scope matcher
//!
//! Evaluates condition scopes against rows held in memory, with the same
//! operator, null and list semantics as the SQL the compiler produces.

pub mod error;
pub mod matcher;
pub mod operators;
pub mod options;

pub use error::{Result, RuntimeError};
pub use matcher::Matcher;
pub use operators::{evaluate_if, evaluate_if_with};
pub use options::MatcherOptions;
