//! Runtime error types

use quarry_compiler::CompileError;
use quarry_core::{CoreError, Operator};
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The condition needs SQL to evaluate (relationship hops, expressions)
    #[error("Unsupported condition format: {0}")]
    UnsupportedFormat(String),

    /// The operator cannot compare these value types
    #[error("Unsupported operator {operator} for {left} and {right}")]
    UnsupportedOperator {
        operator: Operator,
        left: String,
        right: String,
    },

    #[error("Invalid pattern \"{pattern}\": {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
