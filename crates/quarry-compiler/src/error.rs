//! Compiler error types

use quarry_core::{CoreError, Operator};
use thiserror::Error;

/// Compiler error
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A path hop names no relationship of the entity
    #[error("Unknown relationship \"{hop}\" on {entity}")]
    UnknownRelationship { entity: String, hop: String },

    /// Strict codec registries reject fields they do not know
    #[error("Unknown field \"{field}\" on {entity}")]
    UnknownField { entity: String, field: String },

    /// The field codec refused the operator or value
    #[error("Codec for field \"{field}\" cannot encode {value} with operator {operator:?}: {message}")]
    Codec {
        field: String,
        operator: Option<Operator>,
        value: String,
        message: String,
    },

    /// Error raised while filling a statement, with its debug rendering
    #[error("{source} (in statement: {statement})")]
    InStatement {
        statement: String,
        #[source]
        source: Box<CompileError>,
    },

    #[error("Invalid compiler configuration: {0}")]
    Config(String),
}

impl CompileError {
    /// The innermost error, past any statement context
    pub fn root_cause(&self) -> &CompileError {
        match self {
            CompileError::InStatement { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;
