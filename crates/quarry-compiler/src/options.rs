//! Compiler configuration

use crate::error::{CompileError, Result};
use quarry_core::Dialect;
use serde::{Deserialize, Serialize};

/// Compiler options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Dialect of compiled statements
    pub dialect: Dialect,
    /// Log every compiled statement at info level
    pub log_sql: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Generic,
            log_sql: false,
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Load options from a YAML document; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| CompileError::Config(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CompileError::Config(e.to_string()))
    }
}
