//! Matcher configuration

use serde::{Deserialize, Serialize};

/// Matcher options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherOptions {
    /// LIKE ignores case, as SQLite and MySQL do by default
    pub case_insensitive_like: bool,
    /// Compiled size limit for LIKE and REGEXP patterns, in bytes
    pub regex_size_limit: usize,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            case_insensitive_like: true,
            regex_size_limit: 1 << 20,
        }
    }
}

impl MatcherOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case_insensitive_like(mut self, enabled: bool) -> Self {
        self.case_insensitive_like = enabled;
        self
    }

    pub fn with_regex_size_limit(mut self, limit: usize) -> Self {
        self.regex_size_limit = limit;
        self
    }
}
