//! Serde form of a scope
//!
//! A scope document is either a single condition string or a group with
//! `all` (AND), `any` (OR) and `not` (negated AND) lists. Groups nest.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ScopeSpec {
    /// Single condition, e.g. `"age >= 18"`
    Simple(String),
    Group(ScopeSpecGroup),
}

/// Group of conditions; every present list must hold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScopeSpecGroup {
    /// All items must be true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<ScopeSpec>>,
    /// At least one item must be true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<ScopeSpec>>,
    /// The items must not all be true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Vec<ScopeSpec>>,
}

impl ScopeSpec {
    pub fn from_yaml(yaml: &str) -> serde_yaml::Result<Self> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
