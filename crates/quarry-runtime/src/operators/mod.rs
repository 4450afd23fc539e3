//! Operator evaluation for the in-memory matcher

mod comparison;
mod pattern;

pub use comparison::{evaluate_if, evaluate_if_with};
pub(crate) use pattern::{like_matches, regexp_matches};
