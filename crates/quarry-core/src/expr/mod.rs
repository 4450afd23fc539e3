//! Template expressions
//!
//! An [`Expression`] is an immutable template plus an argument bag. Rendering
//! threads a [`RenderSession`] through the template and every nested
//! sub-expression, so placeholder numbering and the parameter list are owned
//! by the render call rather than by the node.
//!
//! # Token grammar
//!
//! - `[name]` binds the argument as a parameter (`:a`, `:b`, ...)
//! - `{name}` quotes the argument as an identifier
//! - `{{name}}` quotes the argument as an identifier unless it already looks
//!   like an expression; `table.column` is quoted segment by segment
//! - `[]`, `{}`, `{{}}` take positional arguments in order of appearance
//!
//! Tokens inside quoted spans (`'...'`, `"..."`, `` `...` ``) are left alone.

mod expression;
mod session;
mod template;

pub use expression::{ArgumentValue, Arguments, Expression};
pub use session::{placeholder_name, RenderSession, Rendered};
pub use template::{tokenize, Escape, Segment, TagKey};

pub(crate) use expression::render_template;

use crate::dialect::Dialect;
use crate::error::Result;

/// Supplies values for named tags absent from an argument bag.
///
/// Statements implement this to resolve clause tags such as `[where]` or
/// `[limit]` while rendering their mode template.
pub trait TagSource {
    fn resolve_tag(&self, tag: &str, dialect: Dialect) -> Result<Option<ArgumentValue>>;
}
