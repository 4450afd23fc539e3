//! Quarry Compiler - scope to SQL compiler
//!
//! This crate compiles condition scopes into statement predicates, with
//! pluggable field codecs and relationship resolution for path navigation.

pub mod codec;
pub mod compiler;
pub mod error;
pub mod options;
pub mod relationship;

// Re-export main types
pub use codec::{CodecMap, CodecSource, ColumnCodec, FieldCodec, PassthroughCodec, PassthroughCodecs, QueryArguments};
pub use compiler::SqlCompiler;
pub use error::{CompileError, Result};
pub use options::CompilerOptions;
pub use relationship::{Entity, ForeignKeys, Link, RelatedSet, Relationships};
