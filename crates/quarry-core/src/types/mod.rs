//! Value types shared by the renderer, the scope tree and the matcher

pub mod value;

pub use value::{Row, Value};
