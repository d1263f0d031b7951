//! XML syntax parser module

pub mod cursor;
pub mod model;
pub mod parser;

pub use model::{Content, Document, Element};
pub use parser::{Config, Parser, DEFAULT_MAX_DEPTH};
