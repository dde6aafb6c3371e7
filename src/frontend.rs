//! Source text to document tree.
pub mod ast;
pub mod data;
pub mod parser;
pub mod tokenizer;

pub use ast::Node;
pub use parser::parse_source;
