pub mod backend;
pub mod cli;
pub mod codegen;
pub mod compiler;
pub mod frontend;
pub mod parser_utils;
pub mod pipeline;

pub use pipeline::compile_to_html;
