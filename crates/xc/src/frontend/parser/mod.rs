//! X parser module

#[allow(clippy::module_inception)]
mod parser;

pub use parser::Parser;
