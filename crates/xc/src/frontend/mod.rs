//! X language frontend
//!
//! Lexes and parses one source file into a [`ast::SourceUnit`]. Semantic
//! analysis lives in [`crate::sema`]; the frontend only knows syntax.

pub mod ast;
pub mod lexer;
pub mod parser;

use std::fmt::Write as _;

use crate::common::CompileResult;

pub use lexer::Lexer;
pub use parser::Parser;

/// Debug output toggles
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontendConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
}

/// Parse a complete source file
pub fn parse_source(source: &str) -> CompileResult<ast::SourceUnit> {
    Parser::new(source).parse_unit()
}

/// One token per line: `start..end kind`
pub fn dump_tokens(source: &str) -> CompileResult<String> {
    let mut out = String::new();
    for token in Lexer::new(source).tokenize_all()? {
        let _ = writeln!(out, "{:>5} {:?}", token.span.to_string(), token.kind);
    }
    Ok(out)
}

/// Pretty-printed AST
pub fn dump_ast(source: &str) -> CompileResult<String> {
    Ok(format!("{:#?}", parse_source(source)?))
}
