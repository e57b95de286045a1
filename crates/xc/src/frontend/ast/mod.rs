//! X abstract syntax tree

mod expr;
mod item;
mod stmt;
mod types;

pub use expr::*;
pub use item::*;
pub use stmt::*;
pub use types::*;

use crate::common::Span;

/// `use pkg`
#[derive(Debug, Clone, PartialEq)]
pub struct UseDecl {
    pub name: Ident,
    pub span: Span,
}

/// One parsed source file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub uses: Vec<UseDecl>,
    pub items: Vec<Item>,
    pub span: Span,
}

impl SourceUnit {
    pub fn new(uses: Vec<UseDecl>, items: Vec<Item>, span: Span) -> Self {
        Self { uses, items, span }
    }

    /// Whether the unit imports package `name`
    pub fn uses_package(&self, name: &str) -> bool {
        self.uses.iter().any(|u| u.name.name == name)
    }
}
