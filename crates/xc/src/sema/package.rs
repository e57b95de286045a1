//! Packages loaded from the standard library directory

use std::path::PathBuf;
use std::sync::Arc;

use super::table::SymbolTable;

/// A named set of globally visible declarations.
///
/// Built once by the loader, then shared read-only by every unit.
#[derive(Debug, Clone)]
pub struct Package {
    pub ident: String,
    pub dir: PathBuf,
    pub table: Arc<SymbolTable>,
}

impl Package {
    pub fn new(ident: impl Into<String>, dir: impl Into<PathBuf>, table: SymbolTable) -> Self {
        Self {
            ident: ident.into(),
            dir: dir.into(),
            table: Arc::new(table),
        }
    }
}
