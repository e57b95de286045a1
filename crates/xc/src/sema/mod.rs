//! Semantic analysis
//!
//! The load phase ([`loader`]) fills the global tables of every package and
//! of the root program. Then each unit is checked on its own against the
//! read-only [`Sema`], producing annotated functions for the backend.

mod builtins;
mod checker;
mod context;
mod expr;
mod loader;
mod package;
mod program;
mod resolve;
mod scope;
mod symbol;
mod table;
mod types;

pub use builtins::Builtin;
pub use checker::{check_entry, check_unit, UnitChecker, UnitOutput};
pub use context::{Lookup, Sema};
pub use loader::{load_package, load_program};
pub use package::Package;
pub use program::{FnDef, GlobalDef, Module, ParamDef, Program, Scope, St, TExpr, TExprKind, VarSt};
pub use resolve::{value_type_error, ResolveError, TypeResolver};
pub use scope::{ScopeChecker, ScopeCursor, ScopeForest, ScopeId};
pub use symbol::{
    Decl, EnumItem, EnumSymbol, Field, FnSymbol, Param, StructSymbol, Symbol, SymbolKind,
    TraitMethod, TraitSymbol, TypeAliasSymbol, VarSymbol,
};
pub use table::{Duplicate, SymbolTable};
pub use types::{FnSig, SymbolRef, Type};

use crate::common::FileId;
use crate::frontend::ast::SourceUnit;

/// A parsed source file taking part in analysis
#[derive(Debug, Clone)]
pub struct Unit {
    pub file: FileId,
    pub ast: SourceUnit,
}

impl Unit {
    pub fn new(file: FileId, ast: SourceUnit) -> Self {
        Self { file, ast }
    }
}
