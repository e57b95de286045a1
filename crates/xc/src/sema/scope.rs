//! Scope checker chain
//!
//! Every block of a function body is checked by its own [`ScopeChecker`],
//! living in a [`ScopeForest`] arena and addressed by a [`ScopeId`]. A
//! checker owns the table of its block; lookups of variables and type aliases
//! walk outward through the parents and end at [`Sema`]. Structs, functions,
//! traits, enums and packages are never declared in a block, so those lookups
//! go straight to `Sema`.
//!
//! Checkers are allocated and released in stack order: a child is always
//! left before its parent.

use std::fmt;

use tracing::trace;

use super::context::{Lookup, Sema};
use super::package::Package;
use super::program::Scope;
use super::symbol::{EnumSymbol, FnSymbol, StructSymbol, TraitSymbol, TypeAliasSymbol, VarSymbol};
use super::table::{Duplicate, SymbolTable};
use crate::frontend::ast::Block;

/// Handle of a live scope checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct ScopeChecker<'a> {
    parent: Option<ScopeId>,
    table: SymbolTable,
    scope: Scope,
    tree: Option<&'a Block>,
}

pub struct ScopeForest<'a> {
    sema: &'a Sema,
    checkers: Vec<ScopeChecker<'a>>,
}

impl<'a> ScopeForest<'a> {
    pub fn new(sema: &'a Sema) -> Self {
        Self {
            sema,
            checkers: Vec::new(),
        }
    }

    pub fn sema(&self) -> &'a Sema {
        self.sema
    }

    fn get(&self, id: ScopeId) -> Option<&ScopeChecker<'a>> {
        self.checkers.get(id.index())
    }

    /// Allocate a checker below `parent`; its scope inherits the parent's
    /// unsafety and deferral
    pub fn enter(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let (unsafety, deferred) = parent
            .and_then(|p| self.get(p))
            .map(|c| (c.scope.unsafety, c.scope.deferred))
            .unwrap_or((false, false));

        let id = ScopeId(self.checkers.len() as u32);
        self.checkers.push(ScopeChecker {
            parent,
            table: SymbolTable::new(),
            scope: Scope::new(parent, unsafety, deferred),
            tree: None,
        });
        trace!(scope = %id, parent = ?parent.map(|p| p.0), "enter scope");
        id
    }

    /// Release the innermost checker and hand back its scope.
    ///
    /// Returns `None` unless `id` is the innermost live checker.
    pub fn leave(&mut self, id: ScopeId) -> Option<Scope> {
        if id.index() + 1 != self.checkers.len() {
            return None;
        }
        let checker = self.checkers.pop()?;
        trace!(scope = %id, declared = checker.table.vars().count(), "leave scope");
        Some(checker.scope)
    }

    /// Bind a checker to the block it checks and its working scope
    pub fn check(&mut self, id: ScopeId, tree: &'a Block, scope: Scope) {
        if let Some(checker) = self.checkers.get_mut(id.index()) {
            checker.tree = Some(tree);
            checker.scope = scope;
        }
    }

    pub fn tree(&self, id: ScopeId) -> Option<&'a Block> {
        self.get(id).and_then(|c| c.tree)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.get(id).map(|c| &c.scope)
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.checkers.get_mut(id.index()).map(|c| &mut c.scope)
    }

    pub fn is_unsafe(&self, id: ScopeId) -> bool {
        self.scope(id).is_some_and(|s| s.unsafety)
    }

    pub fn in_deferred(&self, id: ScopeId) -> bool {
        self.scope(id).is_some_and(|s| s.deferred)
    }

    /// Nearest variable named `ident` with the given linkage, and whether
    /// it was found in a block rather than at global level
    pub fn resolve_var(&self, id: ScopeId, ident: &str, cpp: bool) -> Option<(&VarSymbol, bool)> {
        let mut current = Some(id);
        while let Some(checker) = current.and_then(|c| self.get(c)) {
            if let Some(var) = checker.table.find_var(ident, cpp) {
                return Some((var, true));
            }
            current = checker.parent;
        }
        self.sema.find_var(ident, cpp).map(|var| (var, false))
    }

    pub fn find_var(&self, id: ScopeId, ident: &str, cpp: bool) -> Option<&VarSymbol> {
        self.resolve_var(id, ident, cpp).map(|(var, _)| var)
    }

    pub fn find_type_alias(&self, id: ScopeId, ident: &str, cpp: bool) -> Option<&TypeAliasSymbol> {
        let mut current = Some(id);
        while let Some(checker) = current.and_then(|c| self.get(c)) {
            if let Some(alias) = checker.table.find_type_alias(ident, cpp) {
                return Some(alias);
            }
            current = checker.parent;
        }
        self.sema.find_type_alias(ident, cpp)
    }

    pub fn find_struct(&self, _id: ScopeId, ident: &str, cpp: bool) -> Option<&'a StructSymbol> {
        self.sema.find_struct(ident, cpp)
    }

    pub fn find_fn(&self, _id: ScopeId, ident: &str, cpp: bool) -> Option<&'a FnSymbol> {
        self.sema.find_fn(ident, cpp)
    }

    pub fn find_trait(&self, _id: ScopeId, ident: &str) -> Option<&'a TraitSymbol> {
        self.sema.find_trait(ident)
    }

    pub fn find_enum(&self, _id: ScopeId, ident: &str) -> Option<&'a EnumSymbol> {
        self.sema.find_enum(ident)
    }

    pub fn find_package(&self, _id: ScopeId, ident: &str) -> Option<&'a Package> {
        self.sema.find_package(ident)
    }

    pub fn select_package(
        &self,
        _id: ScopeId,
        predicate: Option<&dyn Fn(&Package) -> bool>,
    ) -> Option<&'a Package> {
        self.sema.select_package(predicate)
    }

    /// Declare a local variable in the block of `id`; only that block's
    /// table is checked for duplicates
    pub fn declare_var(&mut self, id: ScopeId, var: VarSymbol) -> Result<(), Duplicate> {
        match self.checkers.get_mut(id.index()) {
            Some(checker) => checker.table.add_var(var),
            None => Ok(()),
        }
    }

    pub fn declare_type_alias(&mut self, id: ScopeId, alias: TypeAliasSymbol) -> Result<(), Duplicate> {
        match self.checkers.get_mut(id.index()) {
            Some(checker) => checker.table.add_type_alias(alias),
            None => Ok(()),
        }
    }

    /// Lookup view anchored at `id`
    pub fn cursor(&self, id: ScopeId) -> ScopeCursor<'_, 'a> {
        ScopeCursor { forest: self, id }
    }
}

/// A [`ScopeForest`] seen from one checker, usable wherever a [`Lookup`]
/// is expected (type resolution in particular)
pub struct ScopeCursor<'f, 'a> {
    forest: &'f ScopeForest<'a>,
    id: ScopeId,
}

impl Lookup for ScopeCursor<'_, '_> {
    fn find_package(&self, ident: &str) -> Option<&Package> {
        self.forest.find_package(self.id, ident)
    }

    fn find_var(&self, ident: &str, cpp: bool) -> Option<&VarSymbol> {
        self.forest.find_var(self.id, ident, cpp)
    }

    fn find_type_alias(&self, ident: &str, cpp: bool) -> Option<&TypeAliasSymbol> {
        self.forest.find_type_alias(self.id, ident, cpp)
    }

    fn find_struct(&self, ident: &str, cpp: bool) -> Option<&StructSymbol> {
        self.forest.find_struct(self.id, ident, cpp)
    }

    fn find_fn(&self, ident: &str, cpp: bool) -> Option<&FnSymbol> {
        self.forest.find_fn(self.id, ident, cpp)
    }

    fn find_trait(&self, ident: &str) -> Option<&TraitSymbol> {
        self.forest.find_trait(self.id, ident)
    }

    fn find_enum(&self, ident: &str) -> Option<&EnumSymbol> {
        self.forest.find_enum(self.id, ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Loc, Span};
    use crate::sema::types::Type;
    use pretty_assertions::assert_eq;

    fn var(ident: &str, cpp: bool, ty: Type) -> VarSymbol {
        VarSymbol {
            ident: ident.to_string(),
            loc: Loc::default(),
            cpp_linked: cpp,
            ty,
            mutable: true,
            constant: false,
            local: true,
            local_id: None,
            package: None,
        }
    }

    fn sema_with_global_x() -> Sema {
        let mut globals = SymbolTable::new();
        let mut x = var("x", false, Type::BOOL);
        x.local = false;
        globals.add_var(x).unwrap();
        globals
            .add_struct(StructSymbol {
                ident: "Point".into(),
                loc: Loc::default(),
                cpp_linked: false,
                fields: Vec::new(),
                package: None,
            })
            .unwrap();
        Sema::new(globals, Vec::new())
    }

    #[test]
    fn test_nearest_scope_wins() {
        let sema = sema_with_global_x();
        let mut forest = ScopeForest::new(&sema);

        let a = forest.enter(None);
        forest.declare_var(a, var("x", false, Type::INT)).unwrap();
        let b = forest.enter(Some(a));
        forest.declare_var(b, var("x", false, Type::STR)).unwrap();
        let c = forest.enter(Some(b));

        assert_eq!(forest.find_var(c, "x", false).unwrap().ty, Type::STR);
        assert_eq!(forest.resolve_var(c, "x", false).map(|(_, local)| local), Some(true));

        forest.declare_var(c, var("x", false, Type::F64)).unwrap();
        assert_eq!(forest.find_var(c, "x", false).unwrap().ty, Type::F64);

        assert!(forest.leave(b).is_none(), "only the innermost scope can be left");
        forest.leave(c).unwrap();
        assert_eq!(forest.find_var(b, "x", false).unwrap().ty, Type::STR);
        forest.leave(b).unwrap();
        assert_eq!(forest.find_var(a, "x", false).unwrap().ty, Type::INT);
        forest.leave(a).unwrap();

        let top = forest.enter(None);
        let (global, local) = forest.resolve_var(top, "x", false).unwrap();
        assert_eq!(global.ty, Type::BOOL);
        assert!(!local);
    }

    #[test]
    fn test_linkage_is_part_of_the_key() {
        let sema = sema_with_global_x();
        let mut forest = ScopeForest::new(&sema);

        let a = forest.enter(None);
        forest.declare_var(a, var("x", true, Type::STR)).unwrap();
        let b = forest.enter(Some(a));

        assert_eq!(forest.find_var(b, "x", true).unwrap().ty, Type::STR);
        assert_eq!(forest.find_var(b, "x", false).unwrap().ty, Type::BOOL);
        assert!(forest.find_var(b, "y", true).is_none());
    }

    #[test]
    fn test_non_lexical_lookups_skip_blocks() {
        let sema = sema_with_global_x();
        let mut forest = ScopeForest::new(&sema);

        let a = forest.enter(None);
        forest.checkers[0]
            .table
            .add_struct(StructSymbol {
                ident: "Local".into(),
                loc: Loc::default(),
                cpp_linked: false,
                fields: Vec::new(),
                package: None,
            })
            .unwrap();
        let b = forest.enter(Some(a));

        assert!(forest.find_struct(b, "Local", false).is_none());
        assert!(forest.find_struct(b, "Point", false).is_some());
        assert!(forest.cursor(b).find_struct("Point", false).is_some());
        assert!(forest.find_package(b, "geo").is_none());
        assert!(forest.select_package(b, None).is_none());
    }

    #[test]
    fn test_flags_are_inherited() {
        let sema = sema_with_global_x();
        let mut forest = ScopeForest::new(&sema);

        let root = forest.enter(None);
        assert!(!forest.is_unsafe(root));
        let block = forest.enter(Some(root));
        forest.scope_mut(block).unwrap().unsafety = true;
        forest.scope_mut(block).unwrap().deferred = true;
        let inner = forest.enter(Some(block));

        assert!(forest.is_unsafe(inner));
        assert!(forest.in_deferred(inner));
        assert_eq!(forest.scope(inner).unwrap().parent, Some(block));
        assert!(!forest.is_unsafe(root));
    }

    #[test]
    fn test_checker_is_bound_to_its_block() {
        let sema = sema_with_global_x();
        let body = Block::new(Vec::new(), Span::new(3, 9));
        let mut forest = ScopeForest::new(&sema);

        let root = forest.enter(None);
        let inner = forest.enter(Some(root));
        assert!(forest.tree(inner).is_none());

        forest.check(inner, &body, Scope::new(Some(root), true, false));
        assert!(std::ptr::eq(forest.tree(inner).unwrap(), &body));
        assert!(forest.tree(root).is_none());
        assert!(forest.is_unsafe(inner));
        assert_eq!(forest.leave(inner).unwrap().parent, Some(root));
    }

    #[test]
    fn test_duplicate_in_same_block() {
        let sema = sema_with_global_x();
        let mut forest = ScopeForest::new(&sema);
        let a = forest.enter(None);
        forest.declare_var(a, var("n", false, Type::INT)).unwrap();
        let err = forest.declare_var(a, var("n", false, Type::INT)).unwrap_err();
        assert_eq!(err.to_string(), "'n' is already declared as a variable");
    }
}
