//! Flat symbol table of one declaration level
//!
//! Every kind keeps its own insertion-ordered list. Lookups are keyed by
//! (identifier, linkage): ordinary and `cpp` names live in independent
//! namespaces and never fall back to each other. Parents are never searched;
//! walking outward is the scope checker's job.

use std::collections::HashMap;

use thiserror::Error;

use super::symbol::{
    Decl, EnumSymbol, FnSymbol, StructSymbol, Symbol, SymbolKind, TraitSymbol, TypeAliasSymbol,
    VarSymbol,
};
use crate::common::Loc;

/// Rejected insertion: the (identifier, linkage) pair is taken
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{ident}' is already declared as a {kind}")]
pub struct Duplicate {
    pub ident: String,
    /// Kind of the earlier declaration
    pub kind: SymbolKind,
    pub previous: Loc,
}

#[derive(Debug, Clone)]
struct Namespace<T> {
    entries: Vec<T>,
    ordinary: HashMap<String, usize>,
    foreign: HashMap<String, usize>,
}

impl<T: Decl> Namespace<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            ordinary: HashMap::new(),
            foreign: HashMap::new(),
        }
    }

    fn index(&self, ident: &str, cpp: bool) -> Option<usize> {
        let map = if cpp { &self.foreign } else { &self.ordinary };
        map.get(ident).copied()
    }

    fn find(&self, ident: &str, cpp: bool) -> Option<&T> {
        self.index(ident, cpp).and_then(|i| self.entries.get(i))
    }

    fn find_mut(&mut self, ident: &str, cpp: bool) -> Option<&mut T> {
        self.index(ident, cpp).and_then(|i| self.entries.get_mut(i))
    }

    fn insert(&mut self, decl: T) {
        let map = if decl.cpp_linked() {
            &mut self.foreign
        } else {
            &mut self.ordinary
        };
        map.insert(decl.ident().to_string(), self.entries.len());
        self.entries.push(decl);
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    vars: Namespace<VarSymbol>,
    type_aliases: Namespace<TypeAliasSymbol>,
    structs: Namespace<StructSymbol>,
    fns: Namespace<FnSymbol>,
    traits: Namespace<TraitSymbol>,
    enums: Namespace<EnumSymbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            vars: Namespace::new(),
            type_aliases: Namespace::new(),
            structs: Namespace::new(),
            fns: Namespace::new(),
            traits: Namespace::new(),
            enums: Namespace::new(),
        }
    }

    pub fn find_var(&self, ident: &str, cpp: bool) -> Option<&VarSymbol> {
        self.vars.find(ident, cpp)
    }

    pub fn find_type_alias(&self, ident: &str, cpp: bool) -> Option<&TypeAliasSymbol> {
        self.type_aliases.find(ident, cpp)
    }

    pub fn find_struct(&self, ident: &str, cpp: bool) -> Option<&StructSymbol> {
        self.structs.find(ident, cpp)
    }

    pub fn find_fn(&self, ident: &str, cpp: bool) -> Option<&FnSymbol> {
        self.fns.find(ident, cpp)
    }

    pub fn find_trait(&self, ident: &str) -> Option<&TraitSymbol> {
        self.traits.find(ident, false)
    }

    pub fn find_enum(&self, ident: &str) -> Option<&EnumSymbol> {
        self.enums.find(ident, false)
    }

    /// Any declaration of this level with the given key
    pub fn find_any(&self, ident: &str, cpp: bool) -> Option<Symbol<'_>> {
        if let Some(s) = self.vars.find(ident, cpp) {
            return Some(Symbol::Var(s));
        }
        if let Some(s) = self.type_aliases.find(ident, cpp) {
            return Some(Symbol::TypeAlias(s));
        }
        if let Some(s) = self.structs.find(ident, cpp) {
            return Some(Symbol::Struct(s));
        }
        if let Some(s) = self.fns.find(ident, cpp) {
            return Some(Symbol::Fn(s));
        }
        if let Some(s) = self.traits.find(ident, cpp) {
            return Some(Symbol::Trait(s));
        }
        self.enums.find(ident, cpp).map(Symbol::Enum)
    }

    fn ensure_free(&self, ident: &str, cpp: bool) -> Result<(), Duplicate> {
        match self.find_any(ident, cpp) {
            Some(existing) => Err(Duplicate {
                ident: ident.to_string(),
                kind: existing.kind(),
                previous: existing.loc().unwrap_or_default(),
            }),
            None => Ok(()),
        }
    }

    pub fn add_var(&mut self, var: VarSymbol) -> Result<(), Duplicate> {
        self.ensure_free(&var.ident, var.cpp_linked)?;
        self.vars.insert(var);
        Ok(())
    }

    pub fn add_type_alias(&mut self, alias: TypeAliasSymbol) -> Result<(), Duplicate> {
        self.ensure_free(&alias.ident, alias.cpp_linked)?;
        self.type_aliases.insert(alias);
        Ok(())
    }

    pub fn add_struct(&mut self, decl: StructSymbol) -> Result<(), Duplicate> {
        self.ensure_free(&decl.ident, decl.cpp_linked)?;
        self.structs.insert(decl);
        Ok(())
    }

    pub fn add_fn(&mut self, decl: FnSymbol) -> Result<(), Duplicate> {
        self.ensure_free(&decl.ident, decl.cpp_linked)?;
        self.fns.insert(decl);
        Ok(())
    }

    pub fn add_trait(&mut self, decl: TraitSymbol) -> Result<(), Duplicate> {
        self.ensure_free(&decl.ident, decl.cpp_linked)?;
        self.traits.insert(decl);
        Ok(())
    }

    pub fn add_enum(&mut self, decl: EnumSymbol) -> Result<(), Duplicate> {
        self.ensure_free(&decl.ident, decl.cpp_linked)?;
        self.enums.insert(decl);
        Ok(())
    }

    pub(crate) fn var_mut(&mut self, ident: &str, cpp: bool) -> Option<&mut VarSymbol> {
        self.vars.find_mut(ident, cpp)
    }

    pub(crate) fn type_alias_mut(&mut self, ident: &str, cpp: bool) -> Option<&mut TypeAliasSymbol> {
        self.type_aliases.find_mut(ident, cpp)
    }

    pub(crate) fn struct_mut(&mut self, ident: &str, cpp: bool) -> Option<&mut StructSymbol> {
        self.structs.find_mut(ident, cpp)
    }

    pub(crate) fn fn_mut(&mut self, ident: &str, cpp: bool) -> Option<&mut FnSymbol> {
        self.fns.find_mut(ident, cpp)
    }

    pub(crate) fn trait_mut(&mut self, ident: &str) -> Option<&mut TraitSymbol> {
        self.traits.find_mut(ident, false)
    }

    pub(crate) fn enum_mut(&mut self, ident: &str) -> Option<&mut EnumSymbol> {
        self.enums.find_mut(ident, false)
    }

    pub fn vars(&self) -> impl Iterator<Item = &VarSymbol> {
        self.vars.entries.iter()
    }

    pub fn type_aliases(&self) -> impl Iterator<Item = &TypeAliasSymbol> {
        self.type_aliases.entries.iter()
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructSymbol> {
        self.structs.entries.iter()
    }

    pub fn fns(&self) -> impl Iterator<Item = &FnSymbol> {
        self.fns.entries.iter()
    }

    pub fn traits(&self) -> impl Iterator<Item = &TraitSymbol> {
        self.traits.entries.iter()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumSymbol> {
        self.enums.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.entries.is_empty()
            && self.type_aliases.entries.is_empty()
            && self.structs.entries.is_empty()
            && self.fns.entries.is_empty()
            && self.traits.entries.is_empty()
            && self.enums.entries.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Span;
    use crate::sema::types::Type;
    use pretty_assertions::assert_eq;

    pub(crate) fn var(ident: &str, cpp: bool, at: usize) -> VarSymbol {
        VarSymbol {
            ident: ident.to_string(),
            loc: Loc::new(0, Span::new(at, at + ident.len())),
            cpp_linked: cpp,
            ty: Type::INT,
            mutable: true,
            constant: false,
            local: false,
            local_id: None,
            package: None,
        }
    }

    fn func(ident: &str, cpp: bool) -> FnSymbol {
        FnSymbol {
            ident: ident.to_string(),
            loc: Loc::default(),
            cpp_linked: cpp,
            params: Vec::new(),
            ret: Type::VOID,
            variadic: false,
            package: None,
        }
    }

    #[test]
    fn test_linkage_namespaces_are_independent() {
        let mut table = SymbolTable::new();
        table.add_var(var("x", false, 0)).unwrap();
        table.add_var(var("x", true, 10)).unwrap();

        assert_eq!(table.find_var("x", false).unwrap().loc.span.start, 0);
        assert_eq!(table.find_var("x", true).unwrap().loc.span.start, 10);
        assert!(table.find_var("y", false).is_none());
    }

    #[test]
    fn test_absent_on_miss() {
        let table = SymbolTable::new();
        assert!(table.find_var("nope", false).is_none());
        assert!(table.find_type_alias("nope", true).is_none());
        assert!(table.find_struct("nope", false).is_none());
        assert!(table.find_fn("nope", true).is_none());
        assert!(table.find_trait("nope").is_none());
        assert!(table.find_enum("nope").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_across_kinds() {
        let mut table = SymbolTable::new();
        table.add_var(var("main", false, 4)).unwrap();

        let err = table.add_fn(func("main", false)).unwrap_err();
        assert_eq!(err.ident, "main");
        assert_eq!(err.kind, SymbolKind::Var);
        assert_eq!(err.previous.span, Span::new(4, 8));
        assert_eq!(err.to_string(), "'main' is already declared as a variable");

        table.add_fn(func("main", true)).unwrap();
        assert!(table.find_fn("main", false).is_none());
    }

    #[test]
    fn test_insertion_order() {
        let mut table = SymbolTable::new();
        for name in ["c", "a", "b"] {
            table.add_fn(func(name, false)).unwrap();
        }
        let names: Vec<&str> = table.fns().map(|f| f.ident.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
