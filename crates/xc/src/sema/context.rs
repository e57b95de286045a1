//! Semantic context: the root of every lookup chain

use std::sync::Arc;

use super::package::Package;
use super::symbol::{EnumSymbol, FnSymbol, StructSymbol, TraitSymbol, TypeAliasSymbol, VarSymbol};
use super::table::SymbolTable;
use super::types::SymbolRef;

/// Name resolution interface shared by [`Sema`], symbol tables and scope
/// cursors. Every query answers `None` on a miss.
pub trait Lookup {
    fn find_package(&self, ident: &str) -> Option<&Package>;
    fn find_var(&self, ident: &str, cpp: bool) -> Option<&VarSymbol>;
    fn find_type_alias(&self, ident: &str, cpp: bool) -> Option<&TypeAliasSymbol>;
    fn find_struct(&self, ident: &str, cpp: bool) -> Option<&StructSymbol>;
    fn find_fn(&self, ident: &str, cpp: bool) -> Option<&FnSymbol>;
    fn find_trait(&self, ident: &str) -> Option<&TraitSymbol>;
    fn find_enum(&self, ident: &str) -> Option<&EnumSymbol>;
}

impl Lookup for SymbolTable {
    fn find_package(&self, _ident: &str) -> Option<&Package> {
        None
    }

    fn find_var(&self, ident: &str, cpp: bool) -> Option<&VarSymbol> {
        SymbolTable::find_var(self, ident, cpp)
    }

    fn find_type_alias(&self, ident: &str, cpp: bool) -> Option<&TypeAliasSymbol> {
        SymbolTable::find_type_alias(self, ident, cpp)
    }

    fn find_struct(&self, ident: &str, cpp: bool) -> Option<&StructSymbol> {
        SymbolTable::find_struct(self, ident, cpp)
    }

    fn find_fn(&self, ident: &str, cpp: bool) -> Option<&FnSymbol> {
        SymbolTable::find_fn(self, ident, cpp)
    }

    fn find_trait(&self, ident: &str) -> Option<&TraitSymbol> {
        SymbolTable::find_trait(self, ident)
    }

    fn find_enum(&self, ident: &str) -> Option<&EnumSymbol> {
        SymbolTable::find_enum(self, ident)
    }
}

/// Program-wide declarations seen from one home.
///
/// `home` is `None` for the root program, whose globals are its own table.
/// A package view (see [`Sema::for_package`]) uses the package table as
/// globals, so package code resolves its own names first.
#[derive(Debug, Clone)]
pub struct Sema {
    pub home: Option<String>,
    pub globals: Arc<SymbolTable>,
    pub packages: Vec<Arc<Package>>,
}

impl Sema {
    pub fn new(globals: SymbolTable, packages: Vec<Arc<Package>>) -> Self {
        Self {
            home: None,
            globals: Arc::new(globals),
            packages,
        }
    }

    /// View of the same packages from inside `package`
    pub fn for_package(&self, package: &Arc<Package>) -> Sema {
        Sema {
            home: Some(package.ident.clone()),
            globals: Arc::clone(&package.table),
            packages: self.packages.clone(),
        }
    }

    /// First package accepted by `predicate`; `None` without a predicate
    pub fn select_package(&self, predicate: Option<&dyn Fn(&Package) -> bool>) -> Option<&Package> {
        let predicate = predicate?;
        self.packages
            .iter()
            .map(|p| &**p)
            .find(|package| predicate(package))
    }

    /// Table a symbol reference lives in
    fn table_of(&self, sym: &SymbolRef) -> Option<&SymbolTable> {
        match &sym.package {
            Some(ident) if self.home.as_deref() != Some(ident.as_str()) => {
                self.find_package(ident).map(|p| p.table.as_ref())
            }
            _ => Some(self.globals.as_ref()),
        }
    }

    pub fn struct_by_ref(&self, sym: &SymbolRef) -> Option<&StructSymbol> {
        self.table_of(sym)?.find_struct(&sym.ident, sym.cpp_linked)
    }

    pub fn trait_by_ref(&self, sym: &SymbolRef) -> Option<&TraitSymbol> {
        self.table_of(sym)?.find_trait(&sym.ident)
    }

    pub fn var_by_ref(&self, sym: &SymbolRef) -> Option<&VarSymbol> {
        self.table_of(sym)?.find_var(&sym.ident, sym.cpp_linked)
    }
}

impl Lookup for Sema {
    fn find_package(&self, ident: &str) -> Option<&Package> {
        self.packages
            .iter()
            .map(|p| &**p)
            .find(|package| package.ident == ident)
    }

    fn find_var(&self, ident: &str, cpp: bool) -> Option<&VarSymbol> {
        self.globals.find_var(ident, cpp)
    }

    fn find_type_alias(&self, ident: &str, cpp: bool) -> Option<&TypeAliasSymbol> {
        self.globals.find_type_alias(ident, cpp)
    }

    fn find_struct(&self, ident: &str, cpp: bool) -> Option<&StructSymbol> {
        self.globals.find_struct(ident, cpp)
    }

    fn find_fn(&self, ident: &str, cpp: bool) -> Option<&FnSymbol> {
        self.globals.find_fn(ident, cpp)
    }

    fn find_trait(&self, ident: &str) -> Option<&TraitSymbol> {
        self.globals.find_trait(ident)
    }

    fn find_enum(&self, ident: &str) -> Option<&EnumSymbol> {
        self.globals.find_enum(ident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Loc;
    use crate::sema::symbol::{Field, StructSymbol};
    use crate::sema::types::Type;
    use pretty_assertions::assert_eq;

    fn point(package: &str, fields: &[&str]) -> StructSymbol {
        StructSymbol {
            ident: "Point".to_string(),
            loc: Loc::default(),
            cpp_linked: false,
            fields: fields
                .iter()
                .map(|f| Field {
                    ident: f.to_string(),
                    loc: Loc::default(),
                    ty: Type::F64,
                })
                .collect(),
            package: Some(package.to_string()),
        }
    }

    fn package_with_point(ident: &str, fields: &[&str]) -> Arc<Package> {
        let mut table = SymbolTable::new();
        table.add_struct(point(ident, fields)).unwrap();
        Arc::new(Package::new(ident, format!("std/{}", ident), table))
    }

    fn two_package_sema() -> Sema {
        Sema::new(
            SymbolTable::new(),
            vec![
                package_with_point("geo", &["x", "y"]),
                package_with_point("gfx", &["x", "y", "z"]),
            ],
        )
    }

    #[test]
    fn test_select_package_by_predicate() {
        let sema = two_package_sema();

        let has_point = |p: &Package| p.table.find_struct("Point", false).is_some();
        let first = sema.select_package(Some(&has_point)).unwrap();
        assert_eq!(first.ident, "geo");

        let is_gfx = |p: &Package| p.ident == "gfx";
        let gfx = sema.select_package(Some(&is_gfx)).unwrap();
        assert_eq!(gfx.table.find_struct("Point", false).unwrap().fields.len(), 3);

        let none = |_: &Package| false;
        assert!(sema.select_package(Some(&none)).is_none());
        assert!(sema.select_package(None).is_none());
    }

    #[test]
    fn test_lookup_misses_are_absent() {
        let sema = two_package_sema();
        assert!(sema.find_package("net").is_none());
        assert!(sema.find_var("x", false).is_none());
        assert!(sema.find_struct("Point", false).is_none());
        assert!(sema.find_trait("Shape").is_none());
        assert!(sema.find_enum("Color").is_none());
        assert!(sema.find_type_alias("Id", true).is_none());
        assert!(sema.find_fn("main", false).is_none());
    }

    #[test]
    fn test_refs_follow_owning_package() {
        let sema = two_package_sema();
        let gfx_point = SymbolRef::new("Point", false, Some("gfx".into()));
        assert_eq!(sema.struct_by_ref(&gfx_point).unwrap().fields.len(), 3);

        let gfx = Arc::clone(&sema.packages[1]);
        let view = sema.for_package(&gfx);
        assert_eq!(view.home.as_deref(), Some("gfx"));
        assert_eq!(view.find_struct("Point", false).unwrap().fields.len(), 3);
        assert_eq!(view.struct_by_ref(&gfx_point).unwrap().fields.len(), 3);

        let missing = SymbolRef::new("Point", false, Some("net".into()));
        assert!(sema.struct_by_ref(&missing).is_none());
    }
}
