//! Load phase
//!
//! Builds the global table of a package or of the root program before any
//! function body is checked. Names are registered first so declaration order
//! never matters at global level; then aliases are resolved to a fixpoint,
//! and finally every remaining signature.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::context::Sema;
use super::package::Package;
use super::resolve::{value_type_error, ResolveError, TypeResolver};
use super::symbol::{
    EnumItem, EnumSymbol, Field, FnSymbol, Param, StructSymbol, TraitMethod, TraitSymbol,
    TypeAliasSymbol, VarSymbol,
};
use super::table::SymbolTable;
use super::types::{FnSig, SymbolRef, Type};
use super::Unit;
use crate::common::{CompilerLog, FileId, Loc, SourceMap, Span};
use crate::frontend::ast::{
    EnumDecl, Expr, ExprKind, FnDecl, Item, ItemKind, StructDecl, TraitDecl, TypeAliasDecl,
    TypeExpr, VarDecl,
};
use crate::types::TypeTag;

/// Load the declarations of package `ident` from its parsed units.
///
/// `packages` holds the packages loaded before this one; they are the only
/// ones its code may refer to.
pub fn load_package(
    ident: &str,
    dir: &Path,
    units: &[Unit],
    packages: &[Arc<Package>],
    sources: &SourceMap,
) -> (Package, Vec<CompilerLog>) {
    debug!(package = ident, units = units.len(), "loading package");
    let mut loader = Loader::new(Some(ident.to_string()), packages.to_vec(), sources);
    loader.load(units);
    let Loader { sema, logs, .. } = loader;
    let table = Arc::try_unwrap(sema.globals).unwrap_or_else(|shared| (*shared).clone());
    (Package::new(ident, dir, table), logs)
}

/// Load the root program's declarations on top of the loaded packages
pub fn load_program(
    units: &[Unit],
    packages: Vec<Arc<Package>>,
    sources: &SourceMap,
) -> (Sema, Vec<CompilerLog>) {
    debug!(units = units.len(), packages = packages.len(), "loading program");
    let mut loader = Loader::new(None, packages, sources);
    loader.load(units);
    (loader.sema, loader.logs)
}

type Declared<'u> = Vec<(&'u Unit, &'u Item)>;

struct Loader<'s> {
    sema: Sema,
    sources: &'s SourceMap,
    logs: Vec<CompilerLog>,
}

impl<'s> Loader<'s> {
    fn new(home: Option<String>, packages: Vec<Arc<Package>>, sources: &'s SourceMap) -> Self {
        let mut sema = Sema::new(SymbolTable::new(), packages);
        sema.home = home;
        Self {
            sema,
            sources,
            logs: Vec::new(),
        }
    }

    fn load(&mut self, units: &[Unit]) {
        let declared = self.register(units);
        self.resolve_aliases(&declared);
        for &(unit, item) in &declared {
            self.resolve_item(unit, item);
        }
        self.check_recursive_structs();
    }

    fn table_mut(&mut self) -> &mut SymbolTable {
        Arc::make_mut(&mut self.sema.globals)
    }

    fn error(&mut self, loc: Loc, message: impl Into<String>) {
        self.logs.push(CompilerLog::error(self.sources, loc, message));
    }

    fn error_at(&mut self, file: FileId, span: Span, message: impl Into<String>) {
        self.error(Loc::new(file, span), message);
    }

    fn resolve(&mut self, unit: &Unit, ty: &TypeExpr) -> Type {
        let result = TypeResolver::new(&self.sema)
            .with_uses(&unit.ast.uses)
            .resolve(ty);
        match result {
            Ok(ty) => ty,
            Err(err) => {
                self.error_at(unit.file, err.span(), err.message());
                Type::Unresolved
            }
        }
    }

    /// Resolve a type that must be storable by value
    fn resolve_value(&mut self, unit: &Unit, ty: &TypeExpr) -> Type {
        let resolved = self.resolve(unit, ty);
        match value_type_error(&resolved) {
            Some(message) => {
                self.error_at(unit.file, ty.span, message);
                Type::Unresolved
            }
            None => resolved,
        }
    }

    // ------------------------------------------------------------------
    // Phase 1: names
    // ------------------------------------------------------------------

    fn register<'u>(&mut self, units: &'u [Unit]) -> Declared<'u> {
        let mut declared = Vec::new();
        for unit in units {
            for item in &unit.ast.items {
                if self.register_item(unit, item) {
                    declared.push((unit, item));
                }
            }
        }
        declared
    }

    fn register_item(&mut self, unit: &Unit, item: &Item) -> bool {
        let name = item.ident();
        let loc = Loc::new(unit.file, name.span);
        let ident = name.name.clone();
        let cpp = item.cpp;
        let package = self.sema.home.clone();

        let is_type = matches!(
            item.kind,
            ItemKind::TypeAlias(_) | ItemKind::Struct(_) | ItemKind::Trait(_) | ItemKind::Enum(_)
        );
        if is_type && !cpp && TypeTag::primitive(&ident).is_some() {
            self.error(loc, format!("'{}' is a primitive type and cannot be redeclared", ident));
            return false;
        }

        let result = match &item.kind {
            ItemKind::Struct(_) => self.table_mut().add_struct(StructSymbol {
                ident,
                loc,
                cpp_linked: cpp,
                fields: Vec::new(),
                package,
            }),
            ItemKind::Enum(_) | ItemKind::Trait(_) if cpp => {
                let what = if matches!(item.kind, ItemKind::Enum(_)) { "enum" } else { "trait" };
                self.error(loc, format!("{} '{}' cannot have foreign linkage", what, ident));
                return false;
            }
            ItemKind::Enum(_) => self.table_mut().add_enum(EnumSymbol {
                ident,
                loc,
                cpp_linked: false,
                repr: TypeTag::Int,
                items: Vec::new(),
                package,
            }),
            ItemKind::Trait(_) => self.table_mut().add_trait(TraitSymbol {
                ident,
                loc,
                cpp_linked: false,
                methods: Vec::new(),
                package,
            }),
            ItemKind::TypeAlias(_) => self.table_mut().add_type_alias(TypeAliasSymbol {
                ident,
                loc,
                cpp_linked: cpp,
                ty: Type::Unresolved,
            }),
            ItemKind::Fn(decl) => {
                self.check_fn_shape(loc, cpp, decl);
                self.table_mut().add_fn(FnSymbol {
                    ident,
                    loc,
                    cpp_linked: cpp,
                    params: Vec::new(),
                    ret: Type::Unresolved,
                    variadic: cpp && decl.variadic,
                    package,
                })
            }
            ItemKind::Var(decl) => {
                self.check_var_shape(loc, cpp, decl);
                self.table_mut().add_var(VarSymbol {
                    ident,
                    loc,
                    cpp_linked: cpp,
                    ty: Type::Unresolved,
                    mutable: !decl.constant,
                    constant: decl.constant,
                    local: false,
                    local_id: None,
                    package,
                })
            }
        };

        match result {
            Ok(()) => true,
            Err(duplicate) => {
                self.error(loc, duplicate.to_string());
                false
            }
        }
    }

    fn check_fn_shape(&mut self, loc: Loc, cpp: bool, decl: &FnDecl) {
        let name = &decl.name.name;
        if cpp && decl.body.is_some() {
            self.error(loc, format!("foreign function '{}' cannot have a body", name));
        }
        if !cpp && decl.body.is_none() {
            self.error(loc, format!("function '{}' has no body", name));
        }
        if !cpp && decl.variadic {
            self.error(loc, format!("only foreign functions can be variadic, '{}' is not", name));
        }
    }

    fn check_var_shape(&mut self, loc: Loc, cpp: bool, decl: &VarDecl) {
        let name = &decl.name.name;
        if cpp && decl.init.is_some() {
            self.error(loc, format!("foreign variable '{}' cannot have an initializer", name));
        }
        if cpp && decl.ty.is_none() {
            self.error(loc, format!("foreign variable '{}' needs a type", name));
        }
        if !cpp && decl.constant && decl.init.is_none() {
            self.error(loc, format!("constant '{}' needs a value", name));
        }
    }

    // ------------------------------------------------------------------
    // Phase 2: aliases
    // ------------------------------------------------------------------

    fn resolve_aliases(&mut self, declared: &Declared<'_>) {
        let mut pending: Vec<(&Unit, &TypeAliasDecl, bool)> = declared
            .iter()
            .filter_map(|&(unit, item)| match &item.kind {
                ItemKind::TypeAlias(decl) => Some((unit, decl, item.cpp)),
                _ => None,
            })
            .collect();
        let mut keys: HashSet<(String, bool)> = pending
            .iter()
            .map(|(_, decl, cpp)| (decl.name.name.clone(), *cpp))
            .collect();

        while !pending.is_empty() {
            let mut waiting = Vec::new();
            let before = pending.len();

            for (unit, decl, cpp) in pending {
                let result = TypeResolver::new(&self.sema)
                    .with_uses(&unit.ast.uses)
                    .with_pending(&keys)
                    .resolve(&decl.ty);
                let ty = match result {
                    Err(ResolveError::Pending { .. }) => {
                        waiting.push((unit, decl, cpp));
                        continue;
                    }
                    Err(err) => {
                        self.error_at(unit.file, err.span(), err.message());
                        Type::Unresolved
                    }
                    Ok(ty) => ty,
                };
                if let Some(alias) = self.table_mut().type_alias_mut(&decl.name.name, cpp) {
                    alias.ty = ty;
                }
                keys.remove(&(decl.name.name.clone(), cpp));
            }

            if waiting.len() == before {
                for (unit, decl, _) in waiting {
                    self.error_at(
                        unit.file,
                        decl.name.span,
                        format!("type alias '{}' is cyclic", decl.name.name),
                    );
                }
                break;
            }
            pending = waiting;
        }
    }

    // ------------------------------------------------------------------
    // Phase 3: signatures
    // ------------------------------------------------------------------

    fn resolve_item(&mut self, unit: &Unit, item: &Item) {
        match &item.kind {
            ItemKind::TypeAlias(_) => {}
            ItemKind::Struct(decl) => self.resolve_struct(unit, item.cpp, decl),
            ItemKind::Enum(decl) => self.resolve_enum(unit, decl),
            ItemKind::Trait(decl) => self.resolve_trait(unit, decl),
            ItemKind::Fn(decl) => self.resolve_fn(unit, item.cpp, decl),
            ItemKind::Var(decl) => self.resolve_global(unit, item.cpp, decl),
        }
    }

    fn resolve_struct(&mut self, unit: &Unit, cpp: bool, decl: &StructDecl) {
        let mut fields: Vec<Field> = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let ty = self.resolve_value(unit, &field.ty);
            if fields.iter().any(|f| f.ident == field.name.name) {
                self.error_at(
                    unit.file,
                    field.name.span,
                    format!("duplicate field '{}' in struct '{}'", field.name.name, decl.name.name),
                );
                continue;
            }
            fields.push(Field {
                ident: field.name.name.clone(),
                loc: Loc::new(unit.file, field.name.span),
                ty,
            });
        }
        if let Some(symbol) = self.table_mut().struct_mut(&decl.name.name, cpp) {
            symbol.fields = fields;
        }
    }

    fn resolve_enum(&mut self, unit: &Unit, decl: &EnumDecl) {
        let repr = match &decl.repr {
            None => TypeTag::Int,
            Some(expr) => match self.resolve(unit, expr) {
                Type::Prim(tag) if tag.is_integer() => tag,
                Type::Unresolved => TypeTag::Int,
                other => {
                    self.error_at(
                        unit.file,
                        expr.span,
                        format!("enum representation must be an integer type, found '{}'", other),
                    );
                    TypeTag::Int
                }
            },
        };

        let mut items: Vec<EnumItem> = Vec::with_capacity(decl.items.len());
        let mut next: i128 = 0;
        for item in &decl.items {
            let name = &item.name.name;
            let value = match &item.value {
                None => next,
                Some(Expr {
                    kind: ExprKind::Int(value),
                    ..
                }) => *value,
                Some(expr) => {
                    self.error_at(
                        unit.file,
                        expr.span,
                        format!("value of '{}::{}' must be an integer literal", decl.name.name, name),
                    );
                    next
                }
            };
            if !repr.fits(value) {
                self.error_at(
                    unit.file,
                    item.name.span,
                    format!("value {} of '{}::{}' overflows {}", value, decl.name.name, name, repr),
                );
            }
            if items.iter().any(|i| &i.ident == name) {
                self.error_at(
                    unit.file,
                    item.name.span,
                    format!("duplicate item '{}' in enum '{}'", name, decl.name.name),
                );
                continue;
            }
            items.push(EnumItem {
                ident: name.clone(),
                loc: Loc::new(unit.file, item.name.span),
                value,
            });
            next = value + 1;
        }

        if let Some(symbol) = self.table_mut().enum_mut(&decl.name.name) {
            symbol.repr = repr;
            symbol.items = items;
        }
    }

    fn resolve_trait(&mut self, unit: &Unit, decl: &TraitDecl) {
        let mut methods: Vec<TraitMethod> = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            let params = self.resolve_params(unit, &method.params);
            let ret = self.resolve_ret(unit, method.ret.as_ref());
            if methods.iter().any(|m| m.ident == method.name.name) {
                self.error_at(
                    unit.file,
                    method.name.span,
                    format!("duplicate method '{}' in trait '{}'", method.name.name, decl.name.name),
                );
                continue;
            }
            methods.push(TraitMethod {
                ident: method.name.name.clone(),
                loc: Loc::new(unit.file, method.name.span),
                sig: FnSig {
                    params: params.into_iter().map(|p| p.ty).collect(),
                    ret: Box::new(ret),
                    variadic: false,
                },
            });
        }
        if let Some(symbol) = self.table_mut().trait_mut(&decl.name.name) {
            symbol.methods = methods;
        }
    }

    fn resolve_fn(&mut self, unit: &Unit, cpp: bool, decl: &FnDecl) {
        let params = self.resolve_params(unit, &decl.params);
        let ret = self.resolve_ret(unit, decl.ret.as_ref());
        if let Some(symbol) = self.table_mut().fn_mut(&decl.name.name, cpp) {
            symbol.params = params;
            symbol.ret = ret;
        }
    }

    fn resolve_params(&mut self, unit: &Unit, params: &[crate::frontend::ast::Param]) -> Vec<Param> {
        let mut resolved: Vec<Param> = Vec::with_capacity(params.len());
        for param in params {
            let ty = self.resolve_value(unit, &param.ty);
            if resolved.iter().any(|p| p.ident == param.name.name) {
                self.error_at(
                    unit.file,
                    param.name.span,
                    format!("duplicate parameter '{}'", param.name.name),
                );
            }
            resolved.push(Param {
                ident: param.name.name.clone(),
                loc: Loc::new(unit.file, param.name.span),
                ty,
                mutable: param.mutable,
            });
        }
        resolved
    }

    fn resolve_ret(&mut self, unit: &Unit, ret: Option<&TypeExpr>) -> Type {
        let Some(ret) = ret else {
            return Type::VOID;
        };
        let ty = self.resolve(unit, ret);
        if let Type::Trait(r) = &ty {
            self.error_at(
                unit.file,
                ret.span,
                format!("trait '{}' can only be used behind a pointer", r),
            );
            return Type::Unresolved;
        }
        ty
    }

    fn resolve_global(&mut self, unit: &Unit, cpp: bool, decl: &VarDecl) {
        let ty = match (&decl.ty, &decl.init) {
            (Some(ty), _) => self.resolve_value(unit, ty),
            (None, Some(init)) => match self.literal_type(unit, init) {
                Some(ty) => ty,
                None => {
                    self.error_at(
                        unit.file,
                        decl.name.span,
                        format!("cannot infer the type of '{}', add a type annotation", decl.name.name),
                    );
                    Type::Unresolved
                }
            },
            (None, None) => Type::Unresolved,
        };
        if let Some(symbol) = self.table_mut().var_mut(&decl.name.name, cpp) {
            symbol.ty = ty;
        }
    }

    /// Type of a global initializer that can be known without checking it
    fn literal_type(&mut self, unit: &Unit, expr: &Expr) -> Option<Type> {
        match &expr.kind {
            ExprKind::Int(_) => Some(Type::INT),
            ExprKind::Float(_) => Some(Type::F64),
            ExprKind::Bool(_) => Some(Type::BOOL),
            ExprKind::Char(_) => Some(Type::CHAR),
            ExprKind::Str(_) => Some(Type::STR),
            ExprKind::Cast { ty, .. } => Some(self.resolve_value(unit, ty)),
            ExprKind::Array(elems) => {
                let first = elems.first()?;
                let elem = self.literal_type(unit, first)?;
                Some(Type::Slice(Box::new(elem)))
            }
            _ => None,
        }
    }

    fn check_recursive_structs(&mut self) {
        let table = Arc::clone(&self.sema.globals);
        for decl in table.structs() {
            if decl.cpp_linked {
                continue;
            }
            let target = decl.to_ref();
            if contains_by_value(&table, decl, &target, &mut HashSet::new()) {
                self.error(
                    decl.loc,
                    format!("struct '{}' contains itself by value", decl.ident),
                );
            }
        }
    }
}

/// Whether `target` is reachable from `from` through by-value fields
fn contains_by_value(
    table: &SymbolTable,
    from: &StructSymbol,
    target: &SymbolRef,
    seen: &mut HashSet<SymbolRef>,
) -> bool {
    for field in &from.fields {
        let Type::Struct(next) = &field.ty else {
            continue;
        };
        if next == target {
            return true;
        }
        if next.package != target.package || !seen.insert(next.clone()) {
            continue;
        }
        if let Some(decl) = table.find_struct(&next.ident, next.cpp_linked) {
            if contains_by_value(table, decl, target, seen) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::has_errors;
    use crate::frontend::Parser;
    use crate::sema::context::Lookup;
    use pretty_assertions::assert_eq;

    fn unit(sources: &mut SourceMap, path: &str, text: &str) -> Unit {
        let file = sources.add(path, text);
        let ast = Parser::new(text).parse_unit().unwrap();
        Unit { file, ast }
    }

    fn load(text: &str) -> (Sema, Vec<String>) {
        let mut sources = SourceMap::new();
        let units = vec![unit(&mut sources, "main.x", text)];
        let (sema, logs) = load_program(&units, Vec::new(), &sources);
        (sema, logs.iter().map(|l| l.to_string()).collect())
    }

    fn geo_package(sources: &mut SourceMap) -> Arc<Package> {
        let units = vec![unit(sources, "std/geo/point.x", "struct Point { x f64, y f64 }\n")];
        let (package, logs) = load_package("geo", Path::new("std/geo"), &units, &[], sources);
        assert!(!has_errors(&logs));
        Arc::new(package)
    }

    #[test]
    fn test_aliases_resolve_in_any_order() {
        let (sema, logs) = load("type A = B\ntype B = *C\nstruct C { x int }\n");
        assert!(logs.is_empty(), "{:?}", logs);
        let c = Type::Struct(SymbolRef::new("C", false, None));
        assert_eq!(sema.find_type_alias("A", false).unwrap().ty, Type::Ptr(Box::new(c)));
    }

    #[test]
    fn test_cyclic_aliases() {
        let (_, logs) = load("type A = B\ntype B = A\n");
        assert_eq!(
            logs,
            vec![
                "ERROR: main.x:1:6 type alias 'A' is cyclic",
                "ERROR: main.x:2:6 type alias 'B' is cyclic",
            ]
        );
    }

    #[test]
    fn test_duplicate_reported_at_second_declaration() {
        let (sema, logs) = load("struct P { x int }\nfn P() {}\n");
        assert_eq!(logs, vec!["ERROR: main.x:2:4 'P' is already declared as a struct"]);
        assert_eq!(sema.find_struct("P", false).unwrap().fields.len(), 1);
        assert!(sema.find_fn("P", false).is_none());
    }

    #[test]
    fn test_foreign_and_ordinary_share_a_name() {
        let (sema, logs) = load("cpp fn puts(s str) int\nfn puts() {}\n");
        assert!(logs.is_empty(), "{:?}", logs);
        assert_eq!(sema.find_fn("puts", true).unwrap().params.len(), 1);
        assert!(sema.find_fn("puts", false).unwrap().params.is_empty());
    }

    #[test]
    fn test_enum_values() {
        let (sema, logs) = load("enum Color : u8 { Red, Green = 10, Blue }\nenum Big : i8 { A = 200 }\n");
        let color = sema.find_enum("Color").unwrap();
        let values: Vec<i128> = color.items.iter().map(|i| i.value).collect();
        assert_eq!(values, vec![0, 10, 11]);
        assert_eq!(color.repr, TypeTag::U8);
        assert_eq!(logs, vec!["ERROR: main.x:2:17 value 200 of 'Big::A' overflows i8"]);
    }

    #[test]
    fn test_struct_by_value_recursion() {
        let (_, logs) = load("struct Node { next Node }\nstruct List { next *List }\n");
        assert_eq!(logs, vec!["ERROR: main.x:1:8 struct 'Node' contains itself by value"]);
    }

    #[test]
    fn test_trait_needs_pointer() {
        let (_, logs) = load("trait Shape { fn area() f64 }\nstruct Holder { s Shape, p *Shape }\n");
        assert_eq!(
            logs,
            vec!["ERROR: main.x:2:19 trait 'Shape' can only be used behind a pointer"]
        );
    }

    #[test]
    fn test_global_types_from_literals() {
        let (sema, logs) = load("var a = 1\nconst s = \"x\"\nvar f = 1.5\nvar u = 3 as u8\nvar bad = a\n");
        assert_eq!(sema.find_var("a", false).unwrap().ty, Type::INT);
        assert_eq!(sema.find_var("s", false).unwrap().ty, Type::STR);
        assert!(sema.find_var("s", false).unwrap().constant);
        assert_eq!(sema.find_var("f", false).unwrap().ty, Type::F64);
        assert_eq!(sema.find_var("u", false).unwrap().ty, Type::Prim(TypeTag::U8));
        assert_eq!(
            logs,
            vec!["ERROR: main.x:5:5 cannot infer the type of 'bad', add a type annotation"]
        );
    }

    #[test]
    fn test_package_types_need_use() {
        let mut sources = SourceMap::new();
        let geo = geo_package(&mut sources);

        let without = vec![unit(&mut sources, "a.x", "struct S { p geo::Point }\n")];
        let (_, logs) = load_program(&without, vec![Arc::clone(&geo)], &sources);
        assert_eq!(logs[0].to_string(), "ERROR: a.x:1:14 package 'geo' is used without `use geo`");

        let with = vec![unit(&mut sources, "b.x", "use geo\nstruct S { p geo::Point }\n")];
        let (sema, logs) = load_program(&with, vec![geo], &sources);
        assert!(logs.is_empty());
        let field = &sema.find_struct("S", false).unwrap().fields[0];
        assert_eq!(field.ty, Type::Struct(SymbolRef::new("Point", false, Some("geo".into()))));
        assert!(sema.struct_by_ref(&SymbolRef::new("Point", false, Some("geo".into()))).is_some());
    }

    #[test]
    fn test_primitive_names_are_reserved() {
        let (_, logs) = load("struct int { x i8 }\ncpp struct size { }\n");
        assert_eq!(
            logs,
            vec!["ERROR: main.x:1:8 'int' is a primitive type and cannot be redeclared"]
        );
    }
}
