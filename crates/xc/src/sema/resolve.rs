//! Type expression resolution

use std::collections::HashSet;

use super::context::Lookup;
use super::types::{FnSig, Type};
use crate::common::Span;
use crate::frontend::ast::{Path, TypeExpr, TypeExprKind, UseDecl};
use crate::types::TypeTag;

/// Why a type expression did not resolve
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Name found nowhere
    Undefined { name: String, span: Span },
    /// Qualifier is not a loaded package
    UnknownPackage { name: String, span: Span },
    /// Package exists but the unit does not `use` it
    NotImported { name: String, span: Span },
    /// Refers to a type alias that is still being resolved
    Pending { name: String, span: Span },
    /// Too many path segments for a type
    Malformed { span: Span },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::Undefined { span, .. }
            | ResolveError::UnknownPackage { span, .. }
            | ResolveError::NotImported { span, .. }
            | ResolveError::Pending { span, .. }
            | ResolveError::Malformed { span } => *span,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ResolveError::Undefined { name, .. } => format!("undefined type '{}'", name),
            ResolveError::UnknownPackage { name, .. } => format!("package '{}' is not loaded", name),
            ResolveError::NotImported { name, .. } => {
                format!("package '{}' is used without `use {}`", name, name)
            }
            ResolveError::Pending { name, .. } => format!("type alias '{}' is not resolved yet", name),
            ResolveError::Malformed { .. } => "invalid type path".to_string(),
        }
    }
}

/// Why `ty` cannot be held by value, if it cannot
pub fn value_type_error(ty: &Type) -> Option<String> {
    match ty {
        Type::Trait(r) => Some(format!("trait '{}' can only be used behind a pointer", r)),
        Type::Prim(TypeTag::Void | TypeTag::Nil) => Some(format!("'{}' is not a value type", ty)),
        _ => None,
    }
}

/// Resolves type expressions against a lookup chain
pub struct TypeResolver<'r> {
    lookup: &'r dyn Lookup,
    /// Packages the unit imports; `None` disables the import check
    uses: Option<&'r [UseDecl]>,
    /// Aliases of the current level that are not resolved yet
    pending: Option<&'r HashSet<(String, bool)>>,
}

impl<'r> TypeResolver<'r> {
    pub fn new(lookup: &'r dyn Lookup) -> Self {
        Self {
            lookup,
            uses: None,
            pending: None,
        }
    }

    pub fn with_uses(mut self, uses: &'r [UseDecl]) -> Self {
        self.uses = Some(uses);
        self
    }

    pub fn with_pending(mut self, pending: &'r HashSet<(String, bool)>) -> Self {
        self.pending = Some(pending);
        self
    }

    pub fn resolve(&self, ty: &TypeExpr) -> Result<Type, ResolveError> {
        match &ty.kind {
            TypeExprKind::Path(path) => self.resolve_path(path),
            TypeExprKind::Ptr(inner) => Ok(Type::Ptr(Box::new(self.resolve(inner)?))),
            TypeExprKind::Slice(inner) => Ok(Type::Slice(Box::new(self.resolve(inner)?))),
            TypeExprKind::Fn { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.resolve(p))
                    .collect::<Result<Vec<_>, _>>()?;
                let ret = match ret {
                    Some(ret) => self.resolve(ret)?,
                    None => Type::VOID,
                };
                Ok(Type::Fn(FnSig {
                    params,
                    ret: Box::new(ret),
                    variadic: false,
                }))
            }
        }
    }

    fn resolve_path(&self, path: &Path) -> Result<Type, ResolveError> {
        let name = &path.name.name;

        if path.cpp {
            return self.resolve_in(self.lookup, name, true, path.span, true);
        }

        match path.qualifiers.as_slice() {
            [] => {
                if let Some(tag) = TypeTag::primitive(name) {
                    return Ok(Type::Prim(tag));
                }
                self.resolve_in(self.lookup, name, false, path.span, true)
            }
            [package] => {
                let table = self.package_table(&package.name, package.span)?;
                self.resolve_in(table, name, false, path.span, false)
            }
            _ => Err(ResolveError::Malformed { span: path.span }),
        }
    }

    fn package_table(&self, name: &str, span: Span) -> Result<&'r dyn Lookup, ResolveError> {
        let package = self
            .lookup
            .find_package(name)
            .ok_or_else(|| ResolveError::UnknownPackage {
                name: name.to_string(),
                span,
            })?;
        if let Some(uses) = self.uses {
            if !uses.iter().any(|u| u.name.name == name) {
                return Err(ResolveError::NotImported {
                    name: name.to_string(),
                    span,
                });
            }
        }
        Ok(package.table.as_ref())
    }

    fn resolve_in(
        &self,
        lookup: &dyn Lookup,
        name: &str,
        cpp: bool,
        span: Span,
        home: bool,
    ) -> Result<Type, ResolveError> {
        if let Some(alias) = lookup.find_type_alias(name, cpp) {
            let is_pending = home
                && self
                    .pending
                    .is_some_and(|p| p.contains(&(name.to_string(), cpp)));
            if is_pending {
                return Err(ResolveError::Pending {
                    name: name.to_string(),
                    span,
                });
            }
            return Ok(alias.ty.clone());
        }
        if let Some(decl) = lookup.find_struct(name, cpp) {
            return Ok(Type::Struct(decl.to_ref()));
        }
        if !cpp {
            if let Some(decl) = lookup.find_enum(name) {
                return Ok(Type::Enum(decl.to_ref()));
            }
            if let Some(decl) = lookup.find_trait(name) {
                return Ok(Type::Trait(decl.to_ref()));
            }
        }
        let shown = if cpp {
            format!("cpp::{}", name)
        } else {
            name.to_string()
        };
        Err(ResolveError::Undefined { name: shown, span })
    }
}
