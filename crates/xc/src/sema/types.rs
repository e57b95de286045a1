//! Resolved types
//!
//! A [`Type`] is what a written type expression means after name resolution.
//! Named kinds point back to their declarations through a [`SymbolRef`].

use std::fmt;

use crate::types::TypeTag;

/// Handle to a named declaration: identifier, linkage and owning package.
///
/// `package` is `None` for declarations of the root program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolRef {
    pub ident: String,
    pub cpp_linked: bool,
    pub package: Option<String>,
}

impl SymbolRef {
    pub fn new(ident: impl Into<String>, cpp_linked: bool, package: Option<String>) -> Self {
        Self {
            ident: ident.into(),
            cpp_linked,
            package,
        }
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cpp_linked {
            write!(f, "cpp::")?;
        }
        if let Some(package) = &self.package {
            write!(f, "{}::", package)?;
        }
        write!(f, "{}", self.ident)
    }
}

/// Function signature as a type
#[derive(Debug, Clone, PartialEq)]
pub struct FnSig {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Prim(TypeTag),
    Struct(SymbolRef),
    Enum(SymbolRef),
    Trait(SymbolRef),
    Ptr(Box<Type>),
    Slice(Box<Type>),
    Fn(FnSig),
    /// Result of a failed resolution; accepted everywhere to avoid
    /// cascading diagnostics
    Unresolved,
}

impl Type {
    pub const VOID: Type = Type::Prim(TypeTag::Void);
    pub const BOOL: Type = Type::Prim(TypeTag::Bool);
    pub const INT: Type = Type::Prim(TypeTag::Int);
    pub const STR: Type = Type::Prim(TypeTag::Str);
    pub const CHAR: Type = Type::Prim(TypeTag::Char);
    pub const F64: Type = Type::Prim(TypeTag::F64);
    pub const NIL: Type = Type::Prim(TypeTag::Nil);

    /// Classification tag of this type
    pub fn tag(&self) -> TypeTag {
        match self {
            Type::Prim(tag) => *tag,
            Type::Struct(_) | Type::Trait(_) => TypeTag::Struct,
            Type::Enum(_) => TypeTag::Enum,
            Type::Ptr(_) => TypeTag::Voidptr,
            Type::Slice(_) => TypeTag::Map,
            Type::Fn(_) => TypeTag::Func,
            Type::Unresolved => TypeTag::Id,
        }
    }

    pub fn prim(&self) -> Option<TypeTag> {
        match self {
            Type::Prim(tag) => Some(*tag),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Type::Unresolved)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Prim(TypeTag::Void))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Prim(TypeTag::Bool) | Type::Unresolved)
    }

    pub fn is_integer(&self) -> bool {
        self.prim().is_some_and(TypeTag::is_integer)
    }

    pub fn is_float(&self) -> bool {
        self.prim().is_some_and(TypeTag::is_float)
    }

    pub fn is_numeric(&self) -> bool {
        self.prim().is_some_and(TypeTag::is_numeric)
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Type::Prim(TypeTag::Str))
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    /// Pointers of any kind, `voidptr` included
    pub fn is_pointer_like(&self) -> bool {
        match self {
            Type::Ptr(_) => true,
            Type::Prim(tag) => tag.is_pointer(),
            _ => false,
        }
    }

    pub fn is_nilable(&self) -> bool {
        matches!(
            self,
            Type::Ptr(_)
                | Type::Slice(_)
                | Type::Fn(_)
                | Type::Prim(TypeTag::Voidptr | TypeTag::Any | TypeTag::Nil)
        )
    }

    /// Types that may not be held by value
    pub fn is_unsized(&self) -> bool {
        matches!(self, Type::Trait(_) | Type::Prim(TypeTag::Void | TypeTag::Nil))
    }

    /// Whether a value of type `from` can be stored where `self` is expected
    pub fn accepts(&self, from: &Type) -> bool {
        if self.is_unresolved() || from.is_unresolved() || self == from {
            return true;
        }
        match (self, from) {
            (Type::Prim(TypeTag::Any), _) => !from.is_void(),
            (_, Type::Prim(TypeTag::Nil)) => self.is_nilable(),
            (Type::Prim(TypeTag::Voidptr), Type::Ptr(_)) => true,
            _ => false,
        }
    }

    /// Compatibility for `==` and `!=`
    pub fn compatible(&self, other: &Type) -> bool {
        self.accepts(other) || other.accepts(self)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(tag) => write!(f, "{}", tag),
            Type::Struct(r) | Type::Enum(r) | Type::Trait(r) => write!(f, "{}", r),
            Type::Ptr(inner) => write!(f, "*{}", inner),
            Type::Slice(inner) => write!(f, "[]{}", inner),
            Type::Fn(sig) => {
                write!(f, "fn(")?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                if sig.variadic {
                    write!(f, ", ...")?;
                }
                write!(f, ")")?;
                if !sig.ret.is_void() {
                    write!(f, " {}", sig.ret)?;
                }
                Ok(())
            }
            Type::Unresolved => write!(f, "<unresolved>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn point() -> Type {
        Type::Struct(SymbolRef::new("Point", false, None))
    }

    #[test]
    fn test_assignability() {
        let ptr = Type::Ptr(Box::new(point()));
        let voidptr = Type::Prim(TypeTag::Voidptr);
        let any = Type::Prim(TypeTag::Any);

        assert!(Type::INT.accepts(&Type::INT));
        assert!(!Type::INT.accepts(&Type::Prim(TypeTag::I32)));
        assert!(any.accepts(&point()));
        assert!(!any.accepts(&Type::VOID));
        assert!(ptr.accepts(&Type::NIL));
        assert!(voidptr.accepts(&Type::NIL));
        assert!(voidptr.accepts(&ptr));
        assert!(!ptr.accepts(&voidptr));
        assert!(!point().accepts(&Type::NIL));
        assert!(Type::Slice(Box::new(Type::INT)).accepts(&Type::NIL));
    }

    #[test]
    fn test_pointer_like() {
        assert!(Type::Ptr(Box::new(point())).is_pointer_like());
        assert!(Type::Prim(TypeTag::Voidptr).is_pointer_like());
        assert!(!Type::Prim(TypeTag::Intptr).is_pointer_like());
        assert!(!Type::NIL.is_pointer_like());
    }

    #[test]
    fn test_unresolved_is_compatible_with_everything() {
        assert!(Type::Unresolved.accepts(&Type::STR));
        assert!(Type::STR.accepts(&Type::Unresolved));
        assert_eq!(Type::Unresolved.tag(), TypeTag::Id);
    }

    #[test]
    fn test_display_uses_source_spellings() {
        let sig = Type::Fn(FnSig {
            params: vec![Type::Prim(TypeTag::I32), Type::Slice(Box::new(Type::STR))],
            ret: Box::new(Type::BOOL),
            variadic: false,
        });
        assert_eq!(sig.to_string(), "fn(i32, []str) bool");
        assert_eq!(Type::Ptr(Box::new(point())).to_string(), "*Point");
        let foreign = Type::Struct(SymbolRef::new("tm", true, None));
        assert_eq!(foreign.to_string(), "cpp::tm");
        let packaged = Type::Enum(SymbolRef::new("Color", false, Some("gfx".into())));
        assert_eq!(packaged.to_string(), "gfx::Color");
    }
}
