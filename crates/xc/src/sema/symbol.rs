//! Declarations known to the analyzer

use std::fmt;

use super::package::Package;
use super::types::{FnSig, SymbolRef, Type};
use crate::common::Loc;
use crate::types::TypeTag;

/// Kind of a declaration, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Package,
    Var,
    TypeAlias,
    Struct,
    Fn,
    Trait,
    Enum,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Package => "package",
            SymbolKind::Var => "variable",
            SymbolKind::TypeAlias => "type alias",
            SymbolKind::Struct => "struct",
            SymbolKind::Fn => "function",
            SymbolKind::Trait => "trait",
            SymbolKind::Enum => "enum",
        };
        f.write_str(s)
    }
}

/// Common view over every declaration kind
pub trait Decl {
    const KIND: SymbolKind;

    fn ident(&self) -> &str;
    fn loc(&self) -> Loc;
    fn cpp_linked(&self) -> bool;
}

macro_rules! impl_decl {
    ($ty:ty, $kind:expr) => {
        impl Decl for $ty {
            const KIND: SymbolKind = $kind;

            fn ident(&self) -> &str {
                &self.ident
            }

            fn loc(&self) -> Loc {
                self.loc
            }

            fn cpp_linked(&self) -> bool {
                self.cpp_linked
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarSymbol {
    pub ident: String,
    pub loc: Loc,
    pub cpp_linked: bool,
    pub ty: Type,
    pub mutable: bool,
    pub constant: bool,
    /// Declared in a function body or parameter list
    pub local: bool,
    /// Distinguishes a local from the bindings it shadows in emitted code
    pub local_id: Option<u32>,
    pub package: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasSymbol {
    pub ident: String,
    pub loc: Loc,
    pub cpp_linked: bool,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub ident: String,
    pub loc: Loc,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructSymbol {
    pub ident: String,
    pub loc: Loc,
    pub cpp_linked: bool,
    pub fields: Vec<Field>,
    pub package: Option<String>,
}

impl StructSymbol {
    pub fn field(&self, ident: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.ident == ident)
    }

    pub fn to_ref(&self) -> SymbolRef {
        SymbolRef::new(&self.ident, self.cpp_linked, self.package.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ident: String,
    pub loc: Loc,
    pub ty: Type,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnSymbol {
    pub ident: String,
    pub loc: Loc,
    pub cpp_linked: bool,
    pub params: Vec<Param>,
    pub ret: Type,
    /// Accepts extra arguments; only `cpp` functions
    pub variadic: bool,
    pub package: Option<String>,
}

impl FnSymbol {
    pub fn sig(&self) -> FnSig {
        FnSig {
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
            ret: Box::new(self.ret.clone()),
            variadic: self.variadic,
        }
    }

    pub fn to_ref(&self) -> SymbolRef {
        SymbolRef::new(&self.ident, self.cpp_linked, self.package.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitMethod {
    pub ident: String,
    pub loc: Loc,
    pub sig: FnSig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitSymbol {
    pub ident: String,
    pub loc: Loc,
    pub cpp_linked: bool,
    pub methods: Vec<TraitMethod>,
    pub package: Option<String>,
}

impl TraitSymbol {
    pub fn method(&self, ident: &str) -> Option<&TraitMethod> {
        self.methods.iter().find(|m| m.ident == ident)
    }

    pub fn to_ref(&self) -> SymbolRef {
        SymbolRef::new(&self.ident, self.cpp_linked, self.package.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItem {
    pub ident: String,
    pub loc: Loc,
    pub value: i128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSymbol {
    pub ident: String,
    pub loc: Loc,
    pub cpp_linked: bool,
    /// Underlying integer type
    pub repr: TypeTag,
    pub items: Vec<EnumItem>,
    pub package: Option<String>,
}

impl EnumSymbol {
    pub fn item(&self, ident: &str) -> Option<&EnumItem> {
        self.items.iter().find(|i| i.ident == ident)
    }

    pub fn to_ref(&self) -> SymbolRef {
        SymbolRef::new(&self.ident, self.cpp_linked, self.package.clone())
    }
}

impl_decl!(VarSymbol, SymbolKind::Var);
impl_decl!(TypeAliasSymbol, SymbolKind::TypeAlias);
impl_decl!(StructSymbol, SymbolKind::Struct);
impl_decl!(FnSymbol, SymbolKind::Fn);
impl_decl!(TraitSymbol, SymbolKind::Trait);
impl_decl!(EnumSymbol, SymbolKind::Enum);

/// Borrowed view of any declaration
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'a> {
    Package(&'a Package),
    Var(&'a VarSymbol),
    TypeAlias(&'a TypeAliasSymbol),
    Struct(&'a StructSymbol),
    Fn(&'a FnSymbol),
    Trait(&'a TraitSymbol),
    Enum(&'a EnumSymbol),
}

impl Symbol<'_> {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Package(_) => SymbolKind::Package,
            Symbol::Var(_) => SymbolKind::Var,
            Symbol::TypeAlias(_) => SymbolKind::TypeAlias,
            Symbol::Struct(_) => SymbolKind::Struct,
            Symbol::Fn(_) => SymbolKind::Fn,
            Symbol::Trait(_) => SymbolKind::Trait,
            Symbol::Enum(_) => SymbolKind::Enum,
        }
    }

    pub fn ident(&self) -> &str {
        match self {
            Symbol::Package(p) => &p.ident,
            Symbol::Var(s) => s.ident(),
            Symbol::TypeAlias(s) => s.ident(),
            Symbol::Struct(s) => s.ident(),
            Symbol::Fn(s) => s.ident(),
            Symbol::Trait(s) => s.ident(),
            Symbol::Enum(s) => s.ident(),
        }
    }

    /// Declaring location; packages have none
    pub fn loc(&self) -> Option<Loc> {
        match self {
            Symbol::Package(_) => None,
            Symbol::Var(s) => Some(s.loc()),
            Symbol::TypeAlias(s) => Some(s.loc()),
            Symbol::Struct(s) => Some(s.loc()),
            Symbol::Fn(s) => Some(s.loc()),
            Symbol::Trait(s) => Some(s.loc()),
            Symbol::Enum(s) => Some(s.loc()),
        }
    }

    pub fn cpp_linked(&self) -> bool {
        match self {
            Symbol::Package(_) => false,
            Symbol::Var(s) => s.cpp_linked(),
            Symbol::TypeAlias(s) => s.cpp_linked(),
            Symbol::Struct(s) => s.cpp_linked(),
            Symbol::Fn(s) => s.cpp_linked(),
            Symbol::Trait(s) => s.cpp_linked(),
            Symbol::Enum(s) => s.cpp_linked(),
        }
    }
}
