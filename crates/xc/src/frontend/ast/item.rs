//! Top-level declarations

use super::{Block, Expr, Ident, TypeExpr};
use crate::common::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    /// Declared with the `cpp` prefix (foreign linkage)
    pub cpp: bool,
    pub span: Span,
}

impl Item {
    pub fn new(kind: ItemKind, cpp: bool, span: Span) -> Self {
        Self { kind, cpp, span }
    }

    pub fn ident(&self) -> &Ident {
        match &self.kind {
            ItemKind::Fn(decl) => &decl.name,
            ItemKind::Var(decl) => &decl.name,
            ItemKind::TypeAlias(decl) => &decl.name,
            ItemKind::Struct(decl) => &decl.name,
            ItemKind::Trait(decl) => &decl.name,
            ItemKind::Enum(decl) => &decl.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Fn(FnDecl),
    Var(VarDecl),
    TypeAlias(TypeAliasDecl),
    Struct(StructDecl),
    Trait(TraitDecl),
    Enum(EnumDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeExpr,
    pub mutable: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    /// Trailing `...` in the parameter list
    pub variadic: bool,
    pub ret: Option<TypeExpr>,
    /// `None` for bodiless (`cpp`) prototypes
    pub body: Option<Block>,
}

/// `var x i32 = 1` or `const N = 4`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Ident,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub constant: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitDecl {
    pub name: Ident,
    pub methods: Vec<MethodSig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumItemDecl {
    pub name: Ident,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Ident,
    /// Underlying integer type, `int` when omitted
    pub repr: Option<TypeExpr>,
    pub items: Vec<EnumItemDecl>,
}
