//! Type expressions and paths

use crate::common::Span;

/// An identifier with its span
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A possibly qualified name: `x`, `cpp::printf`, `math::Point`, `Color::Red`,
/// `gfx::Color::Red`
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Written with the `cpp::` prefix
    pub cpp: bool,
    /// Leading segments before the final name
    pub qualifiers: Vec<Ident>,
    pub name: Ident,
    pub span: Span,
}

impl Path {
    pub fn single(name: Ident) -> Self {
        let span = name.span;
        Self {
            cpp: false,
            qualifiers: Vec::new(),
            name,
            span,
        }
    }

    pub fn is_single(&self) -> bool {
        self.qualifiers.is_empty()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cpp {
            write!(f, "cpp::")?;
        }
        for q in &self.qualifiers {
            write!(f, "{}::", q.name)?;
        }
        write!(f, "{}", self.name.name)
    }
}

/// A written type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// Named type: `i32`, `Point`, `math::Vec2`
    Path(Path),
    /// `*T`
    Ptr(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `fn(i32, str) bool`
    Fn {
        params: Vec<TypeExpr>,
        ret: Option<Box<TypeExpr>>,
    },
}
