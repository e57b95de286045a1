//! Statement AST nodes

use super::{BinOp, Expr, TypeAliasDecl, VarDecl};
use crate::common::Span;

/// A braced block of statements
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Local `var`/`const`
    Var(VarDecl),
    /// Local `type` alias
    TypeAlias(TypeAliasDecl),
    /// `x = v`, `x += v`
    Assign {
        target: Expr,
        op: Option<BinOp>,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Else>,
    },
    /// `for cond { }`, `for { }`
    For { cond: Option<Expr>, body: Block },
    Return(Option<Expr>),
    Break,
    Continue,
    Defer(Block),
    Unsafe(Block),
    Block(Block),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Else {
    /// `else if ...`
    If(Box<Stmt>),
    Block(Block),
}
