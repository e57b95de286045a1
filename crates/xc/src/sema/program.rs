//! Annotated program handed to the backend
//!
//! Statements and expressions carry resolved types and resolved references,
//! so the emitter never performs name lookup of its own.

use std::sync::Arc;

use super::builtins::Builtin;
use super::scope::ScopeId;
use super::table::SymbolTable;
use super::types::{SymbolRef, Type};
use crate::common::Span;
use crate::frontend::ast::{BinOp, UnaryOp};

/// A checked block
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// Inside `unsafe`; inherited by nested scopes
    pub unsafety: bool,
    /// Inside a `defer` block; inherited by nested scopes
    pub deferred: bool,
    pub stmts: Vec<St>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>, unsafety: bool, deferred: bool) -> Self {
        Self {
            parent,
            unsafety,
            deferred,
            stmts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarSt {
    pub ident: String,
    pub local_id: Option<u32>,
    pub ty: Type,
    pub init: Option<TExpr>,
    pub constant: bool,
}

/// Checked statement
#[derive(Debug, Clone)]
pub enum St {
    Var(VarSt),
    Assign {
        target: TExpr,
        op: Option<BinOp>,
        value: TExpr,
    },
    If {
        cond: TExpr,
        then: Box<Scope>,
        otherwise: Option<Box<Scope>>,
    },
    Loop {
        cond: Option<TExpr>,
        body: Box<Scope>,
    },
    Ret(Option<TExpr>),
    Deferred(Box<Scope>),
    Block(Box<Scope>),
    Expr(TExpr),
    Break,
    Continue,
}

/// Checked expression
#[derive(Debug, Clone)]
pub struct TExpr {
    pub kind: TExprKind,
    pub ty: Type,
    pub span: Span,
}

impl TExpr {
    pub fn new(kind: TExprKind, ty: Type, span: Span) -> Self {
        Self { kind, ty, span }
    }

    /// Placeholder for an expression that failed to check
    pub fn error(span: Span) -> Self {
        Self::new(TExprKind::Error, Type::Unresolved, span)
    }
}

#[derive(Debug, Clone)]
pub enum TExprKind {
    Int(i128),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Nil,

    /// Function-local binding
    Local { ident: String, local_id: Option<u32> },
    /// Global variable of the root program, a package or foreign code
    Global(SymbolRef),
    Func(SymbolRef),
    EnumItem { enum_ref: SymbolRef, item: String },

    Call { callee: Box<TExpr>, args: Vec<TExpr> },
    /// Struct construction with one argument per field
    Construct { target: SymbolRef, args: Vec<TExpr> },
    Builtin { builtin: Builtin, args: Vec<TExpr> },
    /// `new(T)`
    New(Type),

    Field {
        object: Box<TExpr>,
        field: String,
        through_ptr: bool,
        /// Member of a foreign struct, emitted under its raw name
        cpp: bool,
    },
    Index { object: Box<TExpr>, index: Box<TExpr> },
    Unary { op: UnaryOp, operand: Box<TExpr> },
    Binary {
        op: BinOp,
        left: Box<TExpr>,
        right: Box<TExpr>,
    },
    Cast { expr: Box<TExpr>, ty: Type },
    Array { elem: Type, elems: Vec<TExpr> },

    Error,
}

/// Checked global variable
#[derive(Debug, Clone)]
pub struct GlobalDef {
    pub ident: String,
    pub ty: Type,
    pub init: Option<TExpr>,
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub ident: String,
    pub local_id: Option<u32>,
}

/// Checked function with a body
#[derive(Debug, Clone)]
pub struct FnDef {
    pub ident: String,
    pub params: Vec<ParamDef>,
    pub body: Scope,
}

/// Checked declarations of the root program or of one package
#[derive(Debug, Clone)]
pub struct Module {
    /// `None` for the root program
    pub package: Option<String>,
    pub table: Arc<SymbolTable>,
    pub globals: Vec<GlobalDef>,
    pub fns: Vec<FnDef>,
}

impl Module {
    pub fn new(package: Option<String>, table: Arc<SymbolTable>) -> Self {
        Self {
            package,
            table,
            globals: Vec::new(),
            fns: Vec::new(),
        }
    }
}

/// Whole annotated program
#[derive(Debug, Clone)]
pub struct Program {
    /// Packages in dependency order
    pub packages: Vec<Module>,
    pub root: Module,
    /// Source name of the entry function
    pub entry: String,
}
