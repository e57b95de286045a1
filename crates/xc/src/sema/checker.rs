//! Unit checker: items and statements
//!
//! One [`UnitChecker`] analyzes one source unit against a read-only [`Sema`].
//! Every function body gets a fresh [`ScopeForest`]; each block pushes a
//! checker, visits its statements in order and pops it again, so a local is
//! visible only from its declaration to the end of its block.

use tracing::debug;

use super::context::Sema;
use super::program::{FnDef, GlobalDef, ParamDef, Scope, St, TExpr, TExprKind, VarSt};
use super::resolve::{value_type_error, TypeResolver};
use super::scope::{ScopeForest, ScopeId};
use super::symbol::{FnSymbol, TypeAliasSymbol, VarSymbol};
use super::types::Type;
use super::Unit;
use crate::common::{CompilerLog, Loc, SourceMap, Span};
use crate::config::ENTRY_POINT;
use crate::frontend::ast::{
    Block, Else, Expr, FnDecl, ItemKind, Stmt, StmtKind, TypeExpr, UnaryOp, VarDecl,
};
use crate::types::TypeTag;

/// Result of checking one unit
#[derive(Debug, Default)]
pub struct UnitOutput {
    pub globals: Vec<GlobalDef>,
    pub fns: Vec<FnDef>,
    pub logs: Vec<CompilerLog>,
}

/// Check every function body and global initializer of `unit`
pub fn check_unit(sema: &Sema, sources: &SourceMap, unit: &Unit) -> UnitOutput {
    let path = sources.path(unit.file).unwrap_or("<unknown>");
    debug!(unit = path, items = unit.ast.items.len(), "checking unit");

    let mut checker = UnitChecker::new(sema, sources, unit);
    let mut output = UnitOutput::default();

    for item in &unit.ast.items {
        if item.cpp {
            continue;
        }
        let loc = Loc::new(unit.file, item.ident().span);
        match &item.kind {
            ItemKind::Fn(decl) => {
                let Some(symbol) = sema.globals.find_fn(&decl.name.name, false) else {
                    continue;
                };
                if symbol.loc != loc {
                    continue;
                }
                if let Some(def) = checker.check_fn(symbol, decl) {
                    output.fns.push(def);
                }
            }
            ItemKind::Var(decl) => {
                let Some(symbol) = sema.globals.find_var(&decl.name.name, false) else {
                    continue;
                };
                if symbol.loc != loc {
                    continue;
                }
                output.globals.push(checker.check_global(symbol, decl));
            }
            _ => {}
        }
    }

    output.logs = checker.logs;
    output
}

/// Entry point requirements of the root program, as a flat error
pub fn check_entry(sema: &Sema) -> Option<CompilerLog> {
    let Some(main) = sema.globals.find_fn(ENTRY_POINT, false) else {
        return Some(CompilerLog::flat_error(format!(
            "entry point '{}' is not defined",
            ENTRY_POINT
        )));
    };
    if !main.params.is_empty() {
        return Some(CompilerLog::flat_error(format!(
            "entry point '{}' must not take parameters",
            ENTRY_POINT
        )));
    }
    if !main.ret.is_void() && !main.ret.is_unresolved() {
        return Some(CompilerLog::flat_error(format!(
            "entry point '{}' must not return a value",
            ENTRY_POINT
        )));
    }
    None
}

pub struct UnitChecker<'a> {
    pub(super) sema: &'a Sema,
    pub(super) sources: &'a SourceMap,
    pub(super) unit: &'a Unit,
    pub(super) forest: ScopeForest<'a>,
    pub(super) logs: Vec<CompilerLog>,
    /// Result type of the function being checked
    ret: Type,
    loop_depth: usize,
    next_local: u32,
}

impl<'a> UnitChecker<'a> {
    pub fn new(sema: &'a Sema, sources: &'a SourceMap, unit: &'a Unit) -> Self {
        Self {
            sema,
            sources,
            unit,
            forest: ScopeForest::new(sema),
            logs: Vec::new(),
            ret: Type::VOID,
            loop_depth: 0,
            next_local: 0,
        }
    }

    pub(super) fn error(&mut self, span: Span, message: impl Into<String>) {
        self.logs
            .push(CompilerLog::error(self.sources, Loc::new(self.unit.file, span), message));
    }

    pub(super) fn resolve_type(&mut self, id: ScopeId, ty: &TypeExpr) -> Type {
        let result = TypeResolver::new(&self.forest.cursor(id))
            .with_uses(&self.unit.ast.uses)
            .resolve(ty);
        match result {
            Ok(ty) => ty,
            Err(err) => {
                self.error(err.span(), err.message());
                Type::Unresolved
            }
        }
    }

    pub(super) fn resolve_value_type(&mut self, id: ScopeId, ty: &TypeExpr) -> Type {
        let resolved = self.resolve_type(id, ty);
        match value_type_error(&resolved) {
            Some(message) => {
                self.error(ty.span, message);
                Type::Unresolved
            }
            None => resolved,
        }
    }

    /// Id for a local that would otherwise collide with a visible binding
    fn local_id_for(&mut self, id: ScopeId, ident: &str) -> Option<u32> {
        self.forest.find_var(id, ident, false)?;
        let local_id = self.next_local;
        self.next_local += 1;
        Some(local_id)
    }

    pub(super) fn expect_assignable(&mut self, expected: &Type, found: &TExpr) {
        if !expected.accepts(&found.ty) {
            self.error(
                found.span,
                format!("mismatched types: expected '{}', found '{}'", expected, found.ty),
            );
        }
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    fn check_fn(&mut self, symbol: &FnSymbol, decl: &'a FnDecl) -> Option<FnDef> {
        let body = decl.body.as_ref()?;

        self.ret = symbol.ret.clone();
        self.loop_depth = 0;
        self.next_local = 0;

        let root = self.forest.enter(None);
        self.forest.check(root, body, Scope::new(None, false, false));

        let mut params = Vec::with_capacity(symbol.params.len());
        for param in &symbol.params {
            let local_id = self.local_id_for(root, &param.ident);
            let declared = self.forest.declare_var(
                root,
                VarSymbol {
                    ident: param.ident.clone(),
                    loc: param.loc,
                    cpp_linked: false,
                    ty: param.ty.clone(),
                    mutable: param.mutable,
                    constant: false,
                    local: true,
                    local_id,
                    package: None,
                },
            );
            // duplicates were reported while loading the signature
            if declared.is_ok() {
                params.push(ParamDef {
                    ident: param.ident.clone(),
                    local_id,
                });
            }
        }

        // parameters and the outermost block share one checker
        self.check_stmts(root, &body.stmts);
        let scope = self.forest.leave(root).unwrap_or_default();

        if !self.ret.is_void() && !self.ret.is_unresolved() && !terminates(&scope.stmts) {
            self.error(
                decl.name.span,
                format!(
                    "function '{}' may finish without returning a value of type '{}'",
                    symbol.ident, self.ret
                ),
            );
        }

        Some(FnDef {
            ident: symbol.ident.clone(),
            params,
            body: scope,
        })
    }

    fn check_global(&mut self, symbol: &VarSymbol, decl: &'a VarDecl) -> GlobalDef {
        let init = decl.init.as_ref().map(|init| {
            let root = self.forest.enter(None);
            let expected = (!symbol.ty.is_unresolved()).then_some(&symbol.ty);
            let checked = self.check_expr(root, init, expected);
            self.forest.leave(root);
            checked
        });
        if let Some(init) = &init {
            self.expect_assignable(&symbol.ty, init);
        }
        GlobalDef {
            ident: symbol.ident.clone(),
            ty: symbol.ty.clone(),
            init,
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn check_stmts(&mut self, id: ScopeId, stmts: &'a [Stmt]) {
        for stmt in stmts {
            if let Some(st) = self.check_stmt(id, stmt) {
                if let Some(scope) = self.forest.scope_mut(id) {
                    scope.stmts.push(st);
                }
            }
        }
    }

    /// Check `block` in a new child of `parent`
    fn check_block(&mut self, parent: ScopeId, block: &'a Block, unsafety: bool, deferred: bool) -> Box<Scope> {
        let id = self.forest.enter(Some(parent));
        let scope = Scope::new(
            Some(parent),
            unsafety || self.forest.is_unsafe(parent),
            deferred || self.forest.in_deferred(parent),
        );
        self.forest.check(id, block, scope);
        self.check_stmts(id, &block.stmts);
        Box::new(self.forest.leave(id).unwrap_or_default())
    }

    fn check_stmt(&mut self, id: ScopeId, stmt: &'a Stmt) -> Option<St> {
        match &stmt.kind {
            StmtKind::Var(decl) => self.check_local(id, decl),
            StmtKind::TypeAlias(decl) => {
                self.check_local_alias(id, &decl.name.name, decl.name.span, &decl.ty);
                None
            }
            StmtKind::Assign { target, op, value } => {
                let target_checked = self.check_expr(id, target, None);
                self.check_place(id, &target_checked);
                let value_checked = match op {
                    None => {
                        let value_checked = self.check_expr(id, value, Some(&target_checked.ty));
                        self.expect_assignable(&target_checked.ty, &value_checked);
                        value_checked
                    }
                    Some(op) => {
                        let value_checked = self.check_expr(id, value, Some(&target_checked.ty));
                        let result = self.binary_type(id, *op, &target_checked, &value_checked, stmt.span);
                        if !target_checked.ty.accepts(&result) {
                            self.error(
                                stmt.span,
                                format!("cannot apply '{}=' to '{}'", op.symbol(), target_checked.ty),
                            );
                        }
                        value_checked
                    }
                };
                Some(St::Assign {
                    target: target_checked,
                    op: *op,
                    value: value_checked,
                })
            }
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => Some(self.check_if(id, cond, then, otherwise.as_ref())),
            StmtKind::For { cond, body } => {
                let cond = cond.as_ref().map(|c| self.check_cond(id, c));
                self.loop_depth += 1;
                let body = self.check_block(id, body, false, false);
                self.loop_depth -= 1;
                Some(St::Loop { cond, body })
            }
            StmtKind::Return(value) => Some(self.check_return(id, value.as_ref(), stmt.span)),
            StmtKind::Break | StmtKind::Continue => {
                let (word, st) = match stmt.kind {
                    StmtKind::Break => ("break", St::Break),
                    _ => ("continue", St::Continue),
                };
                if self.loop_depth == 0 {
                    self.error(stmt.span, format!("'{}' outside of a loop", word));
                }
                Some(st)
            }
            StmtKind::Defer(block) => {
                let depth = std::mem::take(&mut self.loop_depth);
                let scope = self.check_block(id, block, false, true);
                self.loop_depth = depth;
                Some(St::Deferred(scope))
            }
            StmtKind::Unsafe(block) => Some(St::Block(self.check_block(id, block, true, false))),
            StmtKind::Block(block) => Some(St::Block(self.check_block(id, block, false, false))),
            StmtKind::Expr(expr) => Some(St::Expr(self.check_expr(id, expr, None))),
        }
    }

    fn check_local(&mut self, id: ScopeId, decl: &'a VarDecl) -> Option<St> {
        let name = &decl.name;
        let declared_ty = decl.ty.as_ref().map(|ty| self.resolve_value_type(id, ty));
        let init = decl
            .init
            .as_ref()
            .map(|init| self.check_expr(id, init, declared_ty.as_ref()));

        let ty = match (declared_ty, &init) {
            (Some(ty), Some(init)) => {
                self.expect_assignable(&ty, init);
                ty
            }
            (Some(ty), None) => ty,
            (None, Some(init)) => match value_type_error(&init.ty) {
                Some(_) => {
                    self.error(
                        init.span,
                        format!("cannot infer the type of '{}' from '{}'", name.name, init.ty),
                    );
                    Type::Unresolved
                }
                None => init.ty.clone(),
            },
            (None, None) => Type::Unresolved,
        };

        if decl.constant && init.is_none() {
            self.error(name.span, format!("constant '{}' needs a value", name.name));
        }

        let local_id = self.local_id_for(id, &name.name);
        let declared = self.forest.declare_var(
            id,
            VarSymbol {
                ident: name.name.clone(),
                loc: Loc::new(self.unit.file, name.span),
                cpp_linked: false,
                ty: ty.clone(),
                mutable: !decl.constant,
                constant: decl.constant,
                local: true,
                local_id,
                package: None,
            },
        );
        if let Err(duplicate) = declared {
            self.error(name.span, duplicate.to_string());
            return None;
        }

        Some(St::Var(VarSt {
            ident: name.name.clone(),
            local_id,
            ty,
            init,
            constant: decl.constant,
        }))
    }

    fn check_local_alias(&mut self, id: ScopeId, ident: &str, span: Span, ty: &TypeExpr) {
        if TypeTag::primitive(ident).is_some() {
            self.error(span, format!("'{}' is a primitive type and cannot be redeclared", ident));
            return;
        }
        let resolved = self.resolve_type(id, ty);
        let declared = self.forest.declare_type_alias(
            id,
            TypeAliasSymbol {
                ident: ident.to_string(),
                loc: Loc::new(self.unit.file, span),
                cpp_linked: false,
                ty: resolved,
            },
        );
        if let Err(duplicate) = declared {
            self.error(span, duplicate.to_string());
        }
    }

    fn check_if(
        &mut self,
        id: ScopeId,
        cond: &'a Expr,
        then: &'a Block,
        otherwise: Option<&'a Else>,
    ) -> St {
        let cond = self.check_cond(id, cond);
        let then = self.check_block(id, then, false, false);
        let otherwise = otherwise.map(|otherwise| match otherwise {
            Else::Block(block) => self.check_block(id, block, false, false),
            Else::If(stmt) => {
                let child = self.forest.enter(Some(id));
                if let Some(st) = self.check_stmt(child, stmt) {
                    if let Some(scope) = self.forest.scope_mut(child) {
                        scope.stmts.push(st);
                    }
                }
                Box::new(self.forest.leave(child).unwrap_or_default())
            }
        });
        St::If {
            cond,
            then,
            otherwise,
        }
    }

    fn check_cond(&mut self, id: ScopeId, cond: &'a Expr) -> TExpr {
        let checked = self.check_expr(id, cond, Some(&Type::BOOL));
        if !checked.ty.is_bool() {
            self.error(
                checked.span,
                format!("condition must be 'bool', found '{}'", checked.ty),
            );
        }
        checked
    }

    fn check_return(&mut self, id: ScopeId, value: Option<&'a Expr>, span: Span) -> St {
        if self.forest.in_deferred(id) {
            self.error(span, "cannot return from a deferred block");
        }
        let ret = self.ret.clone();
        let value = value.map(|value| {
            let checked = self.check_expr(id, value, Some(&ret));
            if ret.is_void() {
                self.error(checked.span, "function does not return a value");
            } else {
                self.expect_assignable(&ret, &checked);
            }
            checked
        });
        if value.is_none() && !ret.is_void() && !ret.is_unresolved() {
            self.error(span, format!("missing return value of type '{}'", ret));
        }
        St::Ret(value)
    }

    /// Report if `target` cannot be assigned to
    fn check_place(&mut self, id: ScopeId, target: &TExpr) {
        let mutable = match &target.kind {
            TExprKind::Local { ident, .. } => self.forest.find_var(id, ident, false).map(|v| (ident.clone(), v.mutable)),
            TExprKind::Global(sym) => self.sema.var_by_ref(sym).map(|v| (sym.to_string(), v.mutable || v.cpp_linked)),
            TExprKind::Field { .. } | TExprKind::Index { .. } => return,
            TExprKind::Unary {
                op: UnaryOp::Deref,
                ..
            } => return,
            TExprKind::Error => return,
            _ => {
                self.error(target.span, "cannot assign to this expression");
                return;
            }
        };
        if let Some((ident, false)) = mutable {
            self.error(target.span, format!("cannot assign to immutable '{}'", ident));
        }
    }
}

/// Whether control cannot fall off the end of `stmts`
fn terminates(stmts: &[St]) -> bool {
    match stmts.last() {
        Some(St::Ret(_)) => true,
        Some(St::Block(scope)) => terminates(&scope.stmts),
        Some(St::If {
            then,
            otherwise: Some(otherwise),
            ..
        }) => terminates(&then.stmts) && terminates(&otherwise.stmts),
        Some(St::Loop { cond: None, body }) => !contains_break(&body.stmts),
        _ => false,
    }
}

fn contains_break(stmts: &[St]) -> bool {
    stmts.iter().any(|st| match st {
        St::Break => true,
        St::Block(scope) => contains_break(&scope.stmts),
        St::If { then, otherwise, .. } => {
            contains_break(&then.stmts) || otherwise.as_ref().is_some_and(|o| contains_break(&o.stmts))
        }
        _ => false,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::frontend::Parser;
    use crate::sema::loader::load_program;
    use pretty_assertions::assert_eq;

    pub(crate) fn check(text: &str) -> (UnitOutput, Vec<String>) {
        let mut sources = SourceMap::new();
        let file = sources.add("main.x", text);
        let unit = Unit {
            file,
            ast: Parser::new(text).parse_unit().unwrap(),
        };
        let (sema, mut logs) = load_program(std::slice::from_ref(&unit), Vec::new(), &sources);
        let output = check_unit(&sema, &sources, &unit);
        logs.extend(output.logs.iter().cloned());
        let messages = logs.iter().map(|l| l.to_string()).collect();
        (output, messages)
    }

    fn errors(text: &str) -> Vec<String> {
        check(text).1
    }

    #[test]
    fn test_nested_function_scenario() {
        let (output, logs) = check(
            "var x = 1\n\
             fn f(n int) int {\n\
             \x20   var x = 2;\n\
             \x20   if n > 0 { return f(n - 1) + x }\n\
             \x20   return x\n\
             }\n\
             fn main() { f(3) }\n",
        );
        assert!(logs.is_empty(), "{:?}", logs);

        let f = &output.fns[0];
        let St::Var(inner) = &f.body.stmts[0] else {
            panic!("expected var");
        };
        assert_eq!(inner.local_id, Some(0));

        let St::Ret(Some(ret)) = &f.body.stmts[2] else {
            panic!("expected return");
        };
        assert!(matches!(
            &ret.kind,
            TExprKind::Local { ident, local_id: Some(0) } if ident == "x"
        ));

        let St::If { then, .. } = &f.body.stmts[1] else {
            panic!("expected if");
        };
        let St::Ret(Some(sum)) = &then.stmts[0] else {
            panic!("expected return");
        };
        let TExprKind::Binary { left, .. } = &sum.kind else {
            panic!("expected binary");
        };
        let TExprKind::Call { callee, .. } = &left.kind else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, TExprKind::Func(r) if r.ident == "f"));
    }

    #[test]
    fn test_use_before_declaration() {
        assert_eq!(
            errors("fn main() {\n  y = 1;\n  var y = 2\n}\n"),
            vec!["ERROR: main.x:2:3 undefined identifier 'y'"]
        );
    }

    #[test]
    fn test_block_locals_do_not_escape() {
        assert_eq!(
            errors("fn main() {\n  { var t = 1 }\n  t = 2\n}\n"),
            vec!["ERROR: main.x:3:3 undefined identifier 't'"]
        );
    }

    #[test]
    fn test_functions_are_order_independent() {
        assert!(errors("fn main() { helper() }\nfn helper() {}\n").is_empty());
    }

    #[test]
    fn test_immutable_bindings() {
        assert_eq!(
            errors("const K = 1\nfn g(a int, mut b int) {\n  a = 1;\n  b = 2;\n  K = 3\n}\nfn main() {}\n"),
            vec![
                "ERROR: main.x:3:3 cannot assign to immutable 'a'",
                "ERROR: main.x:5:3 cannot assign to immutable 'K'",
            ]
        );
    }

    #[test]
    fn test_statement_context_rules() {
        assert_eq!(
            errors("fn main() {\n  break;\n  defer { return }\n  for { defer { continue } }\n}\n"),
            vec![
                "ERROR: main.x:2:3 'break' outside of a loop",
                "ERROR: main.x:3:11 cannot return from a deferred block",
                "ERROR: main.x:4:17 'continue' outside of a loop",
            ]
        );
    }

    #[test]
    fn test_missing_return() {
        assert_eq!(
            errors("fn f(a bool) int {\n  if a { return 1 }\n}\nfn main() {}\n"),
            vec!["ERROR: main.x:1:4 function 'f' may finish without returning a value of type 'int'"]
        );
        assert!(errors("fn f(a bool) int {\n  if a { return 1 } else { return 2 }\n}\nfn main() {}\n").is_empty());
        assert!(errors("fn f() int {\n  for { return 1 }\n}\nfn main() {}\n").is_empty());
    }

    #[test]
    fn test_conditions_must_be_bool() {
        assert_eq!(
            errors("fn main() {\n  if 1 { }\n}\n"),
            vec!["ERROR: main.x:2:6 condition must be 'bool', found 'int'"]
        );
    }

    #[test]
    fn test_local_alias_is_scoped() {
        assert_eq!(
            errors("fn main() {\n  { type Id = u32; var a Id = 1 }\n  var b Id = 2\n}\n"),
            vec!["ERROR: main.x:3:9 undefined type 'Id'"]
        );
    }

    #[test]
    fn test_duplicate_local() {
        assert_eq!(
            errors("fn main() {\n  var a = 1;\n  var a = 2\n}\n"),
            vec!["ERROR: main.x:3:7 'a' is already declared as a variable"]
        );
    }

    #[test]
    fn test_entry_point() {
        let mut sources = SourceMap::new();
        let text = "fn main(a int) {}\n";
        let file = sources.add("main.x", text);
        let unit = Unit {
            file,
            ast: Parser::new(text).parse_unit().unwrap(),
        };
        let (sema, _) = load_program(std::slice::from_ref(&unit), Vec::new(), &sources);
        assert_eq!(
            check_entry(&sema).unwrap().to_string(),
            "ERROR: entry point 'main' must not take parameters"
        );

        let (empty, _) = load_program(&[], Vec::new(), &sources);
        assert_eq!(
            check_entry(&empty).unwrap().to_string(),
            "ERROR: entry point 'main' is not defined"
        );
    }
}
