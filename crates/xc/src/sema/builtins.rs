//! Built-in functions
//!
//! Built-ins are only recognized when no variable, function or struct of the
//! same name is visible, so user code may shadow them freely.

use super::checker::UnitChecker;
use super::program::{TExpr, TExprKind};
use super::resolve::value_type_error;
use super::scope::ScopeId;
use super::types::Type;
use crate::common::Span;
use crate::frontend::ast::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `out(x)`: print without newline
    Out,
    /// `outln(x)` or `outln()`
    Outln,
    /// `len(s)` for strings and slices
    Len,
    /// `new(T)`: heap allocation, `nil` on failure
    New,
    /// `panic(msg)`: throws the runtime fault
    Panic,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Out,
        Builtin::Outln,
        Builtin::Len,
        Builtin::New,
        Builtin::Panic,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Out => "out",
            Builtin::Outln => "outln",
            Builtin::Len => "len",
            Builtin::New => "new",
            Builtin::Panic => "panic",
        }
    }

    /// Name of the prelude function implementing it
    pub fn cpp_name(self) -> &'static str {
        match self {
            Builtin::Out => "_out",
            Builtin::Outln => "_outln",
            Builtin::Len => "_len",
            Builtin::New => "XALLOC",
            Builtin::Panic => "_panic",
        }
    }
}

impl UnitChecker<'_> {
    /// The built-in `name` refers to at `id`, if it is not shadowed
    pub(super) fn builtin_at(&self, id: ScopeId, name: &str) -> Option<Builtin> {
        let builtin = Builtin::from_name(name)?;
        let shadowed = self.forest.find_var(id, name, false).is_some()
            || self.forest.find_fn(id, name, false).is_some()
            || self.forest.find_struct(id, name, false).is_some();
        (!shadowed).then_some(builtin)
    }

    pub(super) fn check_builtin(&mut self, id: ScopeId, builtin: Builtin, args: &[Expr], span: Span) -> TExpr {
        let arity = match builtin {
            Builtin::Outln => 0..=1,
            _ => 1..=1,
        };
        if !arity.contains(&args.len()) {
            self.error(
                span,
                format!(
                    "'{}' expects {} argument{}, found {}",
                    builtin.name(),
                    arity.end(),
                    if *arity.end() == 1 { "" } else { "s" },
                    args.len()
                ),
            );
            return TExpr::error(span);
        }

        if builtin == Builtin::New {
            return self.check_new(id, &args[0], span);
        }

        let checked: Vec<TExpr> = args.iter().map(|arg| self.check_expr(id, arg, None)).collect();
        let ty = match builtin {
            Builtin::Out | Builtin::Outln => {
                if let Some(arg) = checked.first() {
                    if arg.ty.is_void() {
                        self.error(arg.span, format!("'{}' cannot print a 'void' value", builtin.name()));
                    }
                }
                Type::VOID
            }
            Builtin::Len => {
                let arg = &checked[0];
                if !matches!(arg.ty, Type::Slice(_) | Type::Unresolved) && !arg.ty.is_str() {
                    self.error(arg.span, format!("'len' expects a string or a slice, found '{}'", arg.ty));
                }
                Type::INT
            }
            Builtin::Panic => {
                self.expect_assignable(&Type::STR, &checked[0]);
                Type::VOID
            }
            Builtin::New => Type::Unresolved,
        };

        TExpr::new(TExprKind::Builtin { builtin, args: checked }, ty, span)
    }

    fn check_new(&mut self, id: ScopeId, arg: &Expr, span: Span) -> TExpr {
        let Some(ty_expr) = arg.as_type_expr() else {
            self.error(arg.span, "'new' expects a type");
            return TExpr::error(span);
        };
        let ty = self.resolve_type(id, &ty_expr);
        if let Some(message) = value_type_error(&ty) {
            self.error(arg.span, message);
            return TExpr::error(span);
        }
        let ptr = Type::Ptr(Box::new(ty.clone()));
        TExpr::new(TExprKind::New(ty), ptr, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::checker::tests::check;
    use crate::sema::program::St;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("print"), None);
    }

    #[test]
    fn test_builtin_calls() {
        let (output, logs) = check(
            "struct Node { v int }\n\
             fn main() {\n\
             \x20 var n = new(Node);\n\
             \x20 var s = \"abc\";\n\
             \x20 outln(len(s));\n\
             \x20 out(n.v)\n\
             }\n",
        );
        assert!(logs.is_empty(), "{:?}", logs);
        let St::Var(n) = &output.fns[0].body.stmts[0] else {
            panic!("expected var");
        };
        assert_eq!(n.ty.to_string(), "*Node");
    }

    #[test]
    fn test_builtin_errors() {
        let (_, logs) = check("fn main() {\n  len(1);\n  panic(2);\n  out()\n}\n");
        assert_eq!(
            logs,
            vec![
                "ERROR: main.x:2:7 'len' expects a string or a slice, found 'int'",
                "ERROR: main.x:3:9 mismatched types: expected 'str', found 'int'",
                "ERROR: main.x:4:3 'out' expects 1 argument, found 0",
            ]
        );
    }

    #[test]
    fn test_builtins_can_be_shadowed() {
        let (_, logs) = check("fn len(a int) int { return a }\nfn main() { len(1) }\n");
        assert!(logs.is_empty(), "{:?}", logs);
        let (_, logs) = check("fn main() {\n  var out = 1;\n  out(2)\n}\n");
        assert_eq!(logs, vec!["ERROR: main.x:3:3 'int' is not callable"]);
    }
}
