//! Expression checking

use super::checker::UnitChecker;
use super::package::Package;
use super::program::{TExpr, TExprKind};
use super::resolve::value_type_error;
use super::scope::ScopeId;
use super::symbol::{EnumSymbol, StructSymbol};
use super::types::{FnSig, SymbolRef, Type};
use crate::common::Span;
use crate::frontend::ast::{BinOp, Expr, ExprKind, Ident, Path, TypeExpr, UnaryOp};
use crate::types::TypeTag;

impl<'a> UnitChecker<'a> {
    /// Check `expr`, letting untyped literals adopt `expected` where they can
    pub(super) fn check_expr(&mut self, id: ScopeId, expr: &Expr, expected: Option<&Type>) -> TExpr {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Int(value) => self.check_int(*value, expected, span),
            ExprKind::Float(value) => {
                let ty = match expected {
                    Some(ty) if ty.is_float() => ty.clone(),
                    _ => Type::F64,
                };
                TExpr::new(TExprKind::Float(*value), ty, span)
            }
            ExprKind::Bool(value) => TExpr::new(TExprKind::Bool(*value), Type::BOOL, span),
            ExprKind::Char(value) => TExpr::new(TExprKind::Char(*value), Type::CHAR, span),
            ExprKind::Str(value) => TExpr::new(TExprKind::Str(value.clone()), Type::STR, span),
            ExprKind::Nil => TExpr::new(TExprKind::Nil, Type::NIL, span),
            ExprKind::Path(path) => self.check_path(id, path),
            ExprKind::Call { callee, args } => self.check_call(id, callee, args, span),
            ExprKind::Field { object, field } => self.check_field(id, object, field, span),
            ExprKind::Index { object, index } => self.check_index(id, object, index, span),
            ExprKind::Unary { op, operand } => self.check_unary(id, *op, operand, expected, span),
            ExprKind::Binary { op, left, right } => self.check_binary(id, *op, left, right, span),
            ExprKind::Cast { expr: inner, ty } => self.check_cast(id, inner, ty, span),
            ExprKind::Array(elems) => self.check_array(id, elems, expected, span),
        }
    }

    fn check_int(&mut self, value: i128, expected: Option<&Type>, span: Span) -> TExpr {
        let ty = match expected {
            Some(ty) if ty.is_numeric() => ty.clone(),
            _ => Type::INT,
        };
        if let Type::Prim(tag) = ty {
            if !tag.fits(value) {
                self.error(span, format!("constant {} overflows {}", value, tag));
            }
        }
        TExpr::new(TExprKind::Int(value), ty, span)
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    fn check_path(&mut self, id: ScopeId, path: &Path) -> TExpr {
        let name = path.name.name.as_str();
        let span = path.span;

        if path.cpp {
            if let Some(var) = self.forest.find_var(id, name, true) {
                let ty = var.ty.clone();
                return TExpr::new(TExprKind::Global(SymbolRef::new(name, true, None)), ty, span);
            }
            if let Some(func) = self.forest.find_fn(id, name, true) {
                return TExpr::new(TExprKind::Func(func.to_ref()), Type::Fn(func.sig()), span);
            }
            self.error(span, format!("undefined identifier '{}'", path));
            return TExpr::error(span);
        }

        match path.qualifiers.as_slice() {
            [] => self.check_name(id, name, span),
            [qualifier] => {
                if let Some(decl) = self.forest.find_enum(id, &qualifier.name) {
                    return self.enum_item(decl, name, span);
                }
                let Some(package) = self.imported_package(id, qualifier) else {
                    return TExpr::error(span);
                };
                if let Some(var) = package.table.find_var(name, false) {
                    let sym = SymbolRef::new(name, false, var.package.clone());
                    return TExpr::new(TExprKind::Global(sym), var.ty.clone(), span);
                }
                if let Some(func) = package.table.find_fn(name, false) {
                    return TExpr::new(TExprKind::Func(func.to_ref()), Type::Fn(func.sig()), span);
                }
                self.error(span, format!("package '{}' has no value '{}'", package.ident, name));
                TExpr::error(span)
            }
            [package_name, enum_name] => {
                let Some(package) = self.imported_package(id, package_name) else {
                    return TExpr::error(span);
                };
                match package.table.find_enum(&enum_name.name) {
                    Some(decl) => self.enum_item(decl, name, span),
                    None => {
                        self.error(
                            enum_name.span,
                            format!("package '{}' has no enum '{}'", package.ident, enum_name.name),
                        );
                        TExpr::error(span)
                    }
                }
            }
            _ => {
                self.error(span, format!("invalid path '{}'", path));
                TExpr::error(span)
            }
        }
    }

    fn check_name(&mut self, id: ScopeId, name: &str, span: Span) -> TExpr {
        if let Some((var, local)) = self.forest.resolve_var(id, name, false) {
            let kind = if local {
                TExprKind::Local {
                    ident: name.to_string(),
                    local_id: var.local_id,
                }
            } else {
                TExprKind::Global(SymbolRef::new(name, false, var.package.clone()))
            };
            return TExpr::new(kind, var.ty.clone(), span);
        }
        if let Some(func) = self.forest.find_fn(id, name, false) {
            return TExpr::new(TExprKind::Func(func.to_ref()), Type::Fn(func.sig()), span);
        }

        let is_type = TypeTag::primitive(name).is_some()
            || self.forest.find_struct(id, name, false).is_some()
            || self.forest.find_enum(id, name).is_some()
            || self.forest.find_trait(id, name).is_some()
            || self.forest.find_type_alias(id, name, false).is_some();
        if is_type {
            self.error(span, format!("'{}' is a type, not a value", name));
        } else if self.builtin_at(id, name).is_some() {
            self.error(span, format!("built-in '{}' can only be called", name));
        } else {
            self.error(span, format!("undefined identifier '{}'", name));
        }
        TExpr::error(span)
    }

    fn enum_item(&mut self, decl: &EnumSymbol, item: &str, span: Span) -> TExpr {
        if decl.item(item).is_none() {
            self.error(span, format!("enum '{}' has no item '{}'", decl.ident, item));
            return TExpr::error(span);
        }
        let enum_ref = decl.to_ref();
        TExpr::new(
            TExprKind::EnumItem {
                enum_ref: enum_ref.clone(),
                item: item.to_string(),
            },
            Type::Enum(enum_ref),
            span,
        )
    }

    /// Package named by `qualifier`, reporting unknown or unimported ones
    fn imported_package(&mut self, id: ScopeId, qualifier: &Ident) -> Option<&'a Package> {
        let Some(package) = self.forest.find_package(id, &qualifier.name) else {
            self.error(
                qualifier.span,
                format!("undefined package or enum '{}'", qualifier.name),
            );
            return None;
        };
        if !self.unit.ast.uses_package(&qualifier.name) {
            self.error(
                qualifier.span,
                format!("package '{}' is used without `use {}`", qualifier.name, qualifier.name),
            );
            return None;
        }
        Some(package)
    }

    /// Struct a call target names, if it names one
    fn struct_for_path(&self, id: ScopeId, path: &Path) -> Option<&'a StructSymbol> {
        let name = &path.name.name;
        if path.cpp {
            return self.forest.find_struct(id, name, true);
        }
        match path.qualifiers.as_slice() {
            [] => {
                if self.forest.find_var(id, name, false).is_some() {
                    return None;
                }
                self.forest.find_struct(id, name, false)
            }
            [qualifier] if self.unit.ast.uses_package(&qualifier.name) => self
                .forest
                .find_package(id, &qualifier.name)
                .and_then(|p| p.table.find_struct(name, false)),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Calls and members
    // ------------------------------------------------------------------

    fn check_call(&mut self, id: ScopeId, callee: &Expr, args: &[Expr], span: Span) -> TExpr {
        if let ExprKind::Path(path) = &callee.kind {
            if !path.cpp && path.is_single() {
                if let Some(builtin) = self.builtin_at(id, &path.name.name) {
                    return self.check_builtin(id, builtin, args, span);
                }
            }
            if let Some(target) = self.struct_for_path(id, path) {
                return self.check_construct(id, target, args, span);
            }
        }

        let callee = self.check_expr(id, callee, None);
        let sig = match &callee.ty {
            Type::Fn(sig) => sig.clone(),
            Type::Unresolved => {
                let args = self.check_loose_args(id, args);
                let call = TExprKind::Call {
                    callee: Box::new(callee),
                    args,
                };
                return TExpr::new(call, Type::Unresolved, span);
            }
            other => {
                self.error(callee.span, format!("'{}' is not callable", other));
                self.check_loose_args(id, args);
                return TExpr::error(span);
            }
        };

        let args = self.check_args(id, &sig, args, span);
        let ret = (*sig.ret).clone();
        let call = TExprKind::Call {
            callee: Box::new(callee),
            args,
        };
        TExpr::new(call, ret, span)
    }

    fn check_loose_args(&mut self, id: ScopeId, args: &[Expr]) -> Vec<TExpr> {
        args.iter().map(|arg| self.check_expr(id, arg, None)).collect()
    }

    fn check_args(&mut self, id: ScopeId, sig: &FnSig, args: &[Expr], span: Span) -> Vec<TExpr> {
        let expected = sig.params.len();
        if args.len() < expected || (args.len() > expected && !sig.variadic) {
            self.error(
                span,
                format!(
                    "expected {}{} argument{}, found {}",
                    if sig.variadic { "at least " } else { "" },
                    expected,
                    if expected == 1 { "" } else { "s" },
                    args.len()
                ),
            );
        }

        args.iter()
            .enumerate()
            .map(|(i, arg)| {
                let param = sig.params.get(i);
                let checked = self.check_expr(id, arg, param);
                if let Some(param) = param {
                    self.expect_assignable(param, &checked);
                }
                checked
            })
            .collect()
    }

    fn check_construct(&mut self, id: ScopeId, target: &'a StructSymbol, args: &[Expr], span: Span) -> TExpr {
        let target_ref = target.to_ref();
        if target.fields.len() != args.len() {
            self.error(
                span,
                format!(
                    "struct '{}' has {} field{}, found {} argument{}",
                    target_ref,
                    target.fields.len(),
                    if target.fields.len() == 1 { "" } else { "s" },
                    args.len(),
                    if args.len() == 1 { "" } else { "s" },
                ),
            );
        }

        let args = args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let field = target.fields.get(i).map(|f| &f.ty);
                let checked = self.check_expr(id, arg, field);
                if let Some(field) = field {
                    self.expect_assignable(field, &checked);
                }
                checked
            })
            .collect();

        TExpr::new(
            TExprKind::Construct {
                target: target_ref.clone(),
                args,
            },
            Type::Struct(target_ref),
            span,
        )
    }

    fn check_field(&mut self, id: ScopeId, object: &Expr, field: &Ident, span: Span) -> TExpr {
        let object = self.check_expr(id, object, None);
        let (base, through_ptr) = match &object.ty {
            Type::Ptr(inner) => ((**inner).clone(), true),
            other => (other.clone(), false),
        };

        let (ty, cpp) = match &base {
            Type::Struct(r) => {
                let found = self.sema.struct_by_ref(r).and_then(|s| s.field(&field.name));
                match found {
                    Some(f) => (f.ty.clone(), r.cpp_linked),
                    None => {
                        self.error(field.span, format!("struct '{}' has no field '{}'", r, field.name));
                        (Type::Unresolved, r.cpp_linked)
                    }
                }
            }
            Type::Trait(r) => {
                if !through_ptr {
                    self.error(object.span, format!("trait '{}' can only be used behind a pointer", r));
                }
                let found = self.sema.trait_by_ref(r).and_then(|t| t.method(&field.name));
                match found {
                    Some(m) => (Type::Fn(m.sig.clone()), false),
                    None => {
                        self.error(field.span, format!("trait '{}' has no method '{}'", r, field.name));
                        (Type::Unresolved, false)
                    }
                }
            }
            Type::Unresolved => (Type::Unresolved, false),
            other => {
                self.error(field.span, format!("type '{}' has no field '{}'", other, field.name));
                (Type::Unresolved, false)
            }
        };

        TExpr::new(
            TExprKind::Field {
                object: Box::new(object),
                field: field.name.clone(),
                through_ptr,
                cpp,
            },
            ty,
            span,
        )
    }

    fn check_index(&mut self, id: ScopeId, object: &Expr, index: &Expr, span: Span) -> TExpr {
        let object = self.check_expr(id, object, None);
        let index = self.check_expr(id, index, Some(&Type::INT));
        if !index.ty.is_integer() && !index.ty.is_unresolved() {
            self.error(index.span, format!("index must be an integer, found '{}'", index.ty));
        }

        let ty = match &object.ty {
            Type::Slice(elem) => (**elem).clone(),
            Type::Prim(TypeTag::Str) => Type::CHAR,
            Type::Ptr(elem) => {
                if !self.forest.is_unsafe(id) {
                    self.error(span, "indexing a pointer requires an unsafe block");
                }
                (**elem).clone()
            }
            Type::Unresolved => Type::Unresolved,
            other => {
                self.error(object.span, format!("type '{}' cannot be indexed", other));
                Type::Unresolved
            }
        };

        let kind = TExprKind::Index {
            object: Box::new(object),
            index: Box::new(index),
        };
        TExpr::new(kind, ty, span)
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    fn check_unary(
        &mut self,
        id: ScopeId,
        op: UnaryOp,
        operand: &Expr,
        expected: Option<&Type>,
        span: Span,
    ) -> TExpr {
        let operand = match op {
            UnaryOp::Neg | UnaryOp::Not => self.check_expr(id, operand, expected),
            UnaryOp::Addr | UnaryOp::Deref => self.check_expr(id, operand, None),
        };

        let ty = match op {
            UnaryOp::Neg => match &operand.ty {
                Type::Prim(tag) if tag.is_signed() || tag.is_float() => operand.ty.clone(),
                Type::Unresolved => Type::Unresolved,
                other => {
                    self.error(span, format!("cannot negate '{}'", other));
                    Type::Unresolved
                }
            },
            UnaryOp::Not => {
                if operand.ty.is_bool() || operand.ty.is_integer() {
                    operand.ty.clone()
                } else {
                    self.error(span, format!("cannot apply '!' to '{}'", operand.ty));
                    Type::Unresolved
                }
            }
            UnaryOp::Addr => match value_type_error(&operand.ty) {
                Some(_) => {
                    self.error(span, format!("cannot take the address of a '{}' value", operand.ty));
                    Type::Unresolved
                }
                None => Type::Ptr(Box::new(operand.ty.clone())),
            },
            UnaryOp::Deref => match &operand.ty {
                Type::Ptr(inner) => {
                    if !self.forest.is_unsafe(id) {
                        self.error(span, "dereferencing a pointer requires an unsafe block");
                    }
                    (**inner).clone()
                }
                Type::Prim(TypeTag::Voidptr) => {
                    self.error(span, "cannot dereference 'voidptr'");
                    Type::Unresolved
                }
                Type::Unresolved => Type::Unresolved,
                other => {
                    self.error(span, format!("cannot dereference '{}'", other));
                    Type::Unresolved
                }
            },
        };

        let kind = TExprKind::Unary {
            op,
            operand: Box::new(operand),
        };
        TExpr::new(kind, ty, span)
    }

    fn check_binary(&mut self, id: ScopeId, op: BinOp, left: &Expr, right: &Expr, span: Span) -> TExpr {
        // an untyped literal on the left takes its type from the right
        let (left, right) = if is_untyped_literal(left) && !is_untyped_literal(right) {
            let right = self.check_expr(id, right, None);
            let left = self.check_expr(id, left, Some(&right.ty));
            (left, right)
        } else {
            let left = self.check_expr(id, left, None);
            let right = self.check_expr(id, right, Some(&left.ty));
            (left, right)
        };

        let ty = self.binary_type(id, op, &left, &right, span);
        let kind = TExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        TExpr::new(kind, ty, span)
    }

    /// Result type of `left op right`, reporting invalid operand types
    pub(super) fn binary_type(&mut self, id: ScopeId, op: BinOp, left: &TExpr, right: &TExpr, span: Span) -> Type {
        let (lt, rt) = (&left.ty, &right.ty);

        if op.is_logical() {
            if !lt.is_bool() || !rt.is_bool() {
                self.error(
                    span,
                    format!("'{}' expects 'bool' operands, found '{}' and '{}'", op.symbol(), lt, rt),
                );
            }
            return Type::BOOL;
        }

        if op.is_comparison() {
            let ok = match op {
                BinOp::Eq | BinOp::Ne => lt.compatible(rt),
                _ => {
                    lt.is_unresolved()
                        || rt.is_unresolved()
                        || (lt == rt && (lt.is_numeric() || lt.is_str() || *lt == Type::CHAR))
                }
            };
            if !ok {
                self.error(span, format!("cannot compare '{}' with '{}'", lt, rt));
            }
            return Type::BOOL;
        }

        if lt.is_unresolved() || rt.is_unresolved() {
            return Type::Unresolved;
        }

        if matches!(op, BinOp::Add | BinOp::Sub) && lt.is_ptr() && rt.is_integer() {
            if !self.forest.is_unsafe(id) {
                self.error(span, "pointer arithmetic requires an unsafe block");
            }
            return lt.clone();
        }

        let valid = match op {
            BinOp::Add => lt == rt && (lt.is_numeric() || lt.is_str()),
            BinOp::Sub | BinOp::Mul | BinOp::Div => lt == rt && lt.is_numeric(),
            BinOp::Rem => lt == rt && lt.is_integer(),
            BinOp::Shl | BinOp::Shr => lt.is_integer() && rt.is_integer(),
            _ => lt == rt && lt.is_integer(),
        };
        if valid {
            lt.clone()
        } else {
            self.error(
                span,
                format!("cannot apply '{}' to '{}' and '{}'", op.symbol(), lt, rt),
            );
            Type::Unresolved
        }
    }

    fn check_cast(&mut self, id: ScopeId, inner: &Expr, ty: &TypeExpr, span: Span) -> TExpr {
        let target = self.resolve_value_type(id, ty);
        let value = self.check_expr(id, inner, None);

        match cast_kind(&value.ty, &target) {
            CastKind::Allowed => {}
            CastKind::Unsafe if self.forest.is_unsafe(id) => {}
            CastKind::Unsafe => {
                self.error(
                    span,
                    format!("casting '{}' to '{}' requires an unsafe block", value.ty, target),
                );
            }
            CastKind::Invalid => {
                self.error(span, format!("cannot cast '{}' to '{}'", value.ty, target));
            }
        }

        let kind = TExprKind::Cast {
            expr: Box::new(value),
            ty: target.clone(),
        };
        TExpr::new(kind, target, span)
    }

    fn check_array(&mut self, id: ScopeId, elems: &[Expr], expected: Option<&Type>, span: Span) -> TExpr {
        let mut elem = match expected {
            Some(Type::Slice(elem)) => Some((**elem).clone()),
            _ => None,
        };

        let mut checked = Vec::with_capacity(elems.len());
        for expr in elems {
            let value = self.check_expr(id, expr, elem.as_ref());
            match &elem {
                Some(ty) => self.expect_assignable(ty, &value),
                None => elem = Some(value.ty.clone()),
            }
            checked.push(value);
        }

        let Some(elem) = elem else {
            self.error(span, "cannot infer the element type of an empty array");
            return TExpr::error(span);
        };
        if let Some(message) = value_type_error(&elem) {
            self.error(span, message);
            return TExpr::error(span);
        }

        let ty = Type::Slice(Box::new(elem.clone()));
        TExpr::new(TExprKind::Array { elem, elems: checked }, ty, span)
    }
}

fn is_untyped_literal(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Int(_) | ExprKind::Float(_))
}

enum CastKind {
    Allowed,
    Unsafe,
    Invalid,
}

fn cast_kind(from: &Type, to: &Type) -> CastKind {
    if from == to || from.is_unresolved() || to.is_unresolved() {
        return CastKind::Allowed;
    }
    let scalar = |ty: &Type| ty.is_numeric() || *ty == Type::CHAR || matches!(ty, Type::Enum(_));
    if (scalar(from) || from.is_bool()) && scalar(to) {
        return CastKind::Allowed;
    }
    let address = |ty: &Type| {
        ty.is_pointer_like() || matches!(ty, Type::Prim(TypeTag::Intptr | TypeTag::UIntptr))
    };
    if address(from) && address(to) {
        return CastKind::Unsafe;
    }
    CastKind::Invalid
}

#[cfg(test)]
mod tests {
    use crate::sema::checker::tests::check;
    use pretty_assertions::assert_eq;

    /// Messages without their positions
    fn messages(text: &str) -> Vec<String> {
        check(text)
            .1
            .iter()
            .map(|log| log.splitn(3, ' ').nth(2).unwrap_or_default().to_string())
            .collect()
    }

    fn in_main(body: &str) -> Vec<String> {
        messages(&format!("fn main() {{\n{}\n}}\n", body))
    }

    #[test]
    fn test_literal_coercion() {
        assert!(in_main("var a u8 = 255; var f f64 = 1; var b i8 = -128; var c = a + 1").is_empty());
        assert_eq!(in_main("var a u8 = 300"), vec!["constant 300 overflows u8"]);
        assert_eq!(in_main("var a i8 = 1; var b = a < 200"), vec!["constant 200 overflows i8"]);
    }

    #[test]
    fn test_64_bit_literal_edges() {
        assert!(
            in_main(
                "var a u64 = 0xFFFFFFFFFFFFFFFF; var b uint = 18446744073709551615; \
                 var c i64 = -9223372036854775808; var d i64 = -0x8000000000000000"
            )
            .is_empty()
        );
        assert_eq!(
            in_main("var a i64 = 9223372036854775808"),
            vec!["constant 9223372036854775808 overflows i64"]
        );
        assert_eq!(in_main("var a u64 = -1"), vec!["constant -1 overflows u64"]);
        assert_eq!(
            in_main("var a = 0xFFFFFFFFFFFFFFFF"),
            vec!["constant 18446744073709551615 overflows int"]
        );
    }

    #[test]
    fn test_arithmetic_needs_identical_types() {
        assert_eq!(
            in_main("var a i32 = 1; var b i64 = 2; var c = a + b"),
            vec!["cannot apply '+' to 'i32' and 'i64'"]
        );
        assert!(in_main("var s = \"a\" + \"b\"; var t = s == \"ab\"").is_empty());
        assert_eq!(in_main("var x = 1.5 % 2.0"), vec!["cannot apply '%' to 'f64' and 'f64'"]);
        assert_eq!(
            in_main("var x = true && 1"),
            vec!["'&&' expects 'bool' operands, found 'bool' and 'int'"]
        );
    }

    #[test]
    fn test_unsafe_operations() {
        assert_eq!(
            messages("fn f(p *int) int { return *p }\nfn main() {}\n"),
            vec!["dereferencing a pointer requires an unsafe block"]
        );
        assert!(messages("fn f(p *int) int { unsafe { return *(p + 1) } }\nfn main() {}\n").is_empty());
        assert_eq!(
            messages("fn f(p voidptr) { unsafe { var x = *p } }\nfn main() {}\n"),
            vec!["cannot dereference 'voidptr'"]
        );
        assert_eq!(
            in_main("var p *int = nil; var a = p as intptr"),
            vec!["casting '*int' to 'intptr' requires an unsafe block"]
        );
    }

    #[test]
    fn test_structs_and_fields() {
        let prefix = "struct P { x int, y int }\n";
        assert!(messages(&format!(
            "{}fn main() {{\n  var p = P(1, 2);\n  var q = &p;\n  q.x = 3;\n  p.y = q.x\n}}\n",
            prefix
        ))
        .is_empty());
        assert_eq!(
            messages(&format!("{}fn main() {{ var p = P(1) }}\n", prefix)),
            vec!["struct 'P' has 2 fields, found 1 argument"]
        );
        assert_eq!(
            messages(&format!("{}fn main() {{ var p = P(1, 2); var z = p.z }}\n", prefix)),
            vec!["struct 'P' has no field 'z'"]
        );
    }

    #[test]
    fn test_call_arity() {
        let decls = "fn g(a int) {}\ncpp fn printf(fmt str, ...) int\ncpp fn puts(s str) int\n";
        assert!(messages(&format!("{}fn main() {{ cpp::printf(\"%d\", 1, 2) }}\n", decls)).is_empty());
        assert_eq!(
            messages(&format!("{}fn main() {{\n  g();\n  cpp::puts(\"a\", 2)\n}}\n", decls)),
            vec!["expected 1 argument, found 0", "expected 1 argument, found 2"]
        );
        assert_eq!(
            messages(&format!("{}fn main() {{ puts(\"a\") }}\n", decls)),
            vec!["undefined identifier 'puts'"]
        );
    }

    #[test]
    fn test_enum_items() {
        let decls = "enum Color { Red, Green }\n";
        assert!(messages(&format!("{}fn main() {{ var c = Color::Green; var d = c == Color::Red }}\n", decls)).is_empty());
        assert_eq!(
            messages(&format!("{}fn main() {{ var c = Color::Blue }}\n", decls)),
            vec!["enum 'Color' has no item 'Blue'"]
        );
    }

    #[test]
    fn test_traits_through_pointers() {
        let decls = "trait Shape { fn area() f64 }\n";
        assert!(messages(&format!("{}fn total(s *Shape) f64 {{ return s.area() }}\nfn main() {{}}\n", decls)).is_empty());
        assert_eq!(
            messages(&format!("{}fn f(s *Shape) {{ s.perimeter() }}\nfn main() {{}}\n", decls)),
            vec!["trait 'Shape' has no method 'perimeter'"]
        );
    }

    #[test]
    fn test_names_that_are_not_values() {
        assert_eq!(
            messages("struct P { x int }\nfn main() {\n  var a = P;\n  var b = len;\n  var c = nil\n}\n"),
            vec![
                "'P' is a type, not a value",
                "built-in 'len' can only be called",
                "cannot infer the type of 'c' from 'nil'",
            ]
        );
    }

    #[test]
    fn test_arrays() {
        assert!(in_main("var a = [1, 2, 3]; var n = len(a); var x = a[0] + 1").is_empty());
        assert!(in_main("var a []u8 = [1, 2]").is_empty());
        assert_eq!(
            in_main("var a = [1, \"x\"]"),
            vec!["mismatched types: expected 'int', found 'str'"]
        );
    }
}
