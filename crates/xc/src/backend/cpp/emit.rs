//! C++ code emitter
//!
//! Walks the annotated program and produces the declarations spliced into
//! the prelude. Ordinary identifiers get a leading `_` so they can never
//! clash with C++ keywords or prelude names; `cpp` entities keep their raw
//! names and are only referenced, never declared.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::common::{CompileError, CompileResult};
use crate::frontend::ast::UnaryOp;
use crate::sema::{
    FnDef, FnSig, Module, Program, Scope, St, StructSymbol, SymbolRef, TExpr, TExprKind, Type,
    VarSt,
};
use crate::types::TypeTag;

const INDENT: &str = "  ";

/// Emitted name of an ordinary identifier
pub fn mangle(ident: &str) -> String {
    format!("_{}", ident)
}

/// Emitted name of a function-local binding
pub fn local_name(ident: &str, local_id: Option<u32>) -> String {
    match local_id {
        Some(id) => format!("_{}__{}", ident, id),
        None => mangle(ident),
    }
}

/// Emitted name of a declaration, qualified by its package namespace
pub fn symbol_name(sym: &SymbolRef) -> String {
    if sym.cpp_linked {
        return sym.ident.clone();
    }
    match &sym.package {
        Some(package) => format!("::{}::{}", package, mangle(&sym.ident)),
        None => mangle(&sym.ident),
    }
}

/// C++ spelling of a resolved type
pub fn type_name(ty: &Type) -> CompileResult<String> {
    let name = match ty {
        Type::Prim(tag) => tag.cpp_name()?.to_string(),
        Type::Struct(sym) | Type::Enum(sym) | Type::Trait(sym) => symbol_name(sym),
        Type::Ptr(inner) => format!("{}*", type_name(inner)?),
        Type::Slice(inner) => format!("array<{}>", type_name(inner)?),
        Type::Fn(sig) => format!("std::function<{}>", fn_type_name(sig)?),
        Type::Unresolved => {
            return Err(CompileError::codegen("unresolved type reached code generation"));
        }
    };
    Ok(name)
}

fn fn_type_name(sig: &FnSig) -> CompileResult<String> {
    let params = sig
        .params
        .iter()
        .map(type_name)
        .collect::<CompileResult<Vec<_>>>()?;
    Ok(format!("{}({})", type_name(&sig.ret)?, params.join(", ")))
}

fn escape_char(c: char, quote: char, out: &mut String) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if (c as u32) < 0x20 || c == '\u{7f}' => {
            let _ = write!(out, "\\{:03o}", c as u32);
        }
        c => out.push(c),
    }
}

fn str_literal(s: &str) -> String {
    let mut out = String::from("str(L\"");
    for c in s.chars() {
        escape_char(c, '"', &mut out);
    }
    out.push_str("\")");
    out
}

fn char_literal(c: char) -> String {
    let mut out = String::from("L'");
    escape_char(c, '\'', &mut out);
    out.push('\'');
    out
}

fn int_literal(value: i128, ty: &Type) -> String {
    match ty.prim() {
        Some(tag) if tag.is_float() => {
            let text = format!("{:?}", value as f64);
            if tag == TypeTag::F32 { text + "f" } else { text }
        }
        Some(TypeTag::U64 | TypeTag::UInt | TypeTag::UIntptr) => format!("{}ULL", value),
        _ if i32::try_from(value).is_ok() => value.to_string(),
        // `9223372036854775808LL` is not a valid C++ literal
        _ if value == i128::from(i64::MIN) => format!("({}LL - 1)", value + 1),
        _ => format!("{}LL", value),
    }
}

fn float_literal(value: f64, ty: &Type) -> String {
    let text = format!("{:?}", value);
    if ty.prim() == Some(TypeTag::F32) {
        text + "f"
    } else {
        text
    }
}

/// Generates the body of the C++ translation unit
pub struct CppEmitter {
    out: String,
    indent: usize,
    /// Deferred blocks emitted in the current function
    defers: usize,
}

impl CppEmitter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            defers: 0,
        }
    }

    /// Emit every package in dependency order, then the root program
    pub fn emit(mut self, program: &Program) -> CompileResult<String> {
        for package in &program.packages {
            self.emit_module(package)?;
        }
        self.emit_module(&program.root)?;
        Ok(self.out)
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn emit_module(&mut self, module: &Module) -> CompileResult<()> {
        if let Some(package) = &module.package {
            self.blank();
            self.line(format!("namespace {} {{", package));
        }

        self.emit_enums(module)?;
        self.emit_forward_decls(module);
        self.emit_structs(module)?;
        self.emit_traits(module)?;
        self.emit_prototypes(module)?;
        self.emit_globals(module)?;
        for def in &module.fns {
            self.emit_fn(module, def)?;
        }

        if let Some(package) = &module.package {
            self.blank();
            self.line(format!("}} // namespace {}", package));
        }
        Ok(())
    }

    fn emit_enums(&mut self, module: &Module) -> CompileResult<()> {
        for decl in module.table.enums().filter(|e| !e.cpp_linked) {
            self.blank();
            self.line(format!("enum class {}: {} {{", mangle(&decl.ident), decl.repr.cpp_name()?));
            self.indent += 1;
            for item in &decl.items {
                let value = int_literal(item.value, &Type::Prim(decl.repr));
                self.line(format!("{} = {},", mangle(&item.ident), value));
            }
            self.indent -= 1;
            self.line("};");
        }
        Ok(())
    }

    fn emit_forward_decls(&mut self, module: &Module) {
        let structs = module.table.structs().filter(|s| !s.cpp_linked).map(|s| &s.ident);
        let traits = module.table.traits().filter(|t| !t.cpp_linked).map(|t| &t.ident);
        let names: Vec<&String> = structs.chain(traits).collect();
        if names.is_empty() {
            return;
        }
        self.blank();
        for ident in names {
            self.line(format!("struct {};", mangle(ident)));
        }
    }

    fn emit_structs(&mut self, module: &Module) -> CompileResult<()> {
        for decl in struct_order(module) {
            self.blank();
            self.line(format!("struct {} {{", mangle(&decl.ident)));
            self.indent += 1;
            for field in &decl.fields {
                self.line(format!("{} {};", type_name(&field.ty)?, mangle(&field.ident)));
            }
            self.indent -= 1;
            self.line("};");
        }
        Ok(())
    }

    fn emit_traits(&mut self, module: &Module) -> CompileResult<()> {
        for decl in module.table.traits().filter(|t| !t.cpp_linked) {
            let name = mangle(&decl.ident);
            self.blank();
            self.line(format!("struct {} {{", name));
            self.indent += 1;
            self.line(format!("virtual ~{}() = default;", name));
            for method in &decl.methods {
                let params = method
                    .sig
                    .params
                    .iter()
                    .map(type_name)
                    .collect::<CompileResult<Vec<_>>>()?;
                self.line(format!(
                    "virtual {} {}({}) = 0;",
                    type_name(&method.sig.ret)?,
                    mangle(&method.ident),
                    params.join(", ")
                ));
            }
            self.indent -= 1;
            self.line("};");
        }
        Ok(())
    }

    fn emit_prototypes(&mut self, module: &Module) -> CompileResult<()> {
        let mut first = true;
        for decl in module.table.fns().filter(|f| !f.cpp_linked) {
            if first {
                self.blank();
                first = false;
            }
            let params = decl
                .params
                .iter()
                .map(|p| Ok(format!("{} {}", type_name(&p.ty)?, mangle(&p.ident))))
                .collect::<CompileResult<Vec<_>>>()?;
            self.line(format!(
                "{} {}({});",
                type_name(&decl.ret)?,
                mangle(&decl.ident),
                params.join(", ")
            ));
        }
        Ok(())
    }

    fn emit_globals(&mut self, module: &Module) -> CompileResult<()> {
        if !module.globals.is_empty() {
            self.blank();
        }
        for global in &module.globals {
            let constant = module
                .table
                .find_var(&global.ident, false)
                .is_some_and(|v| v.constant);
            let decl = format!(
                "{}{} {}",
                if constant { "const " } else { "" },
                type_name(&global.ty)?,
                mangle(&global.ident)
            );
            match &global.init {
                Some(init) => {
                    let init = self.expr(init)?;
                    self.line(format!("{} = {};", decl, init));
                }
                None => self.line(format!("{}{{}};", decl)),
            }
        }
        Ok(())
    }

    fn emit_fn(&mut self, module: &Module, def: &FnDef) -> CompileResult<()> {
        let Some(symbol) = module.table.find_fn(&def.ident, false) else {
            return Err(CompileError::codegen(format!(
                "function '{}' has no declaration",
                def.ident
            )));
        };

        let params = symbol
            .params
            .iter()
            .zip(&def.params)
            .map(|(param, emitted)| {
                Ok(format!(
                    "{} {}",
                    type_name(&param.ty)?,
                    local_name(&emitted.ident, emitted.local_id)
                ))
            })
            .collect::<CompileResult<Vec<_>>>()?;

        self.defers = 0;
        self.blank();
        self.line(format!(
            "{} {}({}) {{",
            type_name(&symbol.ret)?,
            mangle(&def.ident),
            params.join(", ")
        ));
        self.scope_body(&def.body)?;
        self.line("}");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn scope_body(&mut self, scope: &Scope) -> CompileResult<()> {
        self.indent += 1;
        for stmt in &scope.stmts {
            self.stmt(stmt)?;
        }
        self.indent -= 1;
        Ok(())
    }

    fn stmt(&mut self, stmt: &St) -> CompileResult<()> {
        match stmt {
            St::Var(var) => self.var(var)?,
            St::Assign { target, op, value } => {
                let target = self.expr(target)?;
                let value = self.expr(value)?;
                let op = op.map_or("", |op| op.symbol());
                self.line(format!("{} {}= {};", target, op, value));
            }
            St::If {
                cond,
                then,
                otherwise,
            } => self.if_chain("", cond, then, otherwise.as_deref())?,
            St::Loop { cond, body } => {
                match cond {
                    Some(cond) => {
                        let cond = self.expr(cond)?;
                        self.line(format!("while ({}) {{", cond));
                    }
                    None => self.line("for (;;) {"),
                }
                self.scope_body(body)?;
                self.line("}");
            }
            St::Ret(value) => match value {
                Some(value) => {
                    let value = self.expr(value)?;
                    self.line(format!("return {};", value));
                }
                None => self.line("return;"),
            },
            St::Deferred(body) => {
                let id = self.defers;
                self.defers += 1;
                self.line(format!("__xdefer __xdefer_{}([&](void) {{", id));
                self.scope_body(body)?;
                self.line("});");
            }
            St::Block(body) => {
                self.line("{");
                self.scope_body(body)?;
                self.line("}");
            }
            St::Expr(expr) => {
                let expr = self.expr(expr)?;
                self.line(format!("{};", expr));
            }
            St::Break => self.line("break;"),
            St::Continue => self.line("continue;"),
        }
        Ok(())
    }

    fn var(&mut self, var: &VarSt) -> CompileResult<()> {
        let decl = format!(
            "{}{} {}",
            if var.constant { "const " } else { "" },
            type_name(&var.ty)?,
            local_name(&var.ident, var.local_id)
        );
        match &var.init {
            Some(init) => {
                let init = self.expr(init)?;
                self.line(format!("{} = {};", decl, init));
            }
            None => self.line(format!("{}{{}};", decl)),
        }
        Ok(())
    }

    /// `if`, folding an else-scope holding only another `if` into `else if`
    fn if_chain(
        &mut self,
        prefix: &str,
        cond: &TExpr,
        then: &Scope,
        otherwise: Option<&Scope>,
    ) -> CompileResult<()> {
        let cond = self.expr(cond)?;
        self.line(format!("{}if ({}) {{", prefix, cond));
        self.scope_body(then)?;
        match otherwise {
            None => self.line("}"),
            Some(scope) => match scope.stmts.as_slice() {
                [
                    St::If {
                        cond,
                        then,
                        otherwise,
                    },
                ] => self.if_chain("} else ", cond, then, otherwise.as_deref())?,
                _ => {
                    self.line("} else {");
                    self.scope_body(scope)?;
                    self.line("}");
                }
            },
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn exprs(&self, exprs: &[TExpr]) -> CompileResult<String> {
        let parts = exprs
            .iter()
            .map(|e| self.expr(e))
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn expr(&self, expr: &TExpr) -> CompileResult<String> {
        let text = match &expr.kind {
            TExprKind::Int(value) => int_literal(*value, &expr.ty),
            TExprKind::Float(value) => float_literal(*value, &expr.ty),
            TExprKind::Bool(value) => value.to_string(),
            TExprKind::Char(c) => char_literal(*c),
            TExprKind::Str(s) => str_literal(s),
            TExprKind::Nil => "nil".to_string(),
            TExprKind::Local { ident, local_id } => local_name(ident, *local_id),
            TExprKind::Global(sym) | TExprKind::Func(sym) => symbol_name(sym),
            TExprKind::EnumItem { enum_ref, item } => {
                format!("{}::{}", symbol_name(enum_ref), mangle(item))
            }
            TExprKind::Call { callee, args } => {
                format!("{}({})", self.expr(callee)?, self.exprs(args)?)
            }
            TExprKind::Construct { target, args } => {
                format!("{}{{{}}}", symbol_name(target), self.exprs(args)?)
            }
            TExprKind::Builtin { builtin, args } => {
                format!("{}({})", builtin.cpp_name(), self.exprs(args)?)
            }
            TExprKind::New(ty) => format!("(XALLOC {}())", type_name(ty)?),
            TExprKind::Field {
                object,
                field,
                through_ptr,
                cpp,
            } => {
                let access = if *through_ptr { "->" } else { "." };
                let field = if *cpp { field.clone() } else { mangle(field) };
                format!("{}{}{}", self.expr(object)?, access, field)
            }
            TExprKind::Index { object, index } => {
                format!("{}[{}]", self.expr(object)?, self.expr(index)?)
            }
            TExprKind::Unary { op, operand } => {
                let op = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                    UnaryOp::Addr => "&",
                    UnaryOp::Deref => "*",
                };
                format!("({}{})", op, self.expr(operand)?)
            }
            TExprKind::Binary { op, left, right } => {
                format!("({} {} {})", self.expr(left)?, op.symbol(), self.expr(right)?)
            }
            TExprKind::Cast { expr, ty } => {
                format!("(({})({}))", type_name(ty)?, self.expr(expr)?)
            }
            TExprKind::Array { elem, elems } => {
                let elem = type_name(elem)?;
                if elems.is_empty() {
                    format!("array<{}>()", elem)
                } else {
                    format!("array<{}>({{{}}})", elem, self.exprs(elems)?)
                }
            }
            TExprKind::Error => {
                return Err(CompileError::codegen("erroneous expression reached code generation"));
            }
        };
        Ok(text)
    }
}

impl Default for CppEmitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Structs of `module` ordered so every struct follows the structs it holds
/// by value
fn struct_order(module: &Module) -> Vec<&StructSymbol> {
    fn visit<'m>(
        decl: &'m StructSymbol,
        module: &'m Module,
        done: &mut HashSet<&'m str>,
        order: &mut Vec<&'m StructSymbol>,
    ) {
        if !done.insert(decl.ident.as_str()) {
            return;
        }
        for field in &decl.fields {
            let Type::Struct(sym) = &field.ty else {
                continue;
            };
            if sym.cpp_linked || sym.package != module.package {
                continue;
            }
            if let Some(dep) = module.table.find_struct(&sym.ident, false) {
                visit(dep, module, done, order);
            }
        }
        order.push(decl);
    }

    let mut done = HashSet::new();
    let mut order = Vec::new();
    for decl in module.table.structs().filter(|s| !s.cpp_linked) {
        visit(decl, module, &mut done, &mut order);
    }
    order
}
