//! X recursive descent parser
//!
//! The first syntax error aborts the unit; the driver turns it into a
//! positioned log entry.

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::*;
use crate::frontend::lexer::{Lexer, Token, TokenKind};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// End offset of the last consumed token
    prev_end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            prev_end: 0,
        }
    }

    /// Parse a complete source file
    pub fn parse_unit(&mut self) -> CompileResult<SourceUnit> {
        let start = self.lexer.peek()?.span;
        let mut uses = Vec::new();
        let mut items = Vec::new();

        while self.check(&TokenKind::Use)? {
            uses.push(self.parse_use()?);
        }

        while !self.check(&TokenKind::Eof)? {
            if self.check(&TokenKind::Use)? {
                let token = self.bump()?;
                return Err(CompileError::parser(
                    "use declarations must come before other declarations",
                    token.span,
                ));
            }
            if self.match_token(&TokenKind::Semi)? {
                continue;
            }
            items.push(self.parse_item()?);
        }

        Ok(SourceUnit::new(uses, items, Span::new(start.start, self.prev_end)))
    }

    // ==================== Items ====================

    fn parse_use(&mut self) -> CompileResult<UseDecl> {
        let start = self.expect(TokenKind::Use)?.span;
        let name = self.expect_identifier()?;
        self.match_token(&TokenKind::Semi)?;
        Ok(UseDecl {
            name,
            span: Span::new(start.start, self.prev_end),
        })
    }

    fn parse_item(&mut self) -> CompileResult<Item> {
        let start = self.lexer.peek()?.span;
        let cpp = self.match_token(&TokenKind::Cpp)?;

        let lead = self.lexer.peek()?.kind.clone();
        let kind = match lead {
            TokenKind::Fn => ItemKind::Fn(self.parse_fn()?),
            TokenKind::Var | TokenKind::Const => {
                let decl = self.parse_var()?;
                self.match_token(&TokenKind::Semi)?;
                ItemKind::Var(decl)
            }
            TokenKind::Type => {
                let decl = self.parse_type_alias()?;
                self.match_token(&TokenKind::Semi)?;
                ItemKind::TypeAlias(decl)
            }
            TokenKind::Struct => ItemKind::Struct(self.parse_struct()?),
            TokenKind::Trait => ItemKind::Trait(self.parse_trait()?),
            TokenKind::Enum => ItemKind::Enum(self.parse_enum()?),
            _ => {
                let token = self.bump()?;
                return Err(CompileError::parser(
                    format!("expected declaration, found `{}`", token.kind),
                    token.span,
                ));
            }
        };

        Ok(Item::new(kind, cpp, Span::new(start.start, self.prev_end)))
    }

    fn parse_fn(&mut self) -> CompileResult<FnDecl> {
        self.expect(TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;
        let (params, variadic) = self.parse_params()?;
        self.expect(TokenKind::RParen)?;

        let ret = if self.starts_type()? {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if self.check(&TokenKind::LBrace)? {
            Some(self.parse_block()?)
        } else {
            self.match_token(&TokenKind::Semi)?;
            None
        };

        Ok(FnDecl {
            name,
            params,
            variadic,
            ret,
            body,
        })
    }

    /// Parameter list without the parentheses
    fn parse_params(&mut self) -> CompileResult<(Vec<Param>, bool)> {
        let mut params = Vec::new();
        let mut variadic = false;

        while !self.check(&TokenKind::RParen)? {
            if self.match_token(&TokenKind::Ellipsis)? {
                variadic = true;
                break;
            }

            let start = self.lexer.peek()?.span;
            let mutable = self.match_token(&TokenKind::Mut)?;
            let name = self.expect_identifier()?;
            let ty = self.parse_type()?;
            params.push(Param {
                name,
                ty,
                mutable,
                span: Span::new(start.start, self.prev_end),
            });

            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }

        Ok((params, variadic))
    }

    fn parse_var(&mut self) -> CompileResult<VarDecl> {
        let constant = if self.match_token(&TokenKind::Const)? {
            true
        } else {
            self.expect(TokenKind::Var)?;
            false
        };
        let name = self.expect_identifier()?;

        let ty = if self.starts_type()? {
            Some(self.parse_type()?)
        } else {
            None
        };

        let init = if self.match_token(&TokenKind::Eq)? {
            Some(self.parse_expr()?)
        } else {
            None
        };

        if ty.is_none() && init.is_none() {
            return Err(CompileError::parser(
                format!("variable '{}' needs a type or an initializer", name.name),
                name.span,
            ));
        }

        Ok(VarDecl {
            name,
            ty,
            init,
            constant,
        })
    }

    fn parse_type_alias(&mut self) -> CompileResult<TypeAliasDecl> {
        self.expect(TokenKind::Type)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Eq)?;
        let ty = self.parse_type()?;
        Ok(TypeAliasDecl { name, ty })
    }

    fn parse_struct(&mut self) -> CompileResult<StructDecl> {
        self.expect(TokenKind::Struct)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace)? {
            let field = self.expect_identifier()?;
            let ty = self.parse_type()?;
            fields.push(FieldDecl { name: field, ty });
            if !self.match_token(&TokenKind::Comma)? {
                self.match_token(&TokenKind::Semi)?;
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(StructDecl { name, fields })
    }

    fn parse_trait(&mut self) -> CompileResult<TraitDecl> {
        self.expect(TokenKind::Trait)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;

        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBrace)? {
            let start = self.expect(TokenKind::Fn)?.span;
            let method = self.expect_identifier()?;
            self.expect(TokenKind::LParen)?;
            let (params, variadic) = self.parse_params()?;
            if variadic {
                return Err(CompileError::parser(
                    "trait methods cannot be variadic",
                    Span::new(start.start, self.prev_end),
                ));
            }
            self.expect(TokenKind::RParen)?;
            let ret = if self.starts_type()? {
                Some(self.parse_type()?)
            } else {
                None
            };
            self.match_token(&TokenKind::Semi)?;
            methods.push(MethodSig {
                name: method,
                params,
                ret,
                span: Span::new(start.start, self.prev_end),
            });
        }
        self.expect(TokenKind::RBrace)?;

        Ok(TraitDecl { name, methods })
    }

    fn parse_enum(&mut self) -> CompileResult<EnumDecl> {
        self.expect(TokenKind::Enum)?;
        let name = self.expect_identifier()?;
        let repr = if self.match_token(&TokenKind::Colon)? {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::LBrace)?;

        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace)? {
            let item = self.expect_identifier()?;
            let value = if self.match_token(&TokenKind::Eq)? {
                Some(self.parse_expr()?)
            } else {
                None
            };
            items.push(EnumItemDecl { name: item, value });
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;

        Ok(EnumDecl { name, repr, items })
    }

    // ==================== Types ====================

    fn starts_type(&mut self) -> CompileResult<bool> {
        Ok(matches!(
            self.lexer.peek()?.kind,
            TokenKind::Identifier(_)
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::Fn
                | TokenKind::Cpp
        ))
    }

    fn parse_type(&mut self) -> CompileResult<TypeExpr> {
        let start = self.lexer.peek()?.span;

        if self.match_token(&TokenKind::Star)? {
            let inner = self.parse_type()?;
            return Ok(TypeExpr::new(
                TypeExprKind::Ptr(Box::new(inner)),
                Span::new(start.start, self.prev_end),
            ));
        }

        if self.match_token(&TokenKind::LBracket)? {
            self.expect(TokenKind::RBracket)?;
            let inner = self.parse_type()?;
            return Ok(TypeExpr::new(
                TypeExprKind::Slice(Box::new(inner)),
                Span::new(start.start, self.prev_end),
            ));
        }

        if self.match_token(&TokenKind::Fn)? {
            self.expect(TokenKind::LParen)?;
            let mut params = Vec::new();
            while !self.check(&TokenKind::RParen)? {
                params.push(self.parse_type()?);
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            let ret = if self.starts_type()? {
                Some(Box::new(self.parse_type()?))
            } else {
                None
            };
            return Ok(TypeExpr::new(
                TypeExprKind::Fn { params, ret },
                Span::new(start.start, self.prev_end),
            ));
        }

        let path = self.parse_path()?;
        let span = path.span;
        Ok(TypeExpr::new(TypeExprKind::Path(path), span))
    }

    fn parse_path(&mut self) -> CompileResult<Path> {
        let start = self.lexer.peek()?.span;
        let cpp = if self.match_token(&TokenKind::Cpp)? {
            self.expect(TokenKind::ColonColon)?;
            true
        } else {
            false
        };

        let mut qualifiers = Vec::new();
        let mut name = self.expect_identifier()?;
        // `cpp::` names are never qualified further
        while !cpp && self.match_token(&TokenKind::ColonColon)? {
            qualifiers.push(name);
            name = self.expect_identifier()?;
        }

        Ok(Path {
            cpp,
            qualifiers,
            name,
            span: Span::new(start.start, self.prev_end),
        })
    }

    // ==================== Statements ====================

    fn parse_block(&mut self) -> CompileResult<Block> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();

        while !self.check(&TokenKind::RBrace)? {
            if self.check(&TokenKind::Eof)? {
                let token = self.bump()?;
                return Err(CompileError::parser("unclosed block, expected `}`", token.span));
            }
            if self.match_token(&TokenKind::Semi)? {
                continue;
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Block::new(stmts, Span::new(start.start, self.prev_end)))
    }

    fn parse_stmt(&mut self) -> CompileResult<Stmt> {
        let start = self.lexer.peek()?.span;

        let lead = self.lexer.peek()?.kind.clone();
        let (kind, simple) = match lead {
            TokenKind::Var | TokenKind::Const => (StmtKind::Var(self.parse_var()?), true),
            TokenKind::Type => (StmtKind::TypeAlias(self.parse_type_alias()?), true),
            TokenKind::Return => {
                self.bump()?;
                let value = if self.check(&TokenKind::Semi)? || self.check(&TokenKind::RBrace)? {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                (StmtKind::Return(value), true)
            }
            TokenKind::Break => {
                self.bump()?;
                (StmtKind::Break, true)
            }
            TokenKind::Continue => {
                self.bump()?;
                (StmtKind::Continue, true)
            }
            TokenKind::If => (self.parse_if()?, false),
            TokenKind::For => {
                self.bump()?;
                let cond = if self.check(&TokenKind::LBrace)? {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let body = self.parse_block()?;
                (StmtKind::For { cond, body }, false)
            }
            TokenKind::Defer => {
                self.bump()?;
                (StmtKind::Defer(self.parse_block()?), false)
            }
            TokenKind::Unsafe => {
                self.bump()?;
                (StmtKind::Unsafe(self.parse_block()?), false)
            }
            TokenKind::LBrace => (StmtKind::Block(self.parse_block()?), false),
            TokenKind::Fn => {
                return Err(CompileError::parser(
                    "functions cannot be declared inside a block",
                    start,
                ));
            }
            TokenKind::Struct | TokenKind::Trait | TokenKind::Enum | TokenKind::Use => {
                let token = self.bump()?;
                return Err(CompileError::parser(
                    format!("`{}` declarations are only allowed at top level", token.kind),
                    token.span,
                ));
            }
            TokenKind::Cpp if !matches!(self.lexer.peek_at(1)?.kind, TokenKind::ColonColon) => {
                return Err(CompileError::parser(
                    "foreign declarations are only allowed at top level",
                    start,
                ));
            }
            _ => (self.parse_expr_stmt()?, true),
        };

        if simple && !self.check(&TokenKind::RBrace)? {
            let token = self.bump()?;
            if !matches!(token.kind, TokenKind::Semi) {
                return Err(CompileError::parser(
                    format!("expected `;`, found `{}`", token.kind),
                    token.span,
                ));
            }
        }

        Ok(Stmt::new(kind, Span::new(start.start, self.prev_end)))
    }

    fn parse_if(&mut self) -> CompileResult<StmtKind> {
        self.expect(TokenKind::If)?;
        let cond = self.parse_expr()?;
        let then = self.parse_block()?;

        let otherwise = if self.match_token(&TokenKind::Else)? {
            if self.check(&TokenKind::If)? {
                let start = self.lexer.peek()?.span;
                let kind = self.parse_if()?;
                let stmt = Stmt::new(kind, Span::new(start.start, self.prev_end));
                Some(Else::If(Box::new(stmt)))
            } else {
                Some(Else::Block(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(StmtKind::If {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_expr_stmt(&mut self) -> CompileResult<StmtKind> {
        let target = self.parse_expr()?;
        if let Some(op) = self.peek_assign_op()? {
            self.bump()?;
            let value = self.parse_expr()?;
            return Ok(StmtKind::Assign { target, op, value });
        }
        Ok(StmtKind::Expr(target))
    }

    // ==================== Expressions ====================

    pub fn parse_expr(&mut self) -> CompileResult<Expr> {
        self.parse_expr_with_precedence(0)
    }

    fn parse_expr_with_precedence(&mut self, min_prec: u8) -> CompileResult<Expr> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op()? {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }

            self.bump()?;
            let right = self.parse_expr_with_precedence(prec + 1)?;

            let span = left.span.to(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        Ok(left)
    }

    fn peek_binary_op(&mut self) -> CompileResult<Option<BinOp>> {
        Ok(match &self.lexer.peek()?.kind {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Percent => Some(BinOp::Rem),
            TokenKind::Amp => Some(BinOp::BitAnd),
            TokenKind::Pipe => Some(BinOp::BitOr),
            TokenKind::Caret => Some(BinOp::BitXor),
            TokenKind::Shl => Some(BinOp::Shl),
            TokenKind::Shr => Some(BinOp::Shr),
            TokenKind::AmpAmp => Some(BinOp::And),
            TokenKind::PipePipe => Some(BinOp::Or),
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::NotEq => Some(BinOp::Ne),
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::LtEq => Some(BinOp::Le),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::GtEq => Some(BinOp::Ge),
            _ => None,
        })
    }

    fn peek_assign_op(&mut self) -> CompileResult<Option<Option<BinOp>>> {
        Ok(match &self.lexer.peek()?.kind {
            TokenKind::Eq => Some(None),
            TokenKind::PlusEq => Some(Some(BinOp::Add)),
            TokenKind::MinusEq => Some(Some(BinOp::Sub)),
            TokenKind::StarEq => Some(Some(BinOp::Mul)),
            TokenKind::SlashEq => Some(Some(BinOp::Div)),
            TokenKind::PercentEq => Some(Some(BinOp::Rem)),
            TokenKind::AmpEq => Some(Some(BinOp::BitAnd)),
            TokenKind::PipeEq => Some(Some(BinOp::BitOr)),
            TokenKind::CaretEq => Some(Some(BinOp::BitXor)),
            TokenKind::ShlEq => Some(Some(BinOp::Shl)),
            TokenKind::ShrEq => Some(Some(BinOp::Shr)),
            _ => None,
        })
    }

    fn parse_unary_expr(&mut self) -> CompileResult<Expr> {
        let start = self.lexer.peek()?.span;

        let op = match self.lexer.peek()?.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Amp => Some(UnaryOp::Addr),
            TokenKind::Star => Some(UnaryOp::Deref),
            _ => None,
        };

        match op {
            Some(op) => {
                self.bump()?;
                let operand = self.parse_unary_expr()?;
                let span = start.to(operand.span);

                // Fold negative literals so range checks see the real value
                if op == UnaryOp::Neg {
                    match operand.kind {
                        ExprKind::Int(value) => {
                            let value = value
                                .checked_neg()
                                .ok_or_else(|| CompileError::parser("integer literal out of range", span))?;
                            return Ok(Expr::new(ExprKind::Int(value), span));
                        }
                        ExprKind::Float(value) => {
                            return Ok(Expr::new(ExprKind::Float(-value), span));
                        }
                        _ => {}
                    }
                }

                Ok(Expr::new(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            None => self.parse_postfix_expr(),
        }
    }

    fn parse_postfix_expr(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            if self.match_token(&TokenKind::Dot)? {
                let field = self.expect_identifier()?;
                let span = Span::new(expr.span.start, self.prev_end);
                expr = Expr::new(
                    ExprKind::Field {
                        object: Box::new(expr),
                        field,
                    },
                    span,
                );
            } else if self.match_token(&TokenKind::LBracket)? {
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                let span = Span::new(expr.span.start, self.prev_end);
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else if self.match_token(&TokenKind::LParen)? {
                let args = self.parse_call_args()?;
                self.expect(TokenKind::RParen)?;
                let span = Span::new(expr.span.start, self.prev_end);
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.match_token(&TokenKind::As)? {
                let ty = self.parse_type()?;
                let span = expr.span.to(ty.span);
                expr = Expr::new(
                    ExprKind::Cast {
                        expr: Box::new(expr),
                        ty,
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_call_args(&mut self) -> CompileResult<Vec<Expr>> {
        let mut args = Vec::new();

        if !self.check(&TokenKind::RParen)? {
            args.push(self.parse_expr()?);
            while self.match_token(&TokenKind::Comma)? {
                if self.check(&TokenKind::RParen)? {
                    break;
                }
                args.push(self.parse_expr()?);
            }
        }

        Ok(args)
    }

    fn parse_primary_expr(&mut self) -> CompileResult<Expr> {
        let start = self.lexer.peek()?.span;

        let lead = self.lexer.peek()?.kind.clone();
        match lead {
            TokenKind::Identifier(_) | TokenKind::Cpp => {
                let path = self.parse_path()?;
                let span = path.span;
                Ok(Expr::new(ExprKind::Path(path), span))
            }
            TokenKind::LParen => {
                self.bump()?;
                let mut inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                inner.span = Span::new(start.start, self.prev_end);
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.bump()?;
                let elems = self.parse_array_elems()?;
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::new(
                    ExprKind::Array(elems),
                    Span::new(start.start, self.prev_end),
                ))
            }
            _ => self.parse_literal_expr(),
        }
    }

    fn parse_array_elems(&mut self) -> CompileResult<Vec<Expr>> {
        let mut elems = Vec::new();
        while !self.check(&TokenKind::RBracket)? {
            elems.push(self.parse_expr()?);
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(elems)
    }

    fn parse_literal_expr(&mut self) -> CompileResult<Expr> {
        let token = self.bump()?;
        let span = token.span;

        let kind = match token.kind {
            TokenKind::IntLiteral(s) => ExprKind::Int(parse_int_literal(&s, 10, span)?),
            TokenKind::HexLiteral(s) => ExprKind::Int(parse_int_literal(&s[2..], 16, span)?),
            TokenKind::FloatLiteral(s) => {
                let value = s
                    .replace('_', "")
                    .parse()
                    .map_err(|_| CompileError::parser("invalid float literal", span))?;
                ExprKind::Float(value)
            }
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Nil => ExprKind::Nil,
            TokenKind::CharLiteral(s) => ExprKind::Char(parse_char_literal(&s, span)?),
            TokenKind::StringLiteral(s) => ExprKind::Str(parse_string_literal(&s, span)?),
            other => {
                return Err(CompileError::parser(
                    format!("expected expression, found `{}`", other),
                    span,
                ));
            }
        };

        Ok(Expr::new(kind, span))
    }

    // ==================== Helpers ====================

    fn bump(&mut self) -> CompileResult<Token> {
        let token = self.lexer.next_token()?;
        self.prev_end = token.span.end;
        Ok(token)
    }

    fn check(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        self.lexer.check(expected)
    }

    fn match_token(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        if self.check(expected)? {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, expected: TokenKind) -> CompileResult<Token> {
        let token = self.lexer.expect(expected)?;
        self.prev_end = token.span.end;
        Ok(token)
    }

    fn expect_identifier(&mut self) -> CompileResult<Ident> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Identifier(name) => Ok(Ident::new(name, token.span)),
            other => Err(CompileError::parser(
                format!("expected identifier, found `{}`", other),
                token.span,
            )),
        }
    }
}

/// Literal magnitudes cover the whole `u64` range; the sign is folded in later
fn parse_int_literal(digits: &str, radix: u32, span: Span) -> CompileResult<i128> {
    let digits = digits.replace('_', "");
    u64::from_str_radix(&digits, radix)
        .map(i128::from)
        .map_err(|_| CompileError::parser("integer literal out of range", span))
}

fn parse_escape(chars: &mut std::str::Chars<'_>, span: Span) -> CompileResult<char> {
    match chars.next() {
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),
        Some('\\') => Ok('\\'),
        Some('\'') => Ok('\''),
        Some('"') => Ok('"'),
        Some('0') => Ok('\0'),
        Some('x') => {
            let hex: String = chars.take(2).collect();
            u8::from_str_radix(&hex, 16)
                .map(char::from)
                .map_err(|_| CompileError::parser("invalid hex escape", span))
        }
        _ => Err(CompileError::parser("invalid escape sequence", span)),
    }
}

fn parse_char_literal(s: &str, span: Span) -> CompileResult<char> {
    let inner = &s[1..s.len() - 1];
    let mut chars = inner.chars();
    let c = match chars.next() {
        Some('\\') => parse_escape(&mut chars, span)?,
        Some(c) => c,
        None => return Err(CompileError::parser("empty character literal", span)),
    };
    if chars.next().is_some() {
        return Err(CompileError::parser("character literal holds more than one character", span));
    }
    Ok(c)
}

fn parse_string_literal(s: &str, span: Span) -> CompileResult<String> {
    let inner = &s[1..s.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            result.push(parse_escape(&mut chars, span)?);
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> SourceUnit {
        Parser::new(source).parse_unit().unwrap()
    }

    fn parse_err(source: &str) -> CompileError {
        Parser::new(source).parse_unit().unwrap_err()
    }

    #[test]
    fn test_parse_function() {
        let unit = parse("fn add(a i32, mut b i32) i32 { return a + b }");

        assert_eq!(unit.items.len(), 1);
        match &unit.items[0].kind {
            ItemKind::Fn(f) => {
                assert_eq!(f.name.name, "add");
                assert_eq!(f.params.len(), 2);
                assert!(!f.params[0].mutable);
                assert!(f.params[1].mutable);
                assert!(f.ret.is_some());
                assert!(f.body.is_some());
            }
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn test_parse_cpp_prototype() {
        let unit = parse("cpp fn printf(fmt str, ...) int;\nfn main() {}");

        assert!(unit.items[0].cpp);
        match &unit.items[0].kind {
            ItemKind::Fn(f) => {
                assert!(f.variadic);
                assert!(f.body.is_none());
            }
            _ => panic!("expected function"),
        }
        assert!(!unit.items[1].cpp);
    }

    #[test]
    fn test_parse_uses_and_paths() {
        let unit = parse("use math\nfn main() { out(math::Color::Red); cpp::puts(\"x\") }");

        assert_eq!(unit.uses.len(), 1);
        assert!(unit.uses_package("math"));
        let ItemKind::Fn(f) = &unit.items[0].kind else {
            panic!("expected function");
        };
        let body = f.body.as_ref().unwrap();
        let StmtKind::Expr(Expr {
            kind: ExprKind::Call { args, .. },
            ..
        }) = &body.stmts[0].kind
        else {
            panic!("expected call");
        };
        match &args[0].kind {
            ExprKind::Path(path) => {
                assert_eq!(path.qualifiers.len(), 2);
                assert_eq!(path.name.name, "Red");
                assert_eq!(path.to_string(), "math::Color::Red");
            }
            _ => panic!("expected path"),
        }
        let StmtKind::Expr(Expr {
            kind: ExprKind::Call { callee, .. },
            ..
        }) = &body.stmts[1].kind
        else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, ExprKind::Path(p) if p.cpp && p.name.name == "puts"));
    }

    #[test]
    fn test_parse_declarations() {
        let unit = parse(
            "struct Point { x i32, y i32 }\n\
             enum Color: u8 { Red, Green = 4, Blue }\n\
             trait Shape { fn area() f64; fn name() str }\n\
             type Id = *Point\n\
             const LIMIT = 10\n\
             var table []fn(i32) bool",
        );

        assert_eq!(unit.items.len(), 6);
        assert!(matches!(&unit.items[0].kind, ItemKind::Struct(s) if s.fields.len() == 2));
        match &unit.items[1].kind {
            ItemKind::Enum(e) => {
                assert!(e.repr.is_some());
                assert_eq!(e.items.len(), 3);
                assert!(matches!(e.items[1].value, Some(Expr { kind: ExprKind::Int(4), .. })));
            }
            _ => panic!("expected enum"),
        }
        assert!(matches!(&unit.items[2].kind, ItemKind::Trait(t) if t.methods.len() == 2));
        assert!(matches!(
            &unit.items[3].kind,
            ItemKind::TypeAlias(TypeAliasDecl { ty: TypeExpr { kind: TypeExprKind::Ptr(_), .. }, .. })
        ));
        assert!(matches!(&unit.items[4].kind, ItemKind::Var(v) if v.constant && v.ty.is_none()));
        match &unit.items[5].kind {
            ItemKind::Var(v) => match &v.ty.as_ref().unwrap().kind {
                TypeExprKind::Slice(inner) => {
                    assert!(matches!(inner.kind, TypeExprKind::Fn { ref params, ret: Some(_) } if params.len() == 1));
                }
                _ => panic!("expected slice type"),
            },
            _ => panic!("expected var"),
        }
    }

    #[test]
    fn test_parse_statements() {
        let unit = parse(
            "fn main() {\n\
               var i = 0\n\
               ;for i < 10 { i += 1; if i == 5 { break } else if i == 6 { continue } else { } }\n\
               defer { outln(i) }\n\
               unsafe { *p = 1 }\n\
             }",
        );

        let ItemKind::Fn(f) = &unit.items[0].kind else {
            panic!("expected function");
        };
        let stmts = &f.body.as_ref().unwrap().stmts;
        assert_eq!(stmts.len(), 4);
        assert!(matches!(stmts[0].kind, StmtKind::Var(_)));
        match &stmts[1].kind {
            StmtKind::For { cond: Some(_), body } => {
                assert!(matches!(body.stmts[0].kind, StmtKind::Assign { op: Some(BinOp::Add), .. }));
                assert!(matches!(
                    &body.stmts[1].kind,
                    StmtKind::If { otherwise: Some(Else::If(_)), .. }
                ));
            }
            _ => panic!("expected for"),
        }
        assert!(matches!(stmts[2].kind, StmtKind::Defer(_)));
        assert!(matches!(stmts[3].kind, StmtKind::Unsafe(_)));
    }

    #[test]
    fn test_precedence() {
        let unit = parse("var x = 1 + 2 * 3 == 7 && true");
        let ItemKind::Var(v) = &unit.items[0].kind else {
            panic!("expected var");
        };
        match &v.init.as_ref().unwrap().kind {
            ExprKind::Binary { op: BinOp::And, left, .. } => {
                assert!(matches!(left.kind, ExprKind::Binary { op: BinOp::Eq, .. }));
            }
            _ => panic!("expected && at the root"),
        }
    }

    #[test]
    fn test_literals() {
        let unit = parse(r#"var a = -5; var b = 0xFF; var c = 'x'; var d = "a\tb"; var e = 2.5"#);
        let inits: Vec<&ExprKind> = unit
            .items
            .iter()
            .map(|item| match &item.kind {
                ItemKind::Var(v) => &v.init.as_ref().unwrap().kind,
                _ => panic!("expected var"),
            })
            .collect();

        assert_eq!(inits[0], &ExprKind::Int(-5));
        assert_eq!(inits[1], &ExprKind::Int(255));
        assert_eq!(inits[2], &ExprKind::Char('x'));
        assert_eq!(inits[3], &ExprKind::Str("a\tb".to_string()));
        assert_eq!(inits[4], &ExprKind::Float(2.5));
    }

    #[test]
    fn test_integer_literal_range() {
        let unit = parse("var a = -0x8000000000000000; var b = 18446744073709551615; var c = -18446744073709551615");
        let inits: Vec<&ExprKind> = unit
            .items
            .iter()
            .map(|item| match &item.kind {
                ItemKind::Var(v) => &v.init.as_ref().unwrap().kind,
                _ => panic!("expected var"),
            })
            .collect();
        assert_eq!(inits[0], &ExprKind::Int(i64::MIN.into()));
        assert_eq!(inits[1], &ExprKind::Int(u64::MAX.into()));
        assert_eq!(inits[2], &ExprKind::Int(-i128::from(u64::MAX)));

        let err = parse_err("var a = 18446744073709551616");
        assert_eq!(err.message(), "integer literal out of range");
    }

    #[test]
    fn test_new_argument_as_type() {
        let unit = parse("fn main() { var p = new(*Node) }");
        let ItemKind::Fn(f) = &unit.items[0].kind else {
            panic!("expected function");
        };
        let StmtKind::Var(v) = &f.body.as_ref().unwrap().stmts[0].kind else {
            panic!("expected var");
        };
        let ExprKind::Call { args, .. } = &v.init.as_ref().unwrap().kind else {
            panic!("expected call");
        };
        let ty = args[0].as_type_expr().unwrap();
        assert!(matches!(ty.kind, TypeExprKind::Ptr(_)));
    }

    #[test]
    fn test_nested_function_rejected() {
        let err = parse_err("fn main() {\n  fn inner() {}\n}");
        assert!(err.message().contains("inside a block"));
        assert_eq!(err.span(), Some(Span::new(14, 16)));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse_err("fn main() { var a = 1 var b = 2 }");
        assert_eq!(err.message(), "expected `;`, found `var`");
    }

    #[test]
    fn test_use_after_items_rejected() {
        let err = parse_err("fn main() {}\nuse math");
        assert!(matches!(err, CompileError::Parser { .. }));
    }

    #[test]
    fn test_var_needs_type_or_init() {
        let err = parse_err("var x;");
        assert!(err.message().contains("needs a type or an initializer"));
    }
}
