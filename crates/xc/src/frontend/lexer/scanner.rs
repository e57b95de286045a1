//! Token stream over logos with unbounded lookahead

use std::collections::VecDeque;

use super::token::{Token, TokenKind};
use crate::common::{CompileError, CompileResult, Span};
use logos::Logos;

/// Lexer for X source code.
///
/// Past the end of input it keeps yielding `Eof` tokens with an empty span
/// at the source length, so the parser never has to special-case running out.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    ahead: VecDeque<Token>,
    eof: Span,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            ahead: VecDeque::new(),
            eof: Span::new(source.len(), source.len()),
        }
    }

    pub fn next_token(&mut self) -> CompileResult<Token> {
        match self.ahead.pop_front() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    pub fn peek(&mut self) -> CompileResult<&Token> {
        self.peek_at(0)
    }

    /// Token `offset` places ahead of the cursor
    pub fn peek_at(&mut self, offset: usize) -> CompileResult<&Token> {
        while self.ahead.len() <= offset {
            let token = self.scan()?;
            self.ahead.push_back(token);
        }
        Ok(&self.ahead[offset])
    }

    /// Whether the next token is `expected`; callers pass payload-free kinds
    pub fn check(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        Ok(self.peek()?.kind == *expected)
    }

    pub fn expect(&mut self, expected: TokenKind) -> CompileResult<Token> {
        let token = self.next_token()?;
        if token.kind != expected {
            return Err(CompileError::parser(
                format!("expected `{}`, found `{}`", expected, token.kind),
                token.span,
            ));
        }
        Ok(token)
    }

    /// Tokenize the rest of the source, `Eof` included
    pub fn tokenize_all(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn scan(&mut self) -> CompileResult<Token> {
        let Some(result) = self.inner.next() else {
            return Ok(Token::new(TokenKind::Eof, self.eof));
        };
        let range = self.inner.span();
        let span = Span::new(range.start, range.end);
        match result {
            Ok(kind) => Ok(Token::new(kind, span)),
            Err(()) => Err(CompileError::lexer(
                format!("unexpected character '{}'", self.inner.slice()),
                span,
            )),
        }
    }
}
