use std::collections::VecDeque;

mod decl_parser;
mod errors_parser;
mod expr_parser;
mod stmt_parser;

pub use crate::ast::{Expr, ExprKind, FunctionDecl, Operator, Stmt, StmtKind};
pub use crate::lexer::{Token, TokenKind};

use tools::errors::{Diagnostic, ReportDiag};
use tools::span::SourceRange;

pub use self::errors_parser::ParserError;

/// Hard cap on call arguments and function parameters
pub const MAX_ARG_COUNT: usize = 255;

#[derive(Default)]
pub struct Parser {
    tokens: VecDeque<Token>,
    pub ast_nodes: Vec<Stmt>,
    pub errors: Vec<Diagnostic>,
    // Range of the last token we consumed, used to close parent ranges
    last_range: SourceRange,
}

impl Parser {
    /// Parses the whole token stream into statements. On a syntax error we
    /// record a diagnostic, discard tokens up to a statement boundary and
    /// keep going, so several errors can be reported in one pass.
    pub fn build_ast(&mut self, tokens: VecDeque<Token>) {
        self.ast_nodes.clear();
        self.errors.clear();
        self.tokens = tokens;

        while !self.is_eof() {
            match self.parse_declaration() {
                Ok(stmt) => self.ast_nodes.push(stmt),
                Err(e) => {
                    self.report(e);
                    self.synchronize();
                }
            }
        }
    }

    fn report(&mut self, err: ParserError) {
        // We point at the offending token
        let range = self.at().range;
        self.errors.push(err.to_diagnostic(range));
    }

    // Discards tokens until a likely statement boundary: just after a ';'
    // or just before a keyword that starts a declaration
    fn synchronize(&mut self) {
        while !self.is_eof() {
            if let Ok(tk) = self.eat() {
                if tk.kind == TokenKind::Semicolon {
                    return;
                }
            }

            match self.at().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
        }
    }

    fn at(&self) -> &Token {
        // The lexer guarantees a trailing Eof that is never consumed
        self.tokens.front().unwrap()
    }

    fn eat(&mut self) -> Result<Token, ParserError> {
        match self.tokens.pop_front() {
            Some(tk) => {
                self.last_range = tk.range;
                Ok(tk)
            }
            None => Err(ParserError::EmptyTokenBufferUsed),
        }
    }

    // Consumes the token only when it matches, so a failed expectation
    // leaves the stream in place for synchronization
    fn expect_token(&mut self, token_kind: TokenKind, what: &str) -> Result<Token, ParserError> {
        if self.at().kind == token_kind {
            self.eat()
        } else {
            Err(ParserError::MissingToken(what.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParserError> {
        if let TokenKind::Identifier(name) = &self.at().kind {
            let name = name.clone();
            self.eat()?;
            Ok(name)
        } else {
            Err(ParserError::ExpectedIdentifier)
        }
    }

    fn match_kind(&mut self, token_kind: &TokenKind) -> bool {
        if &self.at().kind == token_kind {
            let _ = self.eat();
            true
        } else {
            false
        }
    }

    fn check(&self, token_kind: &TokenKind) -> bool {
        &self.at().kind == token_kind
    }

    // Is end of file
    fn is_eof(&self) -> bool {
        self.at().kind == TokenKind::Eof
    }
}
