use std::rc::Rc;

use tools::errors::ReportDiag;

use super::{
    Expr, ExprKind, FunctionDecl, Parser, ParserError, Stmt, StmtKind, TokenKind, MAX_ARG_COUNT,
};

impl Parser {
    pub(super) fn parse_declaration(&mut self) -> Result<Stmt, ParserError> {
        match self.at().kind {
            TokenKind::Var => self.parse_var_declaration(),
            TokenKind::Fun => self.parse_fn_declaration(),
            TokenKind::Class => self.parse_class_declaration(),
            _ => self.parse_statement(),
        }
    }

    pub(super) fn parse_var_declaration(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        let name = self.expect_identifier()?;

        // No initializer leaves the variable declared but unusable until
        // it gets assigned
        let initializer = if self.match_kind(&TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect_token(TokenKind::Semicolon, "';' after variable declaration")?;

        Ok(Stmt::new(
            StmtKind::VarDeclaration { name, initializer },
            start.to(self.last_range),
        ))
    }

    fn parse_fn_declaration(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        let declaration = self.parse_function()?;

        Ok(Stmt::new(
            StmtKind::FnDeclaration { declaration },
            start.to(self.last_range),
        ))
    }

    fn parse_class_declaration(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        let name = self.expect_identifier()?;

        let superclass = if self.match_kind(&TokenKind::Less) {
            let superclass_name = self.expect_identifier()?;
            Some(Expr::new(
                ExprKind::Variable {
                    name: superclass_name,
                },
                self.last_range,
            ))
        } else {
            None
        };

        self.expect_token(TokenKind::OpenBrace, "'{' before class body")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();
        while !self.check(&TokenKind::CloseBrace) && !self.is_eof() {
            methods.push(self.parse_function()?);
        }

        self.expect_token(TokenKind::CloseBrace, "'}' after class body")?;

        Ok(Stmt::new(
            StmtKind::ClassDeclaration {
                name,
                superclass,
                methods,
            },
            start.to(self.last_range),
        ))
    }

    // Shared by fun declarations and class methods, which have the same
    // shape minus the leading keyword
    fn parse_function(&mut self) -> Result<Rc<FunctionDecl>, ParserError> {
        let name = self.expect_identifier()?;

        self.expect_token(TokenKind::OpenParen, "'(' after function name")?;

        let mut params: Vec<String> = Vec::new();
        if !self.check(&TokenKind::CloseParen) {
            loop {
                if params.len() >= MAX_ARG_COUNT {
                    let range = self.at().range;
                    self.errors
                        .push(ParserError::TooManyParameters.to_diagnostic(range));
                }

                params.push(self.expect_identifier()?);

                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_token(TokenKind::CloseParen, "')' after parameters")?;
        self.expect_token(TokenKind::OpenBrace, "'{' before function body")?;

        let body = self.parse_block_body()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }
}
