use super::{Expr, ExprKind, Parser, ParserError, Stmt, StmtKind, TokenKind};

impl Parser {
    pub(super) fn parse_statement(&mut self) -> Result<Stmt, ParserError> {
        match self.at().kind {
            TokenKind::Print => self.parse_print_statement(),
            TokenKind::OpenBrace => self.parse_block_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_print_statement(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        let expr = self.parse_expression()?;
        self.expect_token(TokenKind::Semicolon, "';' after value")?;

        Ok(Stmt::new(
            StmtKind::Print { expr },
            start.to(self.last_range),
        ))
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, ParserError> {
        let expr = self.parse_expression()?;
        self.expect_token(TokenKind::Semicolon, "';' after expression")?;

        let range = expr.range.to(self.last_range);
        Ok(Stmt::new(StmtKind::Expression { expr }, range))
    }

    fn parse_block_statement(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        let statements = self.parse_block_body()?;

        Ok(Stmt::new(
            StmtKind::Block { statements },
            start.to(self.last_range),
        ))
    }

    // The opening brace is already consumed. Shared with function bodies,
    // which reuse the brace for their own syntax.
    pub(super) fn parse_block_body(&mut self) -> Result<Vec<Stmt>, ParserError> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(&TokenKind::CloseBrace) && !self.is_eof() {
            // Each statement recovers on its own, a bad one does not take
            // the whole block down
            match self.parse_declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    self.report(e);
                    self.synchronize();
                }
            }
        }

        self.expect_token(TokenKind::CloseBrace, "'}' after block")?;

        Ok(statements)
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        self.expect_token(TokenKind::OpenParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect_token(TokenKind::CloseParen, "')' after condition")?;

        let then_branch = Box::new(self.parse_statement()?);

        // The else binds to the nearest if
        let else_branch = if self.match_kind(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            start.to(self.last_range),
        ))
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        self.expect_token(TokenKind::OpenParen, "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.expect_token(TokenKind::CloseParen, "')' after condition")?;

        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::new(
            StmtKind::While { condition, body },
            start.to(self.last_range),
        ))
    }

    // There is no for loop at runtime: the clauses are rewritten here into
    // an equivalent while, wrapped in a block when an initializer exists
    fn parse_for_statement(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        self.expect_token(TokenKind::OpenParen, "'(' after 'for'")?;

        let initializer = if self.match_kind(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::Var) {
            Some(self.parse_var_declaration()?)
        } else {
            Some(self.parse_expression_statement()?)
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            // An absent condition never stops the loop
            Expr::new(ExprKind::BoolLiteral { value: true }, start)
        } else {
            self.parse_expression()?
        };
        self.expect_token(TokenKind::Semicolon, "';' after loop condition")?;

        let increment = if self.check(&TokenKind::CloseParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_token(TokenKind::CloseParen, "')' after for clauses")?;

        let mut body = self.parse_statement()?;
        let range = start.to(self.last_range);

        if let Some(increment) = increment {
            let increment_range = increment.range;
            body = Stmt::new(
                StmtKind::Block {
                    statements: vec![
                        body,
                        Stmt::new(StmtKind::Expression { expr: increment }, increment_range),
                    ],
                },
                range,
            );
        }

        body = Stmt::new(
            StmtKind::While {
                condition,
                body: Box::new(body),
            },
            range,
        );

        if let Some(initializer) = initializer {
            body = Stmt::new(
                StmtKind::Block {
                    statements: vec![initializer, body],
                },
                range,
            );
        }

        Ok(body)
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, ParserError> {
        let start = self.at().range;
        self.eat()?;

        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_token(TokenKind::Semicolon, "';' after return value")?;

        Ok(Stmt::new(
            StmtKind::Return { value },
            start.to(self.last_range),
        ))
    }
}
