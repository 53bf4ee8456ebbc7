use tools::errors::ReportDiag;

use super::{Expr, ExprKind, Operator, Parser, ParserError, TokenKind, MAX_ARG_COUNT};

/// Expression parsing, one method per precedence level. Each level parses
/// the next tighter one first then folds operators at its own level, which
/// makes every binary operator left-associative.
impl Parser {
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ParserError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParserError> {
        let target = self.parse_or()?;

        if self.match_kind(&TokenKind::Equal) {
            let equal_range = self.last_range;
            // Right associative: x = y = 3
            let value = self.parse_assignment()?;
            let range = target.range.to(value.range);

            return match target.kind {
                ExprKind::Variable { name } => Ok(Expr::new(
                    ExprKind::Assign {
                        name,
                        value: Box::new(value),
                    },
                    range,
                )),
                ExprKind::Get { object, name } => Ok(Expr::new(
                    ExprKind::Set {
                        object,
                        name,
                        value: Box::new(value),
                    },
                    range,
                )),
                // Not a hard stop: we report it and hand back the value so
                // the rest of the statement still parses
                _ => {
                    self.errors
                        .push(ParserError::InvalidAssignmentTarget.to_diagnostic(equal_range));
                    Ok(value)
                }
            };
        }

        Ok(target)
    }

    fn parse_or(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_and()?;

        while self.match_kind(&TokenKind::Or) {
            let right = self.parse_and()?;
            let range = left.range.to(right.range);
            left = Expr::new(
                ExprKind::Logical {
                    operator: Operator::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_equality()?;

        while self.match_kind(&TokenKind::And) {
            let right = self.parse_equality()?;
            let range = left.range.to(right.range);
            left = Expr::new(
                ExprKind::Logical {
                    operator: Operator::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_comparison()?;

        while matches!(
            self.at().kind,
            TokenKind::BangEqual | TokenKind::EqualEqual
        ) {
            let operator = self.eat_operator()?;
            let right = self.parse_comparison()?;
            left = Self::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_addition()?;

        while matches!(
            self.at().kind,
            TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual
        ) {
            let operator = self.eat_operator()?;
            let right = self.parse_addition()?;
            left = Self::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_addition(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_multiplication()?;

        while matches!(self.at().kind, TokenKind::Plus | TokenKind::Minus) {
            let operator = self.eat_operator()?;
            let right = self.parse_multiplication()?;
            left = Self::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_multiplication(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_unary()?;

        while matches!(self.at().kind, TokenKind::Star | TokenKind::Slash) {
            let operator = self.eat_operator()?;
            let right = self.parse_unary()?;
            left = Self::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParserError> {
        if matches!(self.at().kind, TokenKind::Bang | TokenKind::Minus) {
            let start = self.at().range;
            let operator = self.eat_operator()?;
            let right = self.parse_unary()?;
            let range = start.to(right.range);

            return Ok(Expr::new(
                ExprKind::Unary {
                    operator,
                    right: Box::new(right),
                },
                range,
            ));
        }

        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.parse_primary()?;

        // Calls and property accesses chain freely: a.b(1).c
        loop {
            if self.match_kind(&TokenKind::OpenParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(&TokenKind::Dot) {
                let name = self.expect_identifier()?;
                let range = expr.range.to(self.last_range);
                expr = Expr::new(
                    ExprKind::Get {
                        object: Box::new(expr),
                        name,
                    },
                    range,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParserError> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(&TokenKind::CloseParen) {
            loop {
                if arguments.len() >= MAX_ARG_COUNT {
                    // Advisory only, parsing carries on
                    let range = self.at().range;
                    self.errors
                        .push(ParserError::TooManyArguments.to_diagnostic(range));
                }

                arguments.push(self.parse_expression()?);

                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect_token(TokenKind::CloseParen, "')' after arguments")?;
        let range = callee.range.to(self.last_range);

        Ok(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                arguments,
            },
            range,
        ))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParserError> {
        let start = self.at().range;

        match self.at().kind.clone() {
            TokenKind::False => {
                self.eat()?;
                Ok(Expr::new(ExprKind::BoolLiteral { value: false }, start))
            }
            TokenKind::True => {
                self.eat()?;
                Ok(Expr::new(ExprKind::BoolLiteral { value: true }, start))
            }
            TokenKind::Nil => {
                self.eat()?;
                Ok(Expr::new(ExprKind::NilLiteral, start))
            }
            TokenKind::Number(value) => {
                self.eat()?;
                Ok(Expr::new(ExprKind::NumberLiteral { value }, start))
            }
            TokenKind::Str(value) => {
                self.eat()?;
                Ok(Expr::new(ExprKind::StrLiteral { value }, start))
            }
            TokenKind::Identifier(name) => {
                self.eat()?;
                Ok(Expr::new(ExprKind::Variable { name }, start))
            }
            TokenKind::This => {
                self.eat()?;
                Ok(Expr::new(ExprKind::This, start))
            }
            TokenKind::Super => {
                self.eat()?;
                self.expect_token(TokenKind::Dot, "'.' after 'super'")?;
                let method = self.expect_identifier()?;
                Ok(Expr::new(
                    ExprKind::Super { method },
                    start.to(self.last_range),
                ))
            }
            TokenKind::OpenParen => {
                self.eat()?;
                let expr = self.parse_expression()?;
                self.expect_token(TokenKind::CloseParen, "')' after expression")?;
                Ok(Expr::new(
                    ExprKind::Grouping {
                        expr: Box::new(expr),
                    },
                    start.to(self.last_range),
                ))
            }
            _ => Err(ParserError::ExpectedExpression),
        }
    }

    fn eat_operator(&mut self) -> Result<Operator, ParserError> {
        let tk = self.eat()?;

        let operator = match tk.kind {
            TokenKind::Plus => Operator::Plus,
            TokenKind::Minus => Operator::Minus,
            TokenKind::Star => Operator::Star,
            TokenKind::Slash => Operator::Slash,
            TokenKind::Bang => Operator::Bang,
            TokenKind::BangEqual => Operator::BangEqual,
            TokenKind::Equal => Operator::Equal,
            TokenKind::EqualEqual => Operator::EqualEqual,
            TokenKind::Greater => Operator::Greater,
            TokenKind::GreaterEqual => Operator::GreaterEqual,
            TokenKind::Less => Operator::Less,
            TokenKind::LessEqual => Operator::LessEqual,
            TokenKind::And => Operator::And,
            TokenKind::Or => Operator::Or,
            _ => return Err(ParserError::ExpectedExpression),
        };

        Ok(operator)
    }

    fn binary(left: Expr, operator: Operator, right: Expr) -> Expr {
        let range = left.range.to(right.range);
        Expr::new(
            ExprKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            range,
        )
    }
}
