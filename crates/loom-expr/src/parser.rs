//! Expression Parser
//!
//! Recursive descent over the token stream, one function per precedence
//! level, lowest first.

use super::ast::{BinaryOp, Expr, ExprKind, Literal, LogicalOp, UnaryOp};
use super::error::ExprError;
use super::lexer::Lexer;
use super::token::{Span, Token, TokenKind};

/// Expression parser
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    previous: Token,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current: current.clone(),
            previous: current,
        }
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn error_here(&self) -> ExprError {
        match &self.current.kind {
            TokenKind::Error(msg) => ExprError::new(msg.to_string(), self.current.span),
            other => ExprError::new(format!("unexpected {}", other.describe()), self.current.span),
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<(), ExprError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(ExprError::new(
                format!("expected {}, found {}", kind.describe(), self.current.kind.describe()),
                self.current.span,
            ))
        }
    }

    /// Parse a complete expression; trailing tokens are an error
    pub fn parse(mut self) -> Result<Expr, ExprError> {
        if self.check(&TokenKind::Eof) {
            return Err(ExprError::new("empty expression", self.current.span));
        }
        let expr = self.parse_expression()?;
        if !self.check(&TokenKind::Eof) {
            return Err(self.error_here());
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expr, ExprError> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExprError> {
        let test = self.parse_logical_or()?;

        if self.check(&TokenKind::Question) {
            self.advance();
            let consequent = self.parse_expression()?;
            self.consume(TokenKind::Colon)?;
            let alternate = self.parse_expression()?;
            let span = test.span.merge(alternate.span);
            return Ok(Expr::new(
                ExprKind::Conditional {
                    test: Box::new(test),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                },
                span,
            ));
        }

        Ok(test)
    }

    fn logical(operator: LogicalOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::Logical { operator, left: Box::new(left), right: Box::new(right) },
            span,
        )
    }

    fn binary(operator: BinaryOp, left: Expr, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::Binary { operator, left: Box::new(left), right: Box::new(right) },
            span,
        )
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_logical_and()?;

        loop {
            let op = match self.current.kind {
                TokenKind::PipePipe => LogicalOp::Or,
                TokenKind::QuestionQuestion => LogicalOp::NullishCoalescing,
                _ => break,
            };
            self.advance();
            let right = self.parse_logical_and()?;
            left = Self::logical(op, left, right);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::AmpersandAmpersand) {
            self.advance();
            let right = self.parse_equality()?;
            left = Self::logical(LogicalOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Equal,
                TokenKind::NotEq => BinaryOp::NotEqual,
                TokenKind::EqEqEq => BinaryOp::StrictEqual,
                TokenKind::NotEqEq => BinaryOp::StrictNotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current.kind {
                TokenKind::LessThan => BinaryOp::LessThan,
                TokenKind::LessThanEq => BinaryOp::LessThanEq,
                TokenKind::GreaterThan => BinaryOp::GreaterThan,
                TokenKind::GreaterThanEq => BinaryOp::GreaterThanEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let start = self.current.span;
        let operator = match self.current.kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Typeof => UnaryOp::Typeof,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let argument = self.parse_unary()?;
        let span = start.merge(argument.span);
        Ok(Expr::new(
            ExprKind::Unary { operator, argument: Box::new(argument) },
            span,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current.kind {
                TokenKind::Dot | TokenKind::QuestionDot => {
                    let optional = self.check(&TokenKind::QuestionDot);
                    self.advance();
                    let property = self.parse_property_name()?;
                    let span = expr.span.merge(self.previous.span);
                    expr = Expr::new(
                        ExprKind::Member { object: Box::new(expr), property, optional },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous.span);
                    expr = Expr::new(
                        ExprKind::Index { object: Box::new(expr), index: Box::new(index) },
                        span,
                    );
                }
                TokenKind::LParen => {
                    self.advance();
                    let arguments = self.parse_list(TokenKind::RParen)?;
                    let span = expr.span.merge(self.previous.span);
                    expr = Expr::new(
                        ExprKind::Call { callee: Box::new(expr), arguments },
                        span,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Property names after `.` may be keywords (`a.this`, `a.null`)
    fn parse_property_name(&mut self) -> Result<Box<str>, ExprError> {
        let name: Box<str> = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::This => "this".into(),
            TokenKind::Typeof => "typeof".into(),
            TokenKind::Null => "null".into(),
            TokenKind::Undefined => "undefined".into(),
            TokenKind::Boolean(b) => b.to_string().into(),
            _ => return Err(self.error_here()),
        };
        self.advance();
        Ok(name)
    }

    /// Comma-separated expressions up to `close`, which is consumed
    fn parse_list(&mut self, close: TokenKind) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();

        if !self.check(&close) {
            items.push(self.parse_expression()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&close) {
                    break;
                }
                items.push(self.parse_expression()?);
            }
        }
        self.consume(close)?;

        Ok(items)
    }

    fn parse_object(&mut self, start: Span) -> Result<Expr, ExprError> {
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            let key: Box<str> = match &self.current.kind {
                TokenKind::Identifier(name) => name.clone(),
                TokenKind::String(s) => s.clone(),
                TokenKind::Number(n) => crate::value::format_number(*n).into(),
                _ => return Err(self.error_here()),
            };
            let key_span = self.current.span;
            self.advance();

            let value = if self.check(&TokenKind::Colon) {
                self.advance();
                self.parse_expression()?
            } else {
                // Shorthand `{ name }`
                Expr::new(ExprKind::Identifier(key.clone()), key_span)
            };
            properties.push((key, value));

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.consume(TokenKind::RBrace)?;

        Ok(Expr::new(ExprKind::Object(properties), start.merge(self.previous.span)))
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let span = self.current.span;
        let literal = match &self.current.kind {
            TokenKind::Number(n) => Literal::Number(*n),
            TokenKind::String(s) => Literal::String(s.clone()),
            TokenKind::Boolean(b) => Literal::Bool(*b),
            TokenKind::Null => Literal::Null,
            TokenKind::Undefined => Literal::Undefined,
            TokenKind::This => {
                self.advance();
                return Ok(Expr::new(ExprKind::This, span));
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                return Ok(Expr::new(ExprKind::Identifier(name), span));
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_list(TokenKind::RBracket)?;
                return Ok(Expr::new(ExprKind::Array(items), span.merge(self.previous.span)));
            }
            TokenKind::LBrace => {
                self.advance();
                return self.parse_object(span);
            }
            _ => return Err(self.error_here()),
        };
        self.advance();
        Ok(Expr::new(ExprKind::Literal(literal), span))
    }
}
