//! Abstract Syntax Tree
//!
//! Expression node definitions.

use super::token::Span;

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(Box<str>),
    This,
    Array(Vec<Expr>),
    Object(Vec<(Box<str>, Expr)>),
    Member { object: Box<Expr>, property: Box<str>, optional: bool },
    Index { object: Box<Expr>, index: Box<Expr> },
    Call { callee: Box<Expr>, arguments: Vec<Expr> },
    Unary { operator: UnaryOp, argument: Box<Expr> },
    Binary { operator: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Logical { operator: LogicalOp, left: Box<Expr>, right: Box<Expr> },
    Conditional { test: Box<Expr>, consequent: Box<Expr>, alternate: Box<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Box<str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}
