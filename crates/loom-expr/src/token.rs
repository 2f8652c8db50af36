//! Token Types
//!
//! Token definitions for the template expression language.

/// Source span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Token with kind and span
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(Box<str>),
    Boolean(bool),
    Null,
    Undefined,

    Identifier(Box<str>),

    // Keywords
    This,
    Typeof,

    // Punctuators
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    QuestionDot,
    Question,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    LessThan,
    LessThanEq,
    GreaterThan,
    GreaterThanEq,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    AmpersandAmpersand,
    PipePipe,
    QuestionQuestion,

    // Special
    Eof,
    Error(Box<str>),
}

impl TokenKind {
    /// Short human-readable description for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::String(s) => format!("string {:?}", s),
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::Eof => "end of expression".to_string(),
            TokenKind::Error(msg) => msg.to_string(),
            other => format!("{:?}", other),
        }
    }
}

/// Map an identifier to a keyword or literal token
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    Some(match s {
        "true" => TokenKind::Boolean(true),
        "false" => TokenKind::Boolean(false),
        "null" => TokenKind::Null,
        "undefined" => TokenKind::Undefined,
        "this" => TokenKind::This,
        "typeof" => TokenKind::Typeof,
        _ => return None,
    })
}
