//! Expression Lexer
//!
//! Tokenizes template expressions. Lexical errors are reported in-band as
//! [`TokenKind::Error`] tokens and turned into parse errors by the parser.

use super::token::{keyword_from_str, Span, Token, TokenKind};
use std::iter::Peekable;
use std::str::Chars;

/// Expression lexer
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<Chars<'src>>,
    pos: u32,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            pos: 0,
        }
    }

    /// Current byte offset
    pub fn position(&self) -> u32 {
        self.pos
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.pos as usize..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;
        let Some(c) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match c {
            'a'..='z' | 'A'..='Z' | '_' | '$' => self.scan_identifier(start),
            '0'..='9' => self.scan_number(start),
            '"' | '\'' => self.scan_string(c),

            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,

            '.' => {
                if matches!(self.peek(), Some('0'..='9')) {
                    self.scan_number(start)
                } else {
                    TokenKind::Dot
                }
            }

            '?' => {
                if self.eat('?') {
                    TokenKind::QuestionQuestion
                } else if self.peek() == Some('.') && !matches!(self.peek_next(), Some('0'..='9')) {
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                }
            }

            '<' => {
                if self.eat('=') { TokenKind::LessThanEq } else { TokenKind::LessThan }
            }

            '>' => {
                if self.eat('=') { TokenKind::GreaterThanEq } else { TokenKind::GreaterThan }
            }

            '=' => {
                if self.eat('=') {
                    if self.eat('=') { TokenKind::EqEqEq } else { TokenKind::EqEq }
                } else {
                    TokenKind::Error("assignment is not supported in expressions".into())
                }
            }

            '!' => {
                if self.eat('=') {
                    if self.eat('=') { TokenKind::NotEqEq } else { TokenKind::NotEq }
                } else {
                    TokenKind::Bang
                }
            }

            '&' => {
                if self.eat('&') {
                    TokenKind::AmpersandAmpersand
                } else {
                    TokenKind::Error("bitwise operators are not supported".into())
                }
            }

            '|' => {
                if self.eat('|') {
                    TokenKind::PipePipe
                } else {
                    TokenKind::Error("bitwise operators are not supported".into())
                }
            }

            _ => TokenKind::Error(format!("unexpected character `{}`", c).into()),
        };

        Token::new(kind, Span::new(start, self.pos))
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self, start: u32) -> TokenKind {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start as usize..self.pos as usize];
        keyword_from_str(text).unwrap_or_else(|| TokenKind::Identifier(text.into()))
    }

    /// Scan a decimal number literal (integer, fraction, exponent)
    fn scan_number(&mut self, start: u32) -> TokenKind {
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }

        if self.peek() == Some('.') && matches!(self.peek_next(), Some('0'..='9')) {
            self.advance();
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let next = self.peek_next();
            if matches!(next, Some('0'..='9' | '+' | '-')) {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                while matches!(self.peek(), Some('0'..='9')) {
                    self.advance();
                }
            }
        }

        let text = &self.source[start as usize..self.pos as usize];
        match text.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Error(format!("invalid number `{}`", text).into()),
        }
    }

    /// Scan a quoted string literal
    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return TokenKind::Error("unterminated string".into()),
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some(other) => value.push(other),
                    None => return TokenKind::Error("unterminated string".into()),
                },
                Some(c) => value.push(c),
            }
        }

        TokenKind::String(value.into())
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).map(|t| t.kind).collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1 2.5 .5 1e3"), vec![
            TokenKind::Number(1.0),
            TokenKind::Number(2.5),
            TokenKind::Number(0.5),
            TokenKind::Number(1000.0),
        ]);
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(kinds(r#"'a' "b\"c" 'd\n'"#), vec![
            TokenKind::String("a".into()),
            TokenKind::String("b\"c".into()),
            TokenKind::String("d\n".into()),
        ]);
        assert!(matches!(kinds("'open")[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_operators() {
        assert_eq!(kinds("a?.b ?? c === d !== e"), vec![
            TokenKind::Identifier("a".into()),
            TokenKind::QuestionDot,
            TokenKind::Identifier("b".into()),
            TokenKind::QuestionQuestion,
            TokenKind::Identifier("c".into()),
            TokenKind::EqEqEq,
            TokenKind::Identifier("d".into()),
            TokenKind::NotEqEq,
            TokenKind::Identifier("e".into()),
        ]);
    }

    #[test]
    fn test_ternary_with_decimal_is_not_optional_chain() {
        assert_eq!(kinds("a?.5:1"), vec![
            TokenKind::Identifier("a".into()),
            TokenKind::Question,
            TokenKind::Number(0.5),
            TokenKind::Colon,
            TokenKind::Number(1.0),
        ]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(kinds("this true null undefined typeof"), vec![
            TokenKind::This,
            TokenKind::Boolean(true),
            TokenKind::Null,
            TokenKind::Undefined,
            TokenKind::Typeof,
        ]);
    }

    #[test]
    fn test_assignment_rejected() {
        assert!(matches!(kinds("a = 1")[1], TokenKind::Error(_)));
    }
}
