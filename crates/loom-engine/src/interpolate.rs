//! Text interpolation
//!
//! Splits text into literal runs and `{{ EXPR }}` spans, left to right and
//! non-overlapping. A backslash directly before `{{` escapes the span: the
//! backslash is dropped and the braces are kept as literal text.

/// Piece of interpolated text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(String),
    /// Trimmed expression source
    Expr(&'a str),
}

/// Whether the text contains anything to evaluate
pub fn has_interpolation(text: &str) -> bool {
    split(text).iter().any(|s| matches!(s, Segment::Expr(_)))
}

/// Split text into segments
pub fn split(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(open) = rest.find("{{") {
        if rest[..open].ends_with('\\') {
            literal.push_str(&rest[..open - 1]);
            literal.push_str("{{");
            rest = &rest[open + 2..];
            continue;
        }

        let body = &rest[open + 2..];
        let Some(close) = body.find("}}") else {
            break;
        };

        literal.push_str(&rest[..open]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Expr(body[..close].trim()));
        rest = &body[close + 2..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split() {
        assert_eq!(split("a {{ x }} b{{y}}"), vec![
            Segment::Literal("a ".into()),
            Segment::Expr("x"),
            Segment::Literal(" b".into()),
            Segment::Expr("y"),
        ]);
    }

    #[test]
    fn test_escape() {
        assert_eq!(split("\\{{1+1}}"), vec![Segment::Literal("{{1+1}}".into())]);
        assert_eq!(split("\\{{a}} {{b}}"), vec![
            Segment::Literal("{{a}} ".into()),
            Segment::Expr("b"),
        ]);
    }

    #[test]
    fn test_unclosed_is_literal() {
        assert_eq!(split("x {{ y"), vec![Segment::Literal("x {{ y".into())]);
        assert!(!has_interpolation("plain"));
        assert!(has_interpolation("{{1}}"));
    }
}
