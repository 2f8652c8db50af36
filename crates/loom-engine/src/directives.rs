//! Structural directives and binding syntax

/// Repeat directive attribute
pub const FOR: &str = "*for";
/// Conditional directive attribute
pub const IF: &str = "*if";

/// Parsed `*for="let NAME of EXPR"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatSpec<'a> {
    pub binding: &'a str,
    pub iterable: &'a str,
}

impl<'a> RepeatSpec<'a> {
    pub fn parse(source: &'a str) -> Option<Self> {
        let rest = source.trim().strip_prefix("let")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();

        let name_end = rest.find(char::is_whitespace)?;
        let binding = &rest[..name_end];
        if !is_identifier(binding) {
            return None;
        }

        let rest = rest[name_end..].trim_start().strip_prefix("of")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let iterable = rest.trim();
        if iterable.is_empty() {
            return None;
        }

        Some(Self { binding, iterable })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Whether an attribute is a structural directive
pub fn is_structural(name: &str) -> bool {
    name == FOR || name == IF
}

/// Event type of an `(type)` binding
pub fn event_name(name: &str) -> Option<&str> {
    name.strip_prefix('(')?.strip_suffix(')').filter(|n| !n.is_empty())
}
