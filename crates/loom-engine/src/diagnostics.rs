//! Render diagnostics
//!
//! Broken directives and expressions do not abort a render. Each one is
//! logged and kept here so callers can inspect what was skipped.

use std::fmt;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Expression failed to parse
    Syntax,
    /// Expression failed to evaluate (unknown name, bad property access,
    /// call of a non-function)
    Evaluation,
    /// `*for` source is not iterable
    NotIterable,
    /// `*for` value is not of the form `let NAME of EXPR`
    InvalidRepeat,
    /// Event binding did not produce a function
    NotAFunction,
}

/// One recorded problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Structural path of the affected node
    pub path: String,
    /// Offending source text
    pub source: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: &str, source: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.to_string(),
            source: source.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (`{}` at {})", self.message, self.source, self.path)
    }
}
