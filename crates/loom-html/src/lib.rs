//! Loom Template Parser
//!
//! Hand-written parser for the template grammar.
//! Templates are parsed once and the resulting tree is never mutated.

mod cache;
mod parser;
mod scan;

pub use cache::TemplateCache;
pub use parser::{ParserOptions, TemplateParser};

use loom_dom::{DomError, NodeId, VTree};
use std::fmt;

/// Parse template text with default options
pub fn parse(text: &str) -> Result<Template, ParseError> {
    TemplateParser::new().parse(text)
}

/// Parsed template: an immutable static tree rooted at a fragment
#[derive(Debug, Clone)]
pub struct Template {
    tree: VTree,
    root: NodeId,
    warnings: Vec<ParseWarning>,
}

impl Template {
    pub(crate) fn new(tree: VTree, root: NodeId, warnings: Vec<ParseWarning>) -> Self {
        Self { tree, root, warnings }
    }

    pub fn tree(&self) -> &VTree {
        &self.tree
    }

    /// Root fragment
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Recoverable problems found while parsing
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }
}

/// Recovered parse problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// An open element was closed by a close tag for one of its ancestors
    ImplicitlyClosed {
        tag: String,
        closed_by: String,
        line: u32,
        column: u32,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::ImplicitlyClosed { tag, closed_by, line, column } => write!(
                f,
                "<{}> implicitly closed by </{}> at line {}, column {}",
                tag, closed_by, line, column
            ),
        }
    }
}

/// Fatal parse error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Unmatched close tag </{tag}> at line {line}, column {column}")]
    UnmatchedCloseTag { tag: String, line: u32, column: u32 },

    #[error("Unclosed tag <{tag}> opened at line {line}, column {column}")]
    UnclosedTag { tag: String, line: u32, column: u32 },

    #[error("Unterminated tag <{tag}> at line {line}, column {column}")]
    UnterminatedTag { tag: String, line: u32, column: u32 },

    #[error("Unterminated comment at line {line}, column {column}")]
    UnterminatedComment { line: u32, column: u32 },

    #[error("Unterminated value for attribute `{name}` at line {line}, column {column}")]
    UnterminatedAttribute { name: String, line: u32, column: u32 },

    #[error("Malformed attribute at line {line}, column {column}")]
    MalformedAttribute { line: u32, column: u32 },

    #[error("Malformed close tag at line {line}, column {column}")]
    MalformedCloseTag { line: u32, column: u32 },

    #[error("Tree construction failed: {0}")]
    Dom(#[from] DomError),
}

impl ParseError {
    /// 1-based source position, when the error has one
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            ParseError::UnmatchedCloseTag { line, column, .. }
            | ParseError::UnclosedTag { line, column, .. }
            | ParseError::UnterminatedTag { line, column, .. }
            | ParseError::UnterminatedComment { line, column }
            | ParseError::UnterminatedAttribute { line, column, .. }
            | ParseError::MalformedAttribute { line, column }
            | ParseError::MalformedCloseTag { line, column } => Some((*line, *column)),
            ParseError::Dom(_) => None,
        }
    }
}
