//! Expression errors

use super::token::Span;

/// Syntax error in an expression
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at offset {}", span.start)]
pub struct ExprError {
    pub message: String,
    pub span: Span,
}

impl ExprError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Runtime error while evaluating an expression
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Name not bound in scope or context
    #[error("{0} is not defined")]
    Reference(String),

    /// Operation applied to an unsuitable value
    #[error("type error: {0}")]
    Type(String),

    /// Call target is not a function
    #[error("{0} is not a function")]
    NotCallable(String),

    /// Exception raised by a context-provided function
    #[error("uncaught exception: {0}")]
    Thrown(String),
}

impl EvalError {
    /// Whether this error came from the context rather than from the
    /// expression itself
    pub fn is_thrown(&self) -> bool {
        matches!(self, EvalError::Thrown(_))
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
