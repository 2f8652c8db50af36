//! Engine errors

use loom_dom::DomError;
use loom_expr::EvalError;

/// Error that aborts a render
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A context function raised while an expression was evaluated
    #[error("Evaluation of `{source_text}` at {path} failed: {error}")]
    Evaluation {
        path: String,
        source_text: String,
        error: EvalError,
    },

    #[error("Instance tree construction failed: {0}")]
    Dom(#[from] DomError),
}

pub type EngineResult<T> = Result<T, EngineError>;
