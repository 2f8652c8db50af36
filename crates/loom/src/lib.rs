//! Loom
//!
//! Declarative view templates with incremental rendering.
//!
//! A template is parsed once, rendered against a context object into an
//! instance tree, and reconciled against a host visual tree so that only
//! the differences are applied.
//!
//! # Example
//! ```rust,ignore
//! use loom::{Config, View, MemoryHost};
//!
//! let mut view = View::new("<p>{{ greeting }}</p>", Config::default(), MemoryHost::new())?;
//! view.set_context_json(serde_json::json!({"greeting": "hi"}))?;
//! view.flush()?;
//! ```

mod config;
mod view;

pub use config::{Config, SchedulerConfig};
pub use view::View;

pub use loom_engine::{Diagnostic, DiagnosticKind, EngineError, TemplateEngine};
pub use loom_expr::{NativeFunction, Value};
pub use loom_html::{ParseError, ParseWarning, Template, TemplateCache};
pub use loom_render::{
    Completion, CompletionError, FlushReport, FrameTrigger, HostNodeId, HostTree, MemoryHost, RenderError,
};

// Re-export sub-crates for advanced usage
pub use loom_dom as dom;
pub use loom_engine as engine;
pub use loom_expr as expr;
pub use loom_html as html;
pub use loom_render as render;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Facade error
#[derive(Debug, thiserror::Error)]
pub enum LoomError {
    #[error("Template error: {0}")]
    Parse(#[from] ParseError),

    #[error("Render error: {0}")]
    Engine(#[from] EngineError),

    #[error("Commit error: {0}")]
    Commit(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Engine produced no instance tree")]
    NotRendered,
}

pub type LoomResult<T> = Result<T, LoomError>;
