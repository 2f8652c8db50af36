//! Loom Template Engine
//!
//! Turns a parsed template plus a context object into an instance tree.
//!
//! Features:
//! - `*for="let X of EXPR"` repetition and `*if="EXPR"` conditionals
//! - `[name]="EXPR"` bound attributes and `(type)="EXPR"` event bindings
//! - `{{ EXPR }}` text interpolation (`\{{` escapes)
//! - Structural paths for node re-identification across renders

mod diagnostics;
mod directives;
mod engine;
mod error;
pub mod interpolate;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use directives::RepeatSpec;
pub use engine::{InstanceTree, TemplateEngine};
pub use error::{EngineError, EngineResult};
pub use loom_dom::path::{self, DEFAULT_ROOT_KEY};
