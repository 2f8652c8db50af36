//! Loom Expression Language
//!
//! Small JavaScript-like expression language used by templates.
//!
//! Features:
//! - Literals, arrays and object literals
//! - Member access, optional chaining, indexing and calls
//! - Arithmetic, comparison, equality and logical operators
//! - Names resolved through loop bindings, then the context object

pub mod ast;
mod error;
mod interp;
pub mod lexer;
mod parser;
pub mod token;
mod value;

pub use ast::{Expr, ExprKind};
pub use error::{EvalError, EvalResult, ExprError};
pub use interp::{evaluate, Scope};
pub use parser::Parser;
pub use value::{format_number, NativeFunction, Value};

use std::rc::Rc;

/// Parse an expression
pub fn compile(source: &str) -> Result<Expr, ExprError> {
    Parser::new(source).parse()
}

/// Parse and evaluate an expression against a context object
pub fn eval(source: &str, context: Value) -> Result<Value, EvalFailure> {
    let expr = compile(source)?;
    Ok(evaluate(&expr, &Scope::new(context))?)
}

/// Either failure mode of [`eval`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalFailure {
    #[error("syntax error: {0}")]
    Syntax(#[from] ExprError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Compiled expression together with its source text
#[derive(Debug, Clone)]
pub struct Expression {
    source: Rc<str>,
    ast: Rc<Expr>,
}

impl Expression {
    pub fn compile(source: &str) -> Result<Self, ExprError> {
        let ast = compile(source)?;
        tracing::trace!("Compiled expression `{}`", source);
        Ok(Self {
            source: source.into(),
            ast: Rc::new(ast),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn evaluate(&self, scope: &Scope) -> EvalResult<Value> {
        evaluate(&self.ast, scope)
    }
}
