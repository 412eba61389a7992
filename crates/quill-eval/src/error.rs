//! Evaluation errors.

use quill_common::Span;
use quill_env::EnvError;
use quill_scope::ScopeError;
use quill_tree::TreeError;
use thiserror::Error;

/// Evaluation errors. Missing bindings are not errors: they leave the
/// evaluation unresolved.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("operator not implemented: {left} {op} {right}")]
    OperatorNotImplemented {
        op: &'static str,
        left: &'static str,
        right: &'static str,
        span: Span,
    },

    #[error("type mismatch: {message}")]
    TypeMismatch { message: String, span: Span },

    #[error("cannot roll {size} dice at once (limit {limit})")]
    TooManyDice { size: u32, limit: u32, span: Span },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Env(#[from] EnvError),
}

impl EvalError {
    /// Source span of the failing node, when it has one.
    pub fn span(&self) -> Option<Span> {
        let span = match self {
            EvalError::OperatorNotImplemented { span, .. }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::TooManyDice { span, .. } => *span,
            EvalError::Scope(error) => error.span(),
            EvalError::Tree(_) | EvalError::Env(_) => return None,
        };
        (!span.is_dummy()).then_some(span)
    }
}
