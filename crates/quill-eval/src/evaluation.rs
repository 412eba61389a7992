//! Evaluation results.

use crate::RuntimeValue;
use quill_syntax::Expr;

/// Outcome of evaluating one expression.
///
/// `value` is `None` when something the expression needs is not known yet;
/// `node` is then the expression rebuilt from whatever did resolve, ready to
/// be evaluated again.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEvaluation {
    pub value: Option<RuntimeValue>,
    pub node: Expr,
}

impl RuntimeEvaluation {
    pub fn resolved(value: RuntimeValue, node: Expr) -> Self {
        Self {
            value: Some(value),
            node,
        }
    }

    pub fn unresolved(node: Expr) -> Self {
        Self { value: None, node }
    }

    /// A value was produced, symbolic or not.
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// A concrete value was produced.
    pub fn is_ready(&self) -> bool {
        self.value.as_ref().is_some_and(|value| !value.is_symbolic())
    }
}
