//! Evaluator providers.
//! 求值器扩展点。

use crate::{EvalError, RuntimeEvaluation, RuntimeValue, Session, defaults};
use quill_syntax::{BinOp, Expr};

/// Result of a custom operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomOperation {
    Value(RuntimeValue),
    /// Leave the operation symbolic.
    Defer,
}

/// What post-processing does with a final evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum PostProcess {
    Keep,
    Replace(RuntimeValue),
    /// Drop the value; the evaluation becomes unresolved.
    Unresolve,
}

/// Hooks that customize evaluation.
///
/// Every method defaults to the plain behavior in [`defaults`]; a provider
/// overrides the cases it knows and falls through to those functions for
/// everything else.
pub trait EvaluatorProvider {
    fn name(&self) -> &'static str;

    fn evaluate(&self, session: &mut Session<'_>, expr: &Expr) -> Result<RuntimeEvaluation, EvalError> {
        defaults::evaluate(session, expr)
    }

    /// Binary operations on values that are not both numbers.
    fn evaluate_custom_operation(
        &self,
        op: BinOp,
        left: &RuntimeValue,
        right: &RuntimeValue,
        node: &Expr,
    ) -> Result<CustomOperation, EvalError> {
        defaults::evaluate_custom_operation(op, left, right, node)
    }

    /// Expression standing for a value, reusing `node`'s identity.
    fn convert_to_node(&self, value: &RuntimeValue, node: &Expr) -> Expr {
        defaults::convert_to_node(value, node)
    }

    fn post_process(&self, evaluation: &RuntimeEvaluation) -> PostProcess {
        defaults::post_process(evaluation)
    }
}

/// Plain evaluation, no extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl EvaluatorProvider for DefaultProvider {
    fn name(&self) -> &'static str {
        "default"
    }
}
