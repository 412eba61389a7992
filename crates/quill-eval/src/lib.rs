//! Interpreter/evaluator for Quill.
//!
//! This crate walks a scoped expression tree against an [`Environment`] of
//! [`RuntimeValue`]s. Evaluation never fails for missing bindings: such
//! nodes stay unresolved and the rebuilt expression can be evaluated again
//! once the environment changes. Behavior is customized through an
//! [`EvaluatorProvider`]; [`DiceProvider`] adds dice rolls.
//!
//! [`Environment`]: quill_env::Environment

pub mod defaults;
mod dice;
mod error;
mod evaluation;
mod interpreter;
mod provider;
mod value;

pub use dice::{DiceProvider, MAX_DICE};
pub use error::EvalError;
pub use evaluation::RuntimeEvaluation;
pub use interpreter::{Interpreter, InterpreterOptions, Session};
pub use provider::{CustomOperation, DefaultProvider, EvaluatorProvider, PostProcess};
pub use value::{DiceRollValue, ObjectValue, RuntimeValue};

use quill_env::Environment;
use quill_parser::Parsed;
use quill_recipe::RecipeManager;
use quill_scope::{MasterScope, ScopeTable};
use std::rc::Rc;

/// Everything produced while evaluating one formula.
#[derive(Debug)]
pub struct SourceEvaluation {
    pub parsed: Parsed,
    pub scopes: ScopeTable,
    pub result: RuntimeEvaluation,
}

/// Parse, classify and evaluate a formula.
pub fn evaluate_source(
    source: &str,
    recipes: Rc<RecipeManager>,
    master: MasterScope,
    interpreter: &mut Interpreter,
    environment: &Environment<RuntimeValue>,
) -> Result<SourceEvaluation, EvalError> {
    let parsed = quill_parser::parse(source, recipes)?;
    let scopes = quill_scope::evaluate_tree_scope(&parsed.expr, master)?;
    let result = interpreter.evaluate(&parsed.expr, &scopes, environment)?;
    Ok(SourceEvaluation {
        parsed,
        scopes,
        result,
    })
}
