//! The `quill eval` command.

use crate::config::Config;
use crate::output;
use quill_eval::{EvalError, Interpreter, RuntimeEvaluation};

pub fn run(expr: &str, config: &Config) -> Result<(), String> {
    let environment = config.environment().map_err(|e| e.to_string())?;
    let mut interpreter = Interpreter::new(config.interpreter_options());

    match quill_eval::evaluate_source(expr, config.recipes(), config.master, &mut interpreter, &environment) {
        Ok(evaluated) => {
            output::diagnostics(expr, &evaluated.parsed.diagnostics);
            print_result(&evaluated.result);
            Ok(())
        }
        Err(e) => Err(describe(expr, &e)),
    }
}

/// Ready values in green, anything still symbolic in yellow.
pub fn print_result(result: &RuntimeEvaluation) {
    match &result.value {
        Some(value) if result.is_ready() => output::success(&value.to_string()),
        Some(value) => output::pending(&value.to_string()),
        None => output::pending(&result.node.to_string()),
    }
}

/// Error message, pointing into the formula when the error has a span.
pub fn describe(expr: &str, error: &EvalError) -> String {
    match error.span() {
        Some(span) => {
            let range = span.range();
            let text: String = expr.chars().skip(range.start).take(range.len()).collect();
            format!("{error} (at `{text}`)")
        }
        None => error.to_string(),
    }
}
