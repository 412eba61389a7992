//! Tree errors.

use quill_recipe::RecipeError;
use thiserror::Error;

/// Internal consistency faults. Malformed input is never reported here.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("invalid tree after {stage}: {}\n{dump}", issues.join("; "))]
    Invalid {
        stage: &'static str,
        issues: Vec<String>,
        dump: String,
    },

    #[error("unknown syntax `{0}`")]
    UnknownSyntax(String),

    #[error("node `{path}` declares parent `{found}`, expected `{expected}`")]
    ParentMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("node `{path}` has an id that does not match its position")]
    IdMismatch { path: String },

    #[error(transparent)]
    Recipe(#[from] RecipeError),
}
