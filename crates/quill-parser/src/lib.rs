//! Parser for Quill.
//!
//! Builds the recipe tree for a formula and lowers it into a typed
//! [`Expr`]. Text runs are tokenized and parsed with precedence climbing;
//! enclosures, separator lists and aggregates become primaries.
//!
//! Malformed formulas still lower completely: dangling operators become
//! text and missing conditional keywords become `Nil` branches with a
//! warning.

mod lower;
mod parser;

pub use lower::lower;
pub use parser::Item;

use quill_diagnostic::Diagnostic;
use quill_recipe::RecipeManager;
use quill_syntax::Expr;
use quill_tree::{Tree, TreeError};
use std::rc::Rc;

/// A formula, its recipe tree and its lowered expression.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub tree: Tree,
    pub expr: Expr,
    /// Tree warnings (unbalanced enclosures) followed by lowering warnings.
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a formula into a tree and an expression.
pub fn parse(source: &str, recipes: Rc<RecipeManager>) -> Result<Parsed, TreeError> {
    let tree = Tree::parse(source, recipes)?;
    let (expr, lowering) = lower(&tree);
    let mut diagnostics = tree.diagnostics();
    diagnostics.extend(lowering);
    Ok(Parsed {
        tree,
        expr,
        diagnostics,
    })
}
