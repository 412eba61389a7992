//! The `quill scope` command.

use crate::config::Config;
use crate::output;

pub fn run(expr: &str, config: &Config) -> Result<(), String> {
    let parsed = quill_parser::parse(expr, config.recipes()).map_err(|e| e.to_string())?;
    output::diagnostics(expr, &parsed.diagnostics);

    let scopes = quill_scope::evaluate_tree_scope(&parsed.expr, config.master).map_err(|e| e.to_string())?;
    print!("{}", quill_scope::dump(&parsed.expr, &scopes));
    Ok(())
}
