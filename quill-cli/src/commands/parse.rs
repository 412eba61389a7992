//! The `quill parse` command.

use crate::config::Config;
use crate::output;
use quill_tree::Tree;

pub fn run(expr: &str, json: bool, config: &Config) -> Result<(), String> {
    let tree = Tree::parse(expr, config.recipes()).map_err(|e| e.to_string())?;
    output::diagnostics(expr, &tree.diagnostics());

    if json {
        let text = serde_json::to_string_pretty(&tree.serialize()).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        print!("{}", tree.dump());
    }
    Ok(())
}
