//! CLI command implementations.

pub mod eval;
pub mod parse;
pub mod repl;
pub mod scope;
