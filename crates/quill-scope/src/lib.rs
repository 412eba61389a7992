//! Scope classification for Quill.
//! Quill 的作用域分类。
//!
//! Every expression of a formula is either *logical* (evaluated as math,
//! comparisons and calls) or *textual* (kept as literal text). The engine
//! first tags each node from its kind alone, then rewrites those tags into
//! final scopes using the surrounding tree.
//! 每个表达式要么是逻辑的，要么是文本的。

mod engine;
mod scope;

pub use engine::{ScopeError, ScopeTable, dump, evaluate_tree_scope};
pub use scope::{IsolationScope, MasterScope, NodeScope, Scope};
