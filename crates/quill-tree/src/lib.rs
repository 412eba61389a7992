//! Syntax trees for Quill formulas.
//! Quill 公式的语法树。
//!
//! A [`Tree`] is built character by character from a [`RecipeManager`]
//! catalog, then reshaped by the horizontal, reorganization and vertical
//! stages. Malformed input never fails: unmatched enclosures are recorded
//! as unbalanced markers and the tree is still complete.
//! 格式错误的输入不会导致失败，而是记录为不平衡标记。
//!
//! [`RecipeManager`]: quill_recipe::RecipeManager

mod error;
mod node;
mod reorganizer;
mod resolver;
mod serialize;
mod stages;
mod tree;
mod validate;

pub use error::TreeError;
pub use node::{Label, Node, NodeId, NodeMeta, Relevant, UnbalancedMarker};
pub use serialize::{SerializedId, SerializedMarker, SerializedNode};
pub use tree::Tree;
