//! Typed expressions for Quill.
//! Quill 的类型化表达式。
//!
//! The recipe tree is lowered into these expressions before scope
//! classification and evaluation.
//! 语法树在作用域分类和求值之前被降低为这些表达式。

mod dice;
mod expr;

pub use dice::{DiceKeep, DiceNotation, parse_dice_notation};
pub use expr::{BinOp, Expr, ExprId, ExprKind, UnaryOp};
