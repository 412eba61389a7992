//! Syntax recipes for Quill.
//! Quill 的语法配方。
//!
//! A recipe describes one syntactic construct (an enclosure such as `(`..`)`,
//! a separator such as `,`, a primitive, an aggregator or a pattern). The
//! tree resolver consults a [`RecipeManager`] for every character it reads.
//! 配方描述一种语法结构，解析器读取每个字符时都会查询 [`RecipeManager`]。

pub mod catalog;
mod manager;
mod recipe;

pub use manager::{RecipeError, RecipeManager, Stage, SyntaxFeature};
pub use recipe::{
    PatternMatch, Recipe, RecipeKind, RecipeType, Recognizer, Restriction, Restrictions,
    SyntaxPattern,
};
