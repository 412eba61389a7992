//! Common utilities and data structures for Quill.
//!
//! This crate provides foundational types used across the Quill engine:
//! - `Span`: Source text location tracking (character based)
//! - `SourceText`: Immutable formula source with character indexing

mod source;
mod span;

pub use source::SourceText;
pub use span::{CharPos, Span};
