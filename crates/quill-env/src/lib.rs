//! Binding environments for Quill.
//! Quill 的绑定环境。
//!
//! An [`Environment`] is a chain of [`ObjectSource`]s. Each source maps an
//! [`Identifier`] to a [`SourcedValue`]: a constant, a function computed at
//! lookup time, or a proxy to another identifier. Host applications wire
//! their own data into evaluation through these sources.

mod environment;
mod error;
mod identifier;
mod source;

pub use environment::Environment;
pub use error::EnvError;
pub use identifier::{Identifier, Invocation};
pub use source::{EntryMatcher, Invoker, ObjectSource, SourceEntry, SourcedValue};
