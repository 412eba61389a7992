//! Identifiers.
//! 标识符。

use std::fmt;

/// What a lookup asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Named(String),
}

impl Identifier {
    pub fn named(name: impl Into<String>) -> Self {
        Identifier::Named(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Identifier::Named(name) => name,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Context handed to function values: the requested identifier and the
/// arguments of a call (empty for plain lookups).
#[derive(Debug)]
pub struct Invocation<'a, T> {
    pub identifier: &'a Identifier,
    pub args: &'a [T],
}
