//! Tree nodes.
//! 树节点。

use quill_common::Span;
use serde::{Deserialize, Serialize};

/// Arena index of a node inside its [`Tree`](crate::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a node among its siblings.
/// 节点在兄弟节点中的标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Root,
    Child(u32),
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Root => f.write_str("root"),
            Label::Child(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    /// Name of the recipe the node was built from.
    pub syntax: String,
}

/// A syntactically significant character (or inclusive range) of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Relevant {
    Index(usize),
    Range(usize, usize),
}

impl Relevant {
    pub fn first(&self) -> usize {
        match *self {
            Relevant::Index(index) => index,
            Relevant::Range(start, _) => start,
        }
    }

    /// Exclusive end.
    pub fn end(&self) -> usize {
        match *self {
            Relevant::Index(index) => index + 1,
            Relevant::Range(_, end) => end + 1,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.first() <= index && index < self.end()
    }
}

/// An enclosure character that did not behave as one.
/// 未能正常配对的包围字符。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbalancedMarker {
    pub index: usize,
    /// Recipe the character would have opened or closed.
    pub syntax: String,
    /// The discarded node when an opener never found its closer.
    pub attempt: Option<NodeId>,
}

impl UnbalancedMarker {
    /// An opener whose closer was never found.
    pub fn is_unclosed(&self) -> bool {
        self.attempt.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub label: Label,
    pub meta: NodeMeta,
    pub start: usize,
    /// `None` while open, and forever for unbalanced attempts.
    pub length: Option<usize>,
    pub relevant: Vec<Relevant>,
    pub children: Vec<NodeId>,
    pub unbalanced: Vec<UnbalancedMarker>,
    pub parent: Option<NodeId>,
    pub data: serde_json::Value,
}

impl Node {
    pub fn new(syntax: impl Into<String>, start: usize, length: Option<usize>) -> Self {
        Self {
            label: Label::Child(0),
            meta: NodeMeta {
                syntax: syntax.into(),
            },
            start,
            length,
            relevant: Vec::new(),
            children: Vec::new(),
            unbalanced: Vec::new(),
            parent: None,
            data: serde_json::Value::Null,
        }
    }

    pub fn syntax(&self) -> &str {
        &self.meta.syntax
    }

    pub fn is_root(&self) -> bool {
        self.label == Label::Root
    }

    pub fn is_balanced(&self) -> bool {
        self.length.is_some()
    }

    /// Inclusive end. Zero-length nodes end where they start.
    pub fn end(&self) -> Option<usize> {
        self.length.map(|length| self.start + length.saturating_sub(1))
    }

    pub fn end_exclusive(&self) -> Option<usize> {
        self.length.map(|length| self.start + length)
    }

    pub fn span(&self) -> Option<Span> {
        self.end_exclusive()
            .map(|end| Span::from_usize(self.start, end))
    }

    pub fn is_relevant(&self, index: usize) -> bool {
        self.relevant.iter().any(|relevant| relevant.contains(index))
    }

    pub fn id(&self) -> Option<u32> {
        match self.label {
            Label::Root => None,
            Label::Child(id) => Some(id),
        }
    }
}

/// Bijective base-26 letters: 0 is `a`, 25 is `z`, 26 is `aa`.
pub(crate) fn letters(id: u32) -> String {
    let mut n = id as u64 + 1;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
    }
    out.iter().rev().collect()
}
