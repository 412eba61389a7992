//! Immutable formula source.
//! 不可变的公式源码。

use crate::Span;

/// Source text indexed by character.
/// 按字符索引的源码文本。
///
/// Every tree built from a formula refers back to one `SourceText`; nodes only
/// store offsets into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    chars: Vec<char>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    /// The original text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Characters in `[start, end)`, clamped to the source.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        if start >= end {
            return String::new();
        }
        self.chars[start..end].iter().collect()
    }

    /// Text covered by a span. Dummy spans have no text.
    pub fn span_text(&self, span: Span) -> String {
        if span.is_dummy() {
            return String::new();
        }
        let range = span.range();
        self.slice(range.start, range.end)
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        SourceText::new(text)
    }
}
