//! Source text span and position tracking.
//! 源码范围和位置跟踪。
//!
//! Positions count characters, not bytes: formulas routinely carry glyphs
//! such as `⟨` and `⟩` and every recipe reacts to single characters.
//! 位置按字符计数，而非字节。

use std::fmt;

/// A character position in source text.
/// 源码中的字符位置。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CharPos(pub u32);

impl CharPos {
    pub const ZERO: CharPos = CharPos(0);

    pub fn offset(self, offset: u32) -> CharPos {
        CharPos(self.0 + offset)
    }
}

impl fmt::Debug for CharPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CharPos({})", self.0)
    }
}

impl From<usize> for CharPos {
    fn from(pos: usize) -> Self {
        CharPos(pos as u32)
    }
}

impl From<CharPos> for usize {
    fn from(pos: CharPos) -> Self {
        pos.0 as usize
    }
}

/// A span representing a range in source text.
/// 表示源码中一个范围的 Span。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start position. / 起始位置。
    pub start: CharPos,
    /// End position (exclusive). / 结束位置（不包含）。
    pub end: CharPos,
}

impl Span {
    /// Span of nodes synthesized at runtime, with no counterpart in the source.
    pub const DUMMY: Span = Span {
        start: CharPos(u32::MAX),
        end: CharPos(u32::MAX),
    };

    pub fn new(start: CharPos, end: CharPos) -> Self {
        Span { start, end }
    }

    pub fn from_usize(start: usize, end: usize) -> Self {
        Span {
            start: CharPos::from(start),
            end: CharPos::from(end),
        }
    }

    /// Create a span that covers both `self` and `other`.
    /// 创建一个覆盖 `self` 和 `other` 的范围。
    ///
    /// Dummy spans are absorbed by the other side.
    pub fn merge(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        Span {
            start: std::cmp::min(self.start, other.start),
            end: std::cmp::max(self.end, other.end),
        }
    }

    /// Returns the length of this span in characters.
    /// 返回此范围的字符长度。
    pub fn len(&self) -> usize {
        if self.is_dummy() {
            return 0;
        }
        (self.end.0 - self.start.0) as usize
    }

    /// Returns true if this span has zero length.
    /// 如果此范围长度为零则返回 true。
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_dummy(&self) -> bool {
        *self == Span::DUMMY
    }

    /// Returns true if `other` lies entirely within this span.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns the character range for this span.
    /// 返回此范围对应的字符区间。
    pub fn range(&self) -> std::ops::Range<usize> {
        usize::from(self.start)..usize::from(self.end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            return write!(f, "<synthetic>");
        }
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}
