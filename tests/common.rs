//! Integration tests for quill-common crate.

use quill_common::{CharPos, SourceText, Span};

#[test]
fn test_span_merge() {
    let a = Span::from_usize(10, 20);
    let b = Span::from_usize(15, 30);
    let merged = a.merge(b);
    assert_eq!(merged.start.0, 10);
    assert_eq!(merged.end.0, 30);
}

#[test]
fn test_span_merge_ignores_dummy() {
    let span = Span::from_usize(3, 7);
    assert_eq!(span.merge(Span::DUMMY), span);
    assert_eq!(Span::DUMMY.merge(span), span);
}

#[test]
fn test_span_len_and_range() {
    let span = Span::from_usize(5, 15);
    assert_eq!(span.len(), 10);
    assert_eq!(span.range(), 5..15);
    assert!(Span::from_usize(5, 5).is_empty());
}

#[test]
fn test_span_contains() {
    let outer = Span::from_usize(0, 10);
    assert!(outer.contains(Span::from_usize(2, 4)));
    assert!(!outer.contains(Span::from_usize(8, 12)));
}

#[test]
fn test_char_pos_offset() {
    assert_eq!(CharPos(4).offset(3), CharPos(7));
}

// ============================================================================
// Source Text Tests
// ============================================================================

#[test]
fn test_source_text_counts_chars() {
    let source = SourceText::new("ρ(α)");
    assert_eq!(source.len(), 4);
    assert_eq!(source.char_at(2), Some('α'));
    assert_eq!(source.char_at(9), None);
}

#[test]
fn test_source_text_slices() {
    let source = SourceText::new("héllo wörld");
    assert_eq!(source.slice(6, 11), "wörld");
    assert_eq!(source.span_text(Span::from_usize(0, 5)), "héllo");
}
