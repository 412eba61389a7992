//! Token definitions for Quill.

use quill_common::Span;

/// A token with its kind and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Bool(bool),
    /// Identifier-like run, optionally prefixed with `@` (e.g. `@max`, `d6`).
    Word(String),
    Whitespace(String),
    /// Any character with no meaning of its own.
    Symbol(char),

    // Operators
    Plus,  // +
    Minus, // -
    Star,  // *
    Slash, // /
    Eq,    // = or ==
    BangEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=
}

impl TokenKind {
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "true" => Some(TokenKind::Bool(true)),
            "false" => Some(TokenKind::Bool(false)),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, TokenKind::Whitespace(_))
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Eq
                | TokenKind::BangEq
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
        )
    }
}
