//! Lexical analysis for Quill.
//! Quill 词法分析模块。
//!
//! The recipe tree already isolates enclosures and separators, so the lexer
//! only sees the plain text runs in between and never fails.
//! 词法分析器只处理纯文本片段，且从不失败。

mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
