//! The Quill lexer.
//! Quill 词法分析器。

use crate::token::{Token, TokenKind};
use quill_common::Span;

/// The Quill lexer.
/// Quill 词法分析器。
///
/// Positions are character offsets into the whole formula: `offset` is the
/// position of the first character of `text`.
/// 位置是整个公式中的字符偏移量。
pub struct Lexer<'src> {
    /// Character iterator
    /// 字符迭代器
    chars: std::iter::Peekable<std::str::Chars<'src>>,
    /// Current character position in the formula
    /// 当前在公式中的字符位置
    pos: usize,
}

impl<'src> Lexer<'src> {
    /// Create a lexer for a text run starting at `offset`.
    /// 为从 `offset` 开始的文本片段创建词法分析器。
    pub fn new(text: &'src str, offset: usize) -> Self {
        Self {
            chars: text.chars().peekable(),
            pos: offset,
        }
    }

    /// Tokenize the whole run.
    /// 对整个文本片段进行词法分析。
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn next_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let ch = self.advance()?;

        let kind = match ch {
            c if c.is_whitespace() => self.whitespace(c),
            c if c.is_ascii_digit() => self.number(c),
            '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.number('.'),
            c if c.is_alphabetic() || c == '_' => self.word(c),
            '@' if self.peek_char().is_some_and(|c| c.is_alphabetic() || c == '_') => {
                self.word('@')
            }

            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => {
                self.eat('=');
                TokenKind::Eq
            }
            '!' if self.eat('=') => TokenKind::BangEq,
            '<' if self.eat('=') => TokenKind::Le,
            '<' => TokenKind::Lt,
            '>' if self.eat('=') => TokenKind::Ge,
            '>' => TokenKind::Gt,

            other => TokenKind::Symbol(other),
        };

        Some(Token::new(kind, Span::from_usize(start, self.pos)))
    }

    /// Advance to the next character.
    /// 前进到下一个字符。
    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.pos += 1;
        Some(ch)
    }

    /// Peek at the next character without consuming it.
    /// 查看下一个字符但不消耗它。
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consume the next character if it is `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            return true;
        }
        false
    }

    fn whitespace(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            value.push(ch);
            self.advance();
        }
        TokenKind::Whitespace(value)
    }

    /// Parse a decimal number. There are no exponents: `2e6` is a number
    /// followed by a word.
    /// 解析十进制数字。
    fn number(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);
        let mut seen_dot = first == '.';

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.' && !seen_dot && self.second_is_digit() {
                seen_dot = true;
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match value.parse::<f64>() {
            Ok(number) => TokenKind::Number(number),
            // Only digits and one dot reach here.
            Err(_) => TokenKind::Word(value),
        }
    }

    fn second_is_digit(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().is_some_and(|c| c.is_ascii_digit())
    }

    /// Parse a word or keyword.
    /// 解析单词或关键字。
    fn word(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);

        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Check for keywords - 检查是否为关键字
        TokenKind::keyword_from_str(&value).unwrap_or(TokenKind::Word(value))
    }
}
