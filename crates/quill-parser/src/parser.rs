//! Precedence climbing over the items of one tree node.

use quill_common::Span;
use quill_lexer::{Token, TokenKind};
use quill_syntax::{BinOp, Expr, ExprId, ExprKind, UnaryOp, parse_dice_notation};

/// A parse item: a token of a text run, or an already lowered node.
#[derive(Debug, Clone)]
pub enum Item {
    Token(Token),
    Expr(Expr),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Token(token) => token.span,
            Item::Expr(expr) => expr.span,
        }
    }

    fn kind(&self) -> Option<&TokenKind> {
        match self {
            Item::Token(token) => Some(&token.kind),
            Item::Expr(_) => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind().is_some_and(TokenKind::is_whitespace)
    }

    /// Whether this item is the given keyword, ignoring case.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self.kind(), Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case(word))
    }
}

const COMPARISON: u8 = 1;
const MULTIPLICATIVE: u8 = 3;

fn binop(kind: &TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::Eq => BinOp::Eq,
        TokenKind::BangEq => BinOp::Ne,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Le => BinOp::Le,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::Ge => BinOp::Ge,
        _ => return None,
    })
}

fn level(op: BinOp) -> u8 {
    match op {
        BinOp::Mul | BinOp::Div => 3,
        BinOp::Add | BinOp::Sub => 2,
        _ => COMPARISON,
    }
}

/// Source text of an operator token with no operand.
fn operator_text(kind: &TokenKind, span: Span) -> String {
    match (kind, binop(kind)) {
        (TokenKind::Eq, _) if span.len() == 2 => "==".to_string(),
        (_, Some(op)) => op.as_str().to_string(),
        _ => String::new(),
    }
}

/// Parses a run of items into one expression.
pub(crate) struct Parser<'a> {
    items: Vec<Item>,
    pos: usize,
    next_id: &'a mut u32,
    /// Span reported when there is nothing to parse.
    empty_span: Span,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(items: Vec<Item>, next_id: &'a mut u32, empty_span: Span) -> Self {
        Self {
            items,
            pos: 0,
            next_id,
            empty_span,
        }
    }

    fn id(&mut self) -> ExprId {
        let id = ExprId(*self.next_id);
        *self.next_id += 1;
        id
    }

    fn expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = self.id();
        Expr::new(id, kind, span)
    }

    /// Juxtaposed expressions. Inner whitespace is kept, outer whitespace dropped.
    pub(crate) fn parse_sequence(mut self) -> Expr {
        let mut exprs: Vec<Expr> = Vec::new();

        loop {
            let gap_start = self.pos;
            let next = self.skip_whitespace(self.pos);
            if next >= self.items.len() {
                break;
            }
            if next > gap_start && !exprs.is_empty() {
                let whitespace = self.whitespace(gap_start, next);
                exprs.push(whitespace);
            }
            self.pos = next;

            let expr = self.parse_binary(COMPARISON);
            match exprs.last_mut() {
                Some(Expr {
                    kind: ExprKind::Text(previous),
                    span,
                    ..
                }) if matches!(&expr.kind, ExprKind::Text(_)) && span.end == expr.span.start => {
                    if let ExprKind::Text(text) = &expr.kind {
                        previous.push_str(text);
                    }
                    *span = span.merge(expr.span);
                }
                _ => exprs.push(expr),
            }
        }

        match exprs.len() {
            0 => {
                let span = self.empty_span;
                self.expr(ExprKind::Nil, span)
            }
            1 => exprs.remove(0),
            _ => {
                let span = exprs[0].span.merge(exprs[exprs.len() - 1].span);
                self.expr(ExprKind::Sequence(exprs), span)
            }
        }
    }

    fn whitespace(&mut self, from: usize, to: usize) -> Expr {
        let mut text = String::new();
        let mut span = self.items[from].span();
        for item in &self.items[from..to] {
            if let Some(TokenKind::Whitespace(ws)) = item.kind() {
                text.push_str(ws);
            }
            span = span.merge(item.span());
        }
        self.expr(ExprKind::Whitespace(text), span)
    }

    /// Left-associative binary operators from `min` up to multiplicative.
    fn parse_binary(&mut self, min: u8) -> Expr {
        if min > MULTIPLICATIVE {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(min + 1);

        loop {
            let op_index = self.skip_whitespace(self.pos);
            let Some(op) = self
                .items
                .get(op_index)
                .and_then(Item::kind)
                .and_then(binop)
                .filter(|&op| level(op) == min)
            else {
                break;
            };
            let operand_index = self.skip_whitespace(op_index + 1);
            if !self.starts_operand(operand_index) {
                break;
            }

            self.pos = operand_index;
            let right = self.parse_binary(min + 1);
            let span = left.span.merge(right.span);
            left = self.expr(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }

        left
    }

    fn parse_unary(&mut self) -> Expr {
        let start = self.items[self.pos].span();
        if matches!(self.items[self.pos].kind(), Some(TokenKind::Minus)) {
            let operand_index = self.skip_whitespace(self.pos + 1);
            if self.starts_operand(operand_index) {
                self.pos = operand_index;
                let operand = self.parse_unary();
                let span = start.merge(operand.span);
                return self.expr(
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        operand: Box::new(operand),
                    },
                    span,
                );
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Expr {
        let item = self.items[self.pos].clone();
        self.pos += 1;

        let token = match item {
            Item::Expr(expr) => return expr,
            Item::Token(token) => token,
        };
        let span = token.span;

        match token.kind {
            TokenKind::Number(value) => self.number(value, span),
            TokenKind::Bool(value) => self.expr(ExprKind::Bool(value), span),
            TokenKind::Word(word) => match parse_dice_notation(&word) {
                Some(dice) => self.expr(
                    ExprKind::DiceRoll {
                        size: 1,
                        faces: dice.faces,
                        keep: dice.keep,
                    },
                    span,
                ),
                None => self.expr(ExprKind::Variable(word), span),
            },
            TokenKind::Whitespace(ws) => self.expr(ExprKind::Whitespace(ws), span),
            TokenKind::Symbol(c) => self.expr(ExprKind::Text(c.to_string()), span),
            ref operator => {
                // An operator with nothing to apply to is plain text.
                let text = operator_text(operator, span);
                self.expr(ExprKind::Text(text), span)
            }
        }
    }

    /// A number, or a dice roll / implicit product when a word touches it.
    fn number(&mut self, value: f64, span: Span) -> Expr {
        let touching = match self.items.get(self.pos) {
            Some(Item::Token(Token {
                kind: TokenKind::Word(word),
                span: word_span,
            })) if word_span.start == span.end => Some((word.clone(), *word_span)),
            _ => None,
        };
        let Some((word, word_span)) = touching else {
            return self.expr(ExprKind::Number(value), span);
        };
        self.pos += 1;
        let full = span.merge(word_span);

        let whole = value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64;
        if let Some(dice) = parse_dice_notation(&word).filter(|_| whole) {
            return self.expr(
                ExprKind::DiceRoll {
                    size: value as u32,
                    faces: dice.faces,
                    keep: dice.keep,
                },
                full,
            );
        }

        let number = self.expr(ExprKind::Number(value), span);
        let variable = self.expr(ExprKind::Variable(word), word_span);
        self.expr(
            ExprKind::Binary {
                op: BinOp::Mul,
                left: Box::new(number),
                right: Box::new(variable),
            },
            full,
        )
    }

    fn skip_whitespace(&self, mut index: usize) -> usize {
        while self.items.get(index).is_some_and(Item::is_whitespace) {
            index += 1;
        }
        index
    }

    /// Whether an operand can start at `index`.
    fn starts_operand(&self, index: usize) -> bool {
        match self.items.get(index) {
            None => false,
            Some(Item::Expr(_)) => true,
            Some(Item::Token(token)) => match token.kind {
                TokenKind::Number(_) | TokenKind::Bool(_) | TokenKind::Word(_) => true,
                TokenKind::Minus => self.starts_operand(self.skip_whitespace(index + 1)),
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_lexer::Lexer;

    fn parse(text: &str) -> Expr {
        let items = Lexer::new(text, 0)
            .tokenize()
            .into_iter()
            .map(Item::Token)
            .collect();
        let mut next_id = 0;
        Parser::new(items, &mut next_id, Span::from_usize(0, 0)).parse_sequence()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse("1 + 2 * 3").to_string(), "1 + 2 * 3");
        let expr = parse("1 + 2 * 3");
        let ExprKind::Binary { op, right, .. } = expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(op, BinOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_comparison_is_loosest() {
        let expr = parse("a + 1 >= 2");
        assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Ge, .. }));
    }

    #[test]
    fn test_dice() {
        let expr = parse("3d6kh2");
        assert!(matches!(
            expr.kind,
            ExprKind::DiceRoll { size: 3, faces: 6, keep } if keep.highest == Some(2)
        ));
        assert!(matches!(
            parse("d20").kind,
            ExprKind::DiceRoll { size: 1, faces: 20, .. }
        ));
    }

    #[test]
    fn test_implicit_multiplication() {
        let expr = parse("2x");
        assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
        assert_eq!(expr.to_string(), "2 * x");
    }

    #[test]
    fn test_dangling_operator_is_text() {
        let expr = parse("3 +");
        let ExprKind::Sequence(items) = &expr.kind else {
            panic!("expected sequence, got {expr:?}");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[2].kind, ExprKind::Text(t) if t == "+"));
    }

    #[test]
    fn test_sequence_drops_outer_whitespace() {
        let expr = parse("  a b  ");
        let ExprKind::Sequence(items) = &expr.kind else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 3);
        assert!(items[1].is_whitespace());
        assert_eq!(expr.to_string(), "a b");
    }

    #[test]
    fn test_unary_minus() {
        let expr = parse("-2 * 3");
        assert!(matches!(expr.kind, ExprKind::Binary { op: BinOp::Mul, .. }));
        assert_eq!(expr.to_string(), "-2 * 3");
    }

    #[test]
    fn test_adjacent_symbols_merge() {
        let expr = parse("$$");
        assert!(matches!(&expr.kind, ExprKind::Text(t) if t == "$$"));
    }

    #[test]
    fn test_empty_is_nil() {
        assert_eq!(parse("   ").kind, ExprKind::Nil);
    }

    #[test]
    fn test_ids_are_unique() {
        let expr = parse("1 + 2 * x");
        let mut ids: Vec<ExprId> = expr.postorder().iter().map(|e| e.id).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
