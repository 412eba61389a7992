//! Lowering of recipe trees into expressions.
//! 将配方树降低为表达式。

use crate::parser::{Item, Parser};
use quill_common::{CharPos, Span};
use quill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};
use quill_lexer::{Lexer, Token, TokenKind};
use quill_recipe::{RecipeKind, RecipeType, catalog};
use quill_syntax::{Expr, ExprId, ExprKind};
use quill_tree::{NodeId, Tree};

/// Lower a whole tree. Warnings about malformed constructs are returned
/// alongside the expression.
pub fn lower(tree: &Tree) -> (Expr, Vec<Diagnostic>) {
    let mut lowerer = Lowerer {
        tree,
        next_id: 0,
        diagnostics: Vec::new(),
    };
    let expr = lowerer.lower_node(tree.root());
    tracing::debug!(nodes = lowerer.next_id, "lowered tree");
    (expr, lowerer.diagnostics)
}

struct Lowerer<'t> {
    tree: &'t Tree,
    next_id: u32,
    diagnostics: Vec<Diagnostic>,
}

impl<'t> Lowerer<'t> {
    fn expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        Expr::new(id, kind, span)
    }

    fn span(&self, id: NodeId) -> Span {
        self.tree.node(id).span().unwrap_or(Span::DUMMY)
    }

    /// Span between the opener and closer of an enclosure.
    fn inner_span(&self, id: NodeId) -> Span {
        let span = self.span(id);
        if span.len() < 2 {
            return span;
        }
        Span::new(span.start.offset(1), CharPos(span.end.0 - 1))
    }

    fn lower_node(&mut self, id: NodeId) -> Expr {
        let tree = self.tree;
        let span = self.span(id);
        let syntax = tree.syntax(id);
        let Some(recipe) = tree.recipe(id) else {
            return self.expr(ExprKind::Text(tree.text(id)), span);
        };

        match &recipe.kind {
            _ if syntax == catalog::ROOT => {
                let inner = self.content(tree.children(id), span);
                self.expr(ExprKind::Root(Box::new(inner)), span)
            }
            _ if syntax == catalog::NIL => self.expr(ExprKind::Nil, span),
            RecipeKind::Enclosure { opener, closer } => {
                let (opener, closer) = (*opener, *closer);
                self.lower_enclosure(id, recipe.base(), opener, closer)
            }
            RecipeKind::Separator { character } => {
                let character = *character;
                if tree.children(id).is_empty() {
                    return self.expr(ExprKind::Text(character.to_string()), span);
                }
                let items = tree
                    .children(id)
                    .iter()
                    .map(|&list| self.lower_node(list))
                    .collect();
                self.expr(
                    ExprKind::List {
                        separator: character,
                        items,
                    },
                    span,
                )
            }
            RecipeKind::Aggregator { .. } if recipe.base() == catalog::FUNCTION => {
                self.lower_call(id)
            }
            RecipeKind::Pattern { .. } => self.expr(ExprKind::Variable(tree.text(id)), span),
            // Strings, lists and unknown aggregates lower to their content.
            _ if syntax == catalog::STRING => self.content(&[id], span),
            _ => self.content(tree.children(id), span),
        }
    }

    fn lower_enclosure(&mut self, id: NodeId, base: &str, opener: char, closer: char) -> Expr {
        let span = self.span(id);
        let inner_span = self.inner_span(id);
        match base {
            "quotes" => {
                let inner = self.content(self.tree.children(id), inner_span);
                self.expr(ExprKind::Quoted(Box::new(inner)), span)
            }
            "percentage" => {
                let name = self.tree.content(id).trim().to_string();
                self.expr(ExprKind::Reference(name), span)
            }
            _ => {
                let inner = self.content(self.tree.children(id), inner_span);
                self.expr(
                    ExprKind::Group {
                        open: opener,
                        close: closer,
                        inner: Box::new(inner),
                    },
                    span,
                )
            }
        }
    }

    /// Items of a run of sibling nodes: strings are tokenized, patterns
    /// become words, everything else is lowered.
    fn items(&mut self, children: &[NodeId]) -> Vec<Item> {
        let tree = self.tree;
        let mut items = Vec::new();
        for &child in children {
            let node = tree.node(child);
            let is_pattern = tree.recipe(child).is_some_and(|r| r.is(RecipeType::Pattern));
            if tree.syntax(child) == catalog::STRING {
                let text = tree.text(child);
                items.extend(
                    Lexer::new(&text, node.start)
                        .tokenize()
                        .into_iter()
                        .map(Item::Token),
                );
            } else if is_pattern {
                let token = Token::new(TokenKind::Word(tree.text(child)), self.span(child));
                items.push(Item::Token(token));
            } else {
                items.push(Item::Expr(self.lower_node(child)));
            }
        }
        items
    }

    fn content(&mut self, children: &[NodeId], span: Span) -> Expr {
        let items = self.items(children);
        self.parse_items(items, span)
    }

    fn parse_items(&mut self, items: Vec<Item>, empty_span: Span) -> Expr {
        Parser::new(items, &mut self.next_id, empty_span).parse_sequence()
    }

    /// The comma lists of a parenthesis, when a comma master is its only child.
    fn comma_lists(&self, paren: NodeId) -> Option<Vec<NodeId>> {
        let tree = self.tree;
        match tree.children(paren) {
            [master]
                if tree.recipe(*master).is_some_and(|r| r.base() == "comma")
                    && !tree.children(*master).is_empty() =>
            {
                Some(tree.children(*master).to_vec())
            }
            _ => None,
        }
    }

    fn arguments(&mut self, paren: NodeId) -> Vec<Expr> {
        if let Some(lists) = self.comma_lists(paren) {
            return lists.into_iter().map(|list| self.lower_node(list)).collect();
        }
        let inner_span = self.inner_span(paren);
        let inner = self.content(self.tree.children(paren), inner_span);
        match inner.kind {
            ExprKind::Nil => Vec::new(),
            _ => vec![inner],
        }
    }

    fn lower_call(&mut self, id: NodeId) -> Expr {
        let tree = self.tree;
        let span = self.span(id);
        let (Some(callee), Some(paren)) = (tree.key(id, "callee"), tree.key(id, "arguments")) else {
            return self.content(tree.children(id), span);
        };

        let callee = tree.text(callee);
        let bare = callee.strip_prefix('@').unwrap_or(&callee);
        if bare.eq_ignore_ascii_case("if") {
            return self.lower_if(paren, span);
        }

        let args = self.arguments(paren);
        self.expr(ExprKind::Call { callee, args }, span)
    }

    /// `if(c, a, b)` or `if(c then a else b)`.
    fn lower_if(&mut self, paren: NodeId, span: Span) -> Expr {
        let end = Span::new(self.inner_span(paren).end, self.inner_span(paren).end);

        let (condition, then_branch, else_branch) = match self.comma_lists(paren) {
            Some(lists) if lists.len() >= 2 => {
                let mut args: Vec<Expr> =
                    lists.into_iter().map(|list| self.lower_node(list)).collect();
                if args.len() > 3 {
                    let extra = args[3].span.merge(args[args.len() - 1].span);
                    self.diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticKind::Parser,
                            extra,
                            "conditional takes three arguments; the rest are ignored",
                        )
                        .with_code(ErrorCode::UnexpectedToken),
                    );
                    args.truncate(3);
                }
                let else_branch = match args.len() {
                    3 => args.pop(),
                    _ => None,
                };
                let else_branch = else_branch.unwrap_or_else(|| self.missing("else", end, span));
                let then_branch = args.pop().unwrap_or_else(|| self.missing("then", end, span));
                let condition = args.pop().unwrap_or_else(|| self.missing("condition", end, span));
                (condition, then_branch, else_branch)
            }
            _ => self.split_keywords(paren, span, end),
        };

        self.expr(
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        )
    }

    fn split_keywords(&mut self, paren: NodeId, span: Span, end: Span) -> (Expr, Expr, Expr) {
        let mut items = self.items(self.tree.children(paren));

        let then_at = items.iter().position(|item| item.is_word("then"));
        let else_at = items
            .iter()
            .enumerate()
            .skip(then_at.map_or(0, |at| at + 1))
            .find(|(_, item)| item.is_word("else"))
            .map(|(at, _)| at);

        let else_items = match else_at {
            Some(at) => {
                let keyword = items[at].span();
                let rest = items.split_off(at + 1);
                items.pop();
                Some((rest, keyword))
            }
            None => None,
        };
        let then_items = match then_at {
            Some(at) => {
                let keyword = items[at].span();
                let rest = items.split_off(at + 1);
                items.pop();
                Some((rest, keyword))
            }
            None => None,
        };

        let condition_span = Span::new(self.inner_span(paren).start, self.inner_span(paren).start);
        let condition = self.parse_items(items, condition_span);
        let then_branch = match then_items {
            Some((rest, keyword)) => self.parse_items(rest, keyword),
            None => self.missing("then", end, span),
        };
        let else_branch = match else_items {
            Some((rest, keyword)) => self.parse_items(rest, keyword),
            None => self.missing("else", end, span),
        };
        (condition, then_branch, else_branch)
    }

    /// A `Nil` branch for a missing part of a conditional, with a warning.
    fn missing(&mut self, part: &str, at: Span, conditional: Span) -> Expr {
        self.diagnostics.push(
            Diagnostic::warning(
                DiagnosticKind::Parser,
                at,
                format!("conditional is missing `{part}`"),
            )
            .with_code(ErrorCode::MissingKeyword)
            .with_label(Label::new(conditional, "in this conditional")),
        );
        self.expr(ExprKind::Nil, at)
    }
}
