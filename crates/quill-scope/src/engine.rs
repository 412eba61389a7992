//! The scope passes.
//! 作用域计算过程。

use crate::scope::{IsolationScope, MasterScope, NodeScope, Scope};
use quill_common::Span;
use quill_syntax::{Expr, ExprId, ExprKind};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("cannot derive the scope of `{text}`: neither its ancestors nor its children are resolved")]
    NoContext { id: ExprId, span: Span, text: String },

    #[error("scope of `{text}` is still derived after the full pass")]
    Unresolved { id: ExprId, span: Span, text: String },
}

impl ScopeError {
    pub fn span(&self) -> Span {
        match self {
            ScopeError::NoContext { span, .. } | ScopeError::Unresolved { span, .. } => *span,
        }
    }
}

/// Scopes of a classified expression tree, keyed by expression id.
#[derive(Debug, Clone, Default)]
pub struct ScopeTable {
    entries: HashMap<ExprId, NodeScope>,
}

impl ScopeTable {
    pub fn get(&self, id: ExprId) -> Option<&NodeScope> {
        self.entries.get(&id)
    }

    /// Final scope of a node. Nodes built at runtime are logical.
    pub fn scope(&self, id: ExprId) -> Scope {
        self.entries
            .get(&id)
            .map_or(Scope::Logical, |entry| entry.contextualized)
    }

    pub fn is_textual(&self, id: ExprId) -> bool {
        self.scope(id) == Scope::Textual
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExprId, &NodeScope)> {
        self.entries.iter()
    }
}

enum Directive {
    /// Resolve still-derived descendants from their context.
    ResolveDerived,
    /// Force every descendant to the node's scope.
    EnforceScope,
}

/// Expression tree flattened in pre-order, with parent links.
struct Flat<'e> {
    exprs: Vec<&'e Expr>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    isolation: Vec<IsolationScope>,
    scopes: Vec<Scope>,
}

impl<'e> Flat<'e> {
    fn new(root: &'e Expr) -> Self {
        let mut flat = Flat {
            exprs: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            isolation: Vec::new(),
            scopes: Vec::new(),
        };
        flat.push(root, None);
        flat
    }

    fn push(&mut self, expr: &'e Expr, parent: Option<usize>) -> usize {
        let index = self.exprs.len();
        self.exprs.push(expr);
        self.parents.push(parent);
        self.children.push(Vec::new());
        self.isolation.push(IsolationScope::of(expr));
        self.scopes.push(Scope::Derived);

        for child in expr.children() {
            let child_index = self.push(child, Some(index));
            self.children[index].push(child_index);
        }
        index
    }

    fn postorder(&self) -> Vec<usize> {
        fn visit(flat: &Flat<'_>, index: usize, out: &mut Vec<usize>) {
            for &child in &flat.children[index] {
                visit(flat, child, out);
            }
            out.push(index);
        }
        let mut out = Vec::with_capacity(self.exprs.len());
        if !self.exprs.is_empty() {
            visit(self, 0, &mut out);
        }
        out
    }

    /// Descendants of `index` in pre-order, excluding itself.
    fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.children[index].iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children[current].iter().rev().copied());
        }
        out
    }

    /// The single resolved scope among the children, if they agree.
    fn children_scope(&self, index: usize) -> Option<Scope> {
        let mut found: Option<Scope> = None;
        for &child in &self.children[index] {
            match (self.scopes[child], found) {
                (Scope::Derived, _) => {}
                (scope, None) => found = Some(scope),
                (scope, Some(previous)) if scope != previous => return None,
                _ => {}
            }
        }
        found
    }

    /// Scope of the closest resolved ancestor.
    fn ancestor_scope(&self, index: usize) -> Option<Scope> {
        let mut current = self.parents[index];
        while let Some(parent) = current {
            if self.scopes[parent] != Scope::Derived {
                return Some(self.scopes[parent]);
            }
            current = self.parents[parent];
        }
        None
    }

    fn error_context(&self, index: usize) -> (ExprId, Span, String) {
        let expr = self.exprs[index];
        (expr.id, expr.span, expr.to_string())
    }

    /// Contextualized scope of a derived node, consulting the tree.
    fn from_tree_context(&self, index: usize) -> Result<Scope, ScopeError> {
        let children = self.children_scope(index);
        let ancestors = self.ancestor_scope(index);
        let parent_then_children = ancestors.or(children);
        let children_then_parent = children.or(ancestors);

        let scope = match self.isolation[index] {
            IsolationScope::PossibleString if self.is_inner_whitespace(index) => Some(Scope::Textual),
            IsolationScope::PossibleString | IsolationScope::Irrelevant => children_then_parent,
            IsolationScope::PossibleOperator | IsolationScope::PossibleReference => {
                parent_then_children
            }
            IsolationScope::Aggregator => {
                let parent_is_operator = self.parents[index]
                    .is_some_and(|p| self.isolation[p] == IsolationScope::PossibleOperator);
                if parent_is_operator {
                    parent_then_children
                } else {
                    children_then_parent
                }
            }
            other => Some(other.contextualize(MasterScope::default())),
        };

        scope.ok_or_else(|| {
            let (id, span, text) = self.error_context(index);
            ScopeError::NoContext { id, span, text }
        })
    }

    /// Whitespace between two items of a sequence or list.
    fn is_inner_whitespace(&self, index: usize) -> bool {
        let Some(parent) = self.parents[index] else {
            return false;
        };
        if !matches!(
            self.exprs[parent].kind,
            ExprKind::Sequence(_) | ExprKind::List { .. }
        ) {
            return false;
        }
        let siblings = &self.children[parent];
        siblings.first() != Some(&index) && siblings.last() != Some(&index)
    }

    /// Resolve a derived node from its children, with parent overrides.
    fn resolve_derived(&mut self, index: usize) {
        if self.scopes[index] != Scope::Derived {
            return;
        }
        let mut derived = self.children_scope(index);

        let parent = self.parents[index].filter(|_| self.isolation[index] == IsolationScope::Aggregator);
        if let Some(parent) = parent {
            match self.isolation[parent] {
                IsolationScope::LogicalExpression => derived = Some(Scope::Logical),
                IsolationScope::PossibleOperator if self.scopes[parent] == Scope::Derived => {
                    derived = derived.filter(|&scope| scope != Scope::Textual);
                }
                _ => {}
            }
        }

        if let Some(scope) = derived {
            self.scopes[index] = scope;
        }
    }

    fn spread_down(&mut self, index: usize, directive: Directive) -> Result<(), ScopeError> {
        let scope = self.scopes[index];
        for descendant in self.descendants(index) {
            match directive {
                Directive::ResolveDerived => {
                    if self.scopes[descendant] == Scope::Derived {
                        self.scopes[descendant] = self.from_tree_context(descendant)?;
                    }
                }
                Directive::EnforceScope => self.scopes[descendant] = scope,
            }
        }
        Ok(())
    }
}

/// Classify every node of an expression tree.
/// 对表达式树的每个节点进行分类。
#[tracing::instrument(level = "debug", skip_all, fields(master = ?master))]
pub fn evaluate_tree_scope(expr: &Expr, master: MasterScope) -> Result<ScopeTable, ScopeError> {
    let mut flat = Flat::new(expr);
    let order = flat.postorder();

    for &index in &order {
        flat.scopes[index] = flat.isolation[index].contextualize(master);
    }

    for &index in &order {
        if flat.children[index].is_empty() {
            continue;
        }
        flat.resolve_derived(index);
        if flat.scopes[index] == Scope::Derived {
            continue;
        }
        let directive = match flat.isolation[index] {
            IsolationScope::ConfirmedString => Directive::EnforceScope,
            _ => Directive::ResolveDerived,
        };
        flat.spread_down(index, directive)?;
    }

    let mut table = ScopeTable::default();
    for index in 0..flat.exprs.len() {
        if flat.scopes[index] == Scope::Derived {
            let (id, span, text) = flat.error_context(index);
            return Err(ScopeError::Unresolved { id, span, text });
        }
        let id = flat.exprs[index].id;
        if !id.is_synthetic() {
            table.entries.insert(
                id,
                NodeScope {
                    isolation: flat.isolation[index],
                    contextualized: flat.scopes[index],
                },
            );
        }
    }

    tracing::debug!(nodes = table.len(), "scopes resolved");
    Ok(table)
}

fn kind_name(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Number(_) => "number",
        ExprKind::Bool(_) => "bool",
        ExprKind::Text(_) => "text",
        ExprKind::Quoted(_) => "quoted",
        ExprKind::Variable(_) => "variable",
        ExprKind::Reference(_) => "reference",
        ExprKind::Whitespace(_) => "whitespace",
        ExprKind::Nil => "nil",
        ExprKind::Binary { .. } => "binary",
        ExprKind::Unary { .. } => "unary",
        ExprKind::Call { .. } => "call",
        ExprKind::If { .. } => "if",
        ExprKind::Group { .. } => "group",
        ExprKind::List { .. } => "list",
        ExprKind::Sequence(_) => "sequence",
        ExprKind::DiceRoll { .. } => "dice",
        ExprKind::Root(_) => "root",
    }
}

/// One line per node: `kind isolation → scope  text`, indented by depth.
pub fn dump(expr: &Expr, table: &ScopeTable) -> String {
    fn visit(expr: &Expr, table: &ScopeTable, depth: usize, out: &mut String) {
        let (isolation, scope) = match table.get(expr.id) {
            Some(entry) => (entry.isolation.as_str(), entry.contextualized.as_str()),
            None => ("?", table.scope(expr.id).as_str()),
        };
        out.push_str(&format!(
            "{}{} {} → {}  {:?}\n",
            "  ".repeat(depth),
            kind_name(&expr.kind),
            isolation,
            scope,
            expr.to_string()
        ));
        for child in expr.children() {
            visit(child, table, depth + 1, out);
        }
    }
    let mut out = String::new();
    visit(expr, table, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_recipe::RecipeManager;
    use std::rc::Rc;

    fn classify(source: &str, master: MasterScope) -> (Expr, ScopeTable) {
        let parsed = quill_parser::parse(source, Rc::new(RecipeManager::with_defaults())).unwrap();
        let table = evaluate_tree_scope(&parsed.expr, master).unwrap();
        (parsed.expr, table)
    }

    fn find<'e>(expr: &'e Expr, predicate: impl Fn(&Expr) -> bool) -> &'e Expr {
        expr.postorder()
            .into_iter()
            .find(|e| predicate(e))
            .expect("expression not found")
    }

    #[test]
    fn test_every_node_is_resolved() {
        for source in ["2+2", "a b c", "\"x + y\" + 1", "f(1, (2), {3})", "if(x then 1 else 2)", ""] {
            for master in [MasterScope::MathEnabled, MasterScope::TextProcessing] {
                let (expr, table) = classify(source, master);
                for node in expr.postorder() {
                    assert_ne!(table.scope(node.id), Scope::Derived, "{source}");
                }
            }
        }
    }

    #[test]
    fn test_arithmetic_is_logical() {
        let (expr, table) = classify("2 + 2", MasterScope::MathEnabled);
        let sum = find(&expr, |e| matches!(e.kind, ExprKind::Binary { .. }));
        assert_eq!(table.scope(sum.id), Scope::Logical);
    }

    #[test]
    fn test_quotes_enforce_textual() {
        let (expr, table) = classify("\"a + 1\"", MasterScope::MathEnabled);
        let sum = find(&expr, |e| matches!(e.kind, ExprKind::Binary { .. }));
        assert_eq!(table.scope(sum.id), Scope::Textual);
        let one = find(&expr, |e| matches!(e.kind, ExprKind::Number(_)));
        assert_eq!(table.scope(one.id), Scope::Textual);
    }

    #[test]
    fn test_inner_whitespace_is_textual() {
        let (expr, table) = classify("a b", MasterScope::MathEnabled);
        let space = find(&expr, Expr::is_whitespace);
        assert_eq!(table.scope(space.id), Scope::Textual);
        let a = find(&expr, |e| matches!(&e.kind, ExprKind::Variable(v) if v == "a"));
        assert_eq!(table.scope(a.id), Scope::Logical);
    }

    #[test]
    fn test_text_mode_words() {
        let (expr, table) = classify("hello world", MasterScope::TextProcessing);
        let word = find(&expr, |e| matches!(e.kind, ExprKind::Variable(_)));
        assert_eq!(table.scope(word.id), Scope::Textual);
    }

    #[test]
    fn test_group_under_call_is_logical() {
        let (expr, table) = classify("f((\"a\"))", MasterScope::TextProcessing);
        let group = find(&expr, |e| matches!(e.kind, ExprKind::Group { .. }));
        assert_eq!(table.scope(group.id), Scope::Logical);
    }

    #[test]
    fn test_synthetic_nodes_default_to_logical() {
        let table = ScopeTable::default();
        assert_eq!(table.scope(ExprId::SYNTHETIC), Scope::Logical);
    }

    #[test]
    fn test_dump_lists_every_node() {
        let (expr, table) = classify("1 + x", MasterScope::MathEnabled);
        let dump = dump(&expr, &table);
        assert_eq!(dump.lines().count(), expr.postorder().len());
        assert!(dump.starts_with("root n/a → logical"));
    }
}
