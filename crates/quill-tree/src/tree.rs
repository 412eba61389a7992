//! The node arena and its queries.
//! 节点存储区及其查询。

use crate::node::{Label, Node, NodeId, letters};
use crate::{TreeError, reorganizer, resolver, stages, validate};
use quill_common::{SourceText, Span};
use quill_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label as DiagnosticLabel};
use quill_recipe::{Recipe, RecipeManager, catalog};
use std::fmt::Write;
use std::rc::Rc;

/// A syntax tree over one immutable source string.
/// 基于单个不可变源码字符串的语法树。
///
/// Nodes live in an arena and refer to each other by [`NodeId`]. Nodes
/// removed from the tree (failed enclosure attempts, consolidated
/// separators) stay in the arena but are unreachable from the root.
#[derive(Debug, Clone)]
pub struct Tree {
    source: SourceText,
    recipes: Rc<RecipeManager>,
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// A tree holding only an open root node.
    pub fn new(source: impl Into<String>, recipes: Rc<RecipeManager>) -> Self {
        let mut root = Node::new(catalog::ROOT, 0, None);
        root.label = Label::Root;
        Self {
            source: SourceText::new(source),
            recipes,
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Build a complete tree: resolve, split patterns, reorganize separator
    /// runs into lists and aggregate functions. The tree is validated after
    /// every stage.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.chars().count()))]
    pub fn parse(source: &str, recipes: Rc<RecipeManager>) -> Result<Tree, TreeError> {
        let mut tree = Tree::new(source, recipes);

        resolver::resolve(&mut tree);
        tree.validate("resolve")?;

        stages::horizontal(&mut tree);
        tree.validate("horizontal")?;

        let resolved: Vec<NodeId> = tree.preorder(tree.root);
        for node in resolved {
            reorganizer::reorganize(&mut tree, node)?;
        }
        tree.validate("reorganize")?;

        stages::vertical(&mut tree);
        tree.validate("vertical")?;

        tracing::debug!(nodes = tree.preorder(tree.root).len(), "tree built");
        Ok(tree)
    }

    /// Consolidate raw separators below `id` again. A no-op on a parsed tree.
    pub fn reorganize(&mut self, id: NodeId) -> Result<(), TreeError> {
        for node in self.preorder(id) {
            reorganizer::reorganize(self, node)?;
        }
        self.validate("reorganize")
    }

    /// Check structural invariants, logging a dump when they fail.
    pub fn validate(&self, stage: &'static str) -> Result<(), TreeError> {
        let issues = validate::check(self);
        if issues.is_empty() {
            return Ok(());
        }
        let dump = self.dump();
        tracing::error!(stage, ?issues, "tree failed validation\n{dump}");
        Err(TreeError::Invalid {
            stage,
            issues,
            dump,
        })
    }

    // ===== Arena =====

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    pub fn recipes(&self) -> &RecipeManager {
        &self.recipes
    }

    pub(crate) fn recipes_rc(&self) -> Rc<RecipeManager> {
        Rc::clone(&self.recipes)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Recipe a node was built from.
    pub fn recipe(&self, id: NodeId) -> Option<&Recipe> {
        self.recipes.get(self.node(id).syntax())
    }

    pub fn syntax(&self, id: NodeId) -> &str {
        self.node(id).syntax()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn push_child(&mut self, parent: NodeId, child: NodeId) {
        let position = self.node(parent).children.len();
        self.insert_child(parent, position, child);
    }

    pub(crate) fn insert_child(&mut self, parent: NodeId, position: usize, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(position, child);
        self.renumber(parent);
    }

    /// Detach a child. It keeps its parent back-reference and stays in the arena.
    pub(crate) fn detach_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).children.retain(|&c| c != child);
        self.renumber(parent);
    }

    pub(crate) fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.node_mut(child).parent = Some(parent);
        }
        self.node_mut(parent).children = children;
        self.renumber(parent);
    }

    /// Sibling ids always follow child order.
    fn renumber(&mut self, parent: NodeId) {
        let children = self.node(parent).children.clone();
        for (i, child) in children.into_iter().enumerate() {
            self.node_mut(child).label = Label::Child(i as u32);
        }
    }

    // ===== Text =====

    /// Reconstruct the text covered by a node from its children and the
    /// source gaps between them.
    /// 由子节点及其间隙重建节点覆盖的文本。
    pub fn text(&self, id: NodeId) -> String {
        let node = self.node(id);
        let end = node.end_exclusive().unwrap_or(self.source.len());
        if node.children.is_empty() {
            return self.source.slice(node.start, end);
        }

        let mut out = String::new();
        let mut cursor = node.start;
        for &child in &node.children {
            let child_node = self.node(child);
            if child_node.start > cursor {
                out.push_str(&self.source.slice(cursor, child_node.start));
            }
            out.push_str(&self.text(child));
            let child_end = child_node.end_exclusive().unwrap_or(end);
            cursor = cursor.max(child_end);
        }
        if cursor < end {
            out.push_str(&self.source.slice(cursor, end));
        }
        out
    }

    /// Text of a node with its relevant characters removed (e.g. the inner
    /// text of an enclosure).
    pub fn content(&self, id: NodeId) -> String {
        let node = self.node(id);
        let end = node.end_exclusive().unwrap_or(self.source.len());
        (node.start..end)
            .filter(|&i| !node.is_relevant(i))
            .filter_map(|i| self.source.char_at(i))
            .collect()
    }

    // ===== Identification =====

    /// Distance from the root; the root is level 0.
    pub fn level(&self, id: NodeId) -> usize {
        let mut level = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            level += 1;
            current = self.parent(parent);
        }
        level
    }

    /// Human-readable name such as `ρ1.a` or `C2.b`.
    pub fn context(&self, id: NodeId) -> String {
        let node = self.node(id);
        match node.label {
            Label::Root => "root".to_string(),
            Label::Child(sibling) => {
                let prefix = self
                    .recipe(id)
                    .map(|recipe| recipe.prefix.as_str())
                    .unwrap_or("?");
                format!("{}{}.{}", prefix, self.level(id), letters(sibling))
            }
        }
    }

    /// `root` for the root, `<parent path>/<id>` otherwise.
    pub fn path(&self, id: NodeId) -> String {
        let node = self.node(id);
        match (node.label, node.parent) {
            (Label::Child(sibling), Some(parent)) => format!("{}/{}", self.path(parent), sibling),
            _ => node.label.to_string(),
        }
    }

    /// Keyed child of an aggregate node (e.g. `callee`).
    pub fn key(&self, id: NodeId, key: &str) -> Option<NodeId> {
        let index = self.recipe(id)?.key_index(key)?;
        self.children(id).get(index).copied()
    }

    // ===== Traversal =====

    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn postorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &child in self.children(id) {
            out.extend(self.postorder(child));
        }
        out.push(id);
        out
    }

    /// Nodes grouped by level, starting at the root.
    pub fn levels(&self) -> Vec<Vec<NodeId>> {
        let mut levels = Vec::new();
        let mut current = vec![self.root];
        while !current.is_empty() {
            let next = current
                .iter()
                .flat_map(|&id| self.children(id).iter().copied())
                .collect();
            levels.push(current);
            current = next;
        }
        levels
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder(self.root)
            .into_iter()
            .filter(|&id| self.children(id).is_empty())
            .collect()
    }

    /// First node in pre-order built from `syntax`.
    pub fn find(&self, syntax: &str) -> Option<NodeId> {
        self.preorder(self.root)
            .into_iter()
            .find(|&id| self.syntax(id) == syntax)
    }

    pub fn find_all(&self, syntax: &str) -> Vec<NodeId> {
        self.preorder(self.root)
            .into_iter()
            .filter(|&id| self.syntax(id) == syntax)
            .collect()
    }

    /// Deepest node whose range covers `index`.
    pub fn at(&self, index: usize) -> Option<NodeId> {
        let covers = |id: NodeId| {
            let node = self.node(id);
            let end = node.end_exclusive().unwrap_or(self.source.len());
            node.start <= index && index < end
        };
        if !covers(self.root) {
            return None;
        }
        let mut current = self.root;
        while let Some(&child) = self.children(current).iter().find(|&&c| covers(c)) {
            current = child;
        }
        Some(current)
    }

    pub fn has_ancestor(&self, id: NodeId, predicate: impl Fn(&Node) -> bool) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if predicate(self.node(parent)) {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    // ===== Reporting =====

    /// Indented rendering, one node per line: `context [start → end] text`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for id in self.preorder(self.root) {
            let node = self.node(id);
            let end = node
                .end()
                .map(|end| end.to_string())
                .unwrap_or_else(|| "∞".to_string());
            let _ = writeln!(
                out,
                "{}{} [{} → {}] {}",
                "  ".repeat(self.level(id)),
                self.context(id),
                node.start,
                end,
                self.text(id)
            );
        }
        out
    }

    /// One warning per unbalanced marker reachable from the root.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for id in self.preorder(self.root) {
            for marker in &self.node(id).unbalanced {
                let span = Span::from_usize(marker.index, marker.index + 1);
                let diagnostic = if marker.is_unclosed() {
                    Diagnostic::warning(
                        DiagnosticKind::Tree,
                        span,
                        format!("unclosed {}", marker.syntax),
                    )
                    .with_code(ErrorCode::UnbalancedEnclosure)
                    .with_label(DiagnosticLabel::new(span, "opened here"))
                } else {
                    Diagnostic::warning(
                        DiagnosticKind::Tree,
                        span,
                        format!("stray {} closer", marker.syntax),
                    )
                    .with_code(ErrorCode::StrayCloser)
                    .with_label(DiagnosticLabel::new(span, "nothing to close"))
                };
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }
}
