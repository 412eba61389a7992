//! Structural invariants of a tree.

use crate::node::{Label, NodeId};
use crate::tree::Tree;

/// Every violated invariant, described with the offending node's context.
/// An empty list means the tree is consistent.
pub(crate) fn check(tree: &Tree) -> Vec<String> {
    let mut issues = Vec::new();
    let root = tree.root();

    if tree.node(root).label != Label::Root {
        issues.push("root node is not labelled root".to_string());
    }
    if tree.parent(root).is_some() {
        issues.push("root node has a parent".to_string());
    }

    for id in tree.preorder(root) {
        check_node(tree, id, &mut issues);
    }
    issues
}

fn check_node(tree: &Tree, id: NodeId, issues: &mut Vec<String>) {
    let node = tree.node(id);
    let context = tree.context(id);

    if tree.recipe(id).is_none() {
        issues.push(format!("{context}: unknown syntax `{}`", node.syntax()));
    }

    let Some(end) = node.end_exclusive() else {
        issues.push(format!("{context}: unbalanced node inside the tree"));
        return;
    };

    if id != tree.root() {
        match node.parent {
            None => issues.push(format!("{context}: node has no parent")),
            Some(parent) => {
                let count = tree.children(parent).iter().filter(|&&c| c == id).count();
                if count != 1 {
                    issues.push(format!(
                        "{context}: parent lists the node {count} times"
                    ));
                }
            }
        }
    }

    let mut previous_end = node.start;
    for (position, &child) in node.children.iter().enumerate() {
        let child_node = tree.node(child);
        let child_context = tree.context(child);

        if child_node.label != Label::Child(position as u32) {
            issues.push(format!("{child_context}: id does not match position {position}"));
        }
        if child_node.parent != Some(id) {
            issues.push(format!("{child_context}: parent back-reference is stale"));
        }

        let Some(child_end) = child_node.end_exclusive() else {
            continue;
        };
        if child_node.start < node.start || child_end > end {
            issues.push(format!(
                "{child_context}: range {}..{} escapes parent {}..{}",
                child_node.start, child_end, node.start, end
            ));
        }
        if child_node.start < previous_end {
            issues.push(format!("{child_context}: overlaps its previous sibling"));
        }
        previous_end = child_end;
    }
}
