//! Grouping of separator runs into lists.
//! 将分隔符之间的节点分组为列表。

use crate::node::{Node, NodeId, Relevant};
use crate::tree::Tree;
use crate::TreeError;
use quill_recipe::{RecipeType, catalog};

/// Reorganize the direct children of `target`, then every synthesized list.
///
/// Only the highest-priority separator recipe present among the children is
/// consolidated here (ties go to the earlier declared recipe). Separators of
/// other recipes end up inside the lists and are handled by the recursion.
/// Running this on an already reorganized node changes nothing.
pub(crate) fn reorganize(tree: &mut Tree, target: NodeId) -> Result<(), TreeError> {
    let Some(chosen) = highest_priority(tree, target) else {
        return Ok(());
    };

    let children = tree.children(target).to_vec();
    let occurrences: Vec<usize> = children
        .iter()
        .enumerate()
        .filter(|&(_, &child)| is_eligible(tree, child) && tree.syntax(child) == chosen)
        .map(|(i, _)| i)
        .collect();

    tracing::debug!(
        target = %tree.context(target),
        separator = %chosen,
        occurrences = occurrences.len(),
        "reorganizing"
    );

    let separators: Vec<NodeId> = occurrences.iter().map(|&i| children[i]).collect();
    let master = separators[0];

    // Runs strictly between consecutive separators, plus the ones before the
    // first and after the last.
    let mut lists = Vec::with_capacity(occurrences.len() + 1);
    let mut run_start = 0;
    for (run, &boundary) in occurrences
        .iter()
        .chain(std::iter::once(&children.len()))
        .enumerate()
    {
        let members = children[run_start..boundary].to_vec();
        let empty_at = if run == 0 {
            tree.node(master).start
        } else {
            tree.node(separators[run - 1]).start + 1
        };
        lists.push(build_list(tree, members, empty_at));
        run_start = boundary + 1;
    }

    // Every separator but the master leaves the tree; only its position survives.
    let relevant = separators
        .iter()
        .map(|&separator| Relevant::Index(tree.node(separator).start))
        .collect();
    tree.set_children(master, lists.clone());
    rasterize(tree, master, relevant);
    tree.set_children(target, vec![master]);

    for list in lists {
        reorganize(tree, list)?;
    }

    tree.validate("reorganize")
}

/// Separators with a priority that were not consolidated yet.
fn is_eligible(tree: &Tree, child: NodeId) -> bool {
    tree.recipe(child).is_some_and(|recipe| {
        recipe.is(RecipeType::Separator) && recipe.priority.is_some()
    }) && tree.children(child).is_empty()
}

fn highest_priority(tree: &Tree, target: NodeId) -> Option<String> {
    tree.children(target)
        .iter()
        .filter(|&&child| is_eligible(tree, child))
        .filter_map(|&child| {
            let recipe = tree.recipe(child)?;
            let order = tree.recipes().declaration_index(&recipe.name)?;
            Some((recipe.priority?, order, recipe.name.clone()))
        })
        // Highest priority, then lowest declaration index.
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, _, name)| name)
}

fn build_list(tree: &mut Tree, members: Vec<NodeId>, empty_at: usize) -> NodeId {
    let members = if members.is_empty() {
        vec![tree.alloc(Node::new(catalog::NIL, empty_at, Some(0)))]
    } else {
        members
    };

    let start = tree.node(members[0]).start;
    let end = members
        .iter()
        .filter_map(|&member| tree.node(member).end_exclusive())
        .max()
        .unwrap_or(start);

    let list = tree.alloc(Node::new(catalog::LIST, start, Some(end - start)));
    tree.set_children(list, members);
    list
}

/// Recompute the master's range from its lists and separator positions.
fn rasterize(tree: &mut Tree, master: NodeId, relevant: Vec<Relevant>) {
    let children = tree.children(master).to_vec();
    let starts = children
        .iter()
        .map(|&child| tree.node(child).start)
        .chain(relevant.iter().map(Relevant::first));
    let start = starts.min().unwrap_or(tree.node(master).start);

    let ends = children
        .iter()
        .filter_map(|&child| tree.node(child).end_exclusive())
        .chain(relevant.iter().map(Relevant::end));
    let end = ends.max().unwrap_or(start).max(start);

    let node = tree.node_mut(master);
    node.start = start;
    node.length = Some(end - start);
    node.relevant = relevant;
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_recipe::RecipeManager;
    use std::rc::Rc;

    fn parse(source: &str) -> Tree {
        Tree::parse(source, Rc::new(RecipeManager::with_defaults())).unwrap()
    }

    fn texts(tree: &Tree, id: NodeId) -> Vec<String> {
        tree.children(id).iter().map(|&c| tree.text(c)).collect()
    }

    #[test]
    fn test_commas_become_lists() {
        let tree = parse("a,b,c");
        let root = tree.children(tree.root()).to_vec();
        assert_eq!(root.len(), 1);
        let master = root[0];
        assert_eq!(tree.syntax(master), "comma");
        assert_eq!(texts(&tree, master), vec!["a", "b", "c"]);
        assert_eq!(
            tree.node(master).relevant,
            vec![Relevant::Index(1), Relevant::Index(3)]
        );
        assert_eq!(tree.node(master).start, 0);
        assert_eq!(tree.node(master).length, Some(5));
    }

    #[test]
    fn test_empty_slot_gets_nil() {
        let tree = parse("a,,b");
        let master = tree.children(tree.root())[0];
        let middle = tree.children(master)[1];
        let nil = tree.children(middle)[0];
        assert_eq!(tree.syntax(nil), "nil");
        assert_eq!(tree.node(nil).start, 2);
        assert_eq!(tree.node(nil).length, Some(0));
        assert_eq!(tree.text(tree.root()), "a,,b");
    }

    #[test]
    fn test_leading_and_trailing_separators() {
        let tree = parse(",a,");
        let master = tree.children(tree.root())[0];
        let lists = tree.children(master).to_vec();
        assert_eq!(lists.len(), 3);
        assert_eq!(tree.syntax(tree.children(lists[0])[0]), "nil");
        assert_eq!(tree.node(tree.children(lists[0])[0]).start, 0);
        assert_eq!(tree.syntax(tree.children(lists[2])[0]), "nil");
        assert_eq!(tree.node(tree.children(lists[2])[0]).start, 3);
        assert_eq!(tree.node(master).length, Some(3));
    }

    #[test]
    fn test_higher_priority_is_outer() {
        let tree = parse("a,b|c,d");
        let master = tree.children(tree.root())[0];
        assert_eq!(tree.syntax(master), "pipe");
        let lists = tree.children(master).to_vec();
        assert_eq!(lists.len(), 2);
        let inner = tree.children(lists[0])[0];
        assert_eq!(tree.syntax(inner), "comma");
        assert_eq!(texts(&tree, inner), vec!["a", "b"]);
    }

    #[test]
    fn test_reorganize_is_idempotent() {
        let mut tree = parse("a,b:c");
        let before = tree.dump();
        let root = tree.root();
        reorganize(&mut tree, root).unwrap();
        assert_eq!(tree.dump(), before);
    }
}
