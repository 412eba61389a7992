//! Post-parse stages: pattern splitting and aggregation.
//! 解析后的阶段：模式拆分与聚合。

use crate::node::{Node, NodeId, Relevant};
use crate::tree::Tree;
use quill_recipe::{Recipe, RecipeKind, Recognizer, Restriction, Stage, catalog};

/// Split `string` nodes around pattern words. Adds siblings, never height.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn horizontal(tree: &mut Tree) {
    let recipes = tree.recipes_rc();
    for recipe in recipes.by_stage(Stage::Horizontal) {
        for string in tree.find_all(catalog::STRING) {
            split_patterns(tree, string, recipe);
        }
    }
}

fn split_patterns(tree: &mut Tree, string: NodeId, recipe: &Recipe) {
    let Some(parent) = tree.parent(string) else {
        return;
    };
    let allowed = tree
        .recipe(parent)
        .is_none_or(|parent| recipe.validate_restriction(Restriction::Parents, &[parent]));
    if !allowed {
        return;
    }

    let start = tree.node(string).start;
    let chars: Vec<char> = tree.text(string).chars().collect();
    let matches = recipe.find_patterns(&chars);
    if matches.is_empty() {
        return;
    }

    let mut pieces = Vec::new();
    let mut cursor = 0;
    for found in matches {
        if found.start > cursor {
            let piece = Node::new(catalog::STRING, start + cursor, Some(found.start - cursor));
            pieces.push(tree.alloc(piece));
        }
        let at = start + found.start;
        let mut pattern = Node::new(recipe.name.clone(), at, Some(found.len));
        pattern.relevant.push(Relevant::Range(at, at + found.len - 1));
        pattern.data = serde_json::json!({ "pattern": found.key });
        pieces.push(tree.alloc(pattern));
        cursor = found.start + found.len;
    }
    if cursor < chars.len() {
        let piece = Node::new(catalog::STRING, start + cursor, Some(chars.len() - cursor));
        pieces.push(tree.alloc(piece));
    }

    tracing::trace!(pieces = pieces.len(), "split string around patterns");
    let position = position_of(tree, parent, string);
    tree.detach_child(parent, string);
    for (offset, piece) in pieces.into_iter().enumerate() {
        tree.insert_child(parent, position + offset, piece);
    }
}

/// Wrap a recognized word and the enclosure right after it into an
/// aggregate node, e.g. `max` + `(a, b)` into a `function`.
#[tracing::instrument(level = "debug", skip_all)]
pub(crate) fn vertical(tree: &mut Tree) {
    let recipes = tree.recipes_rc();
    for recipe in recipes.by_stage(Stage::Vertical) {
        let RecipeKind::Aggregator {
            target, recognize, ..
        } = &recipe.kind
        else {
            continue;
        };
        for parent in tree.preorder(tree.root()) {
            aggregate_children(tree, parent, recipe, target, *recognize);
        }
    }
}

fn aggregate_children(
    tree: &mut Tree,
    parent: NodeId,
    recipe: &Recipe,
    target: &str,
    recognize: Recognizer,
) {
    let allowed = tree
        .recipe(parent)
        .is_none_or(|parent| recipe.validate_restriction(Restriction::Parents, &[parent]));
    if !allowed {
        return;
    }

    let mut i = 0;
    while i + 1 < tree.children(parent).len() {
        let word_node = tree.children(parent)[i];
        let anchor = tree.children(parent)[i + 1];

        let adjacent = tree.syntax(word_node) == catalog::STRING
            && tree.syntax(anchor) == target
            && tree.node(word_node).end_exclusive() == Some(tree.node(anchor).start);
        if !adjacent {
            i += 1;
            continue;
        }

        let text: Vec<char> = tree.text(word_node).chars().collect();
        let word_start = trailing_word_start(&text);
        let word: String = text[word_start..].iter().collect();
        if !recognize(&word) {
            i += 1;
            continue;
        }

        tracing::trace!(%word, "aggregating {}", recipe.name);
        let callee = if word_start == 0 {
            tree.detach_child(parent, word_node);
            word_node
        } else {
            let word_at = tree.node(word_node).start + word_start;
            tree.node_mut(word_node).length = Some(word_start);
            i += 1;
            tree.alloc(Node::new(catalog::STRING, word_at, Some(text.len() - word_start)))
        };
        tree.detach_child(parent, anchor);

        let start = tree.node(callee).start;
        let end = tree.node(anchor).end_exclusive().unwrap_or(start);
        let aggregate = tree.alloc(Node::new(recipe.name.clone(), start, Some(end - start)));
        tree.set_children(aggregate, vec![callee, anchor]);
        tree.insert_child(parent, i, aggregate);
        i += 1;
    }
}

/// Start of the trailing `@?word` of a run of characters.
fn trailing_word_start(text: &[char]) -> usize {
    let mut i = text.len();
    while i > 0 && (text[i - 1].is_alphanumeric() || text[i - 1] == '_') {
        i -= 1;
    }
    if i > 0 && text[i - 1] == '@' {
        i -= 1;
    }
    i
}

fn position_of(tree: &Tree, parent: NodeId, child: NodeId) -> usize {
    tree.children(parent)
        .iter()
        .position(|&c| c == child)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_recipe::{RecipeManager, SyntaxFeature, SyntaxPattern};
    use std::rc::Rc;

    #[test]
    fn test_trailing_word() {
        let chars: Vec<char> = "1 + @max".chars().collect();
        assert_eq!(trailing_word_start(&chars), 4);
        let chars: Vec<char> = "a +".chars().collect();
        assert_eq!(trailing_word_start(&chars), 3);
    }

    #[test]
    fn test_function_splits_callee() {
        let tree = Tree::parse("1 + max(2, 3)", Rc::new(RecipeManager::with_defaults())).unwrap();
        let function = tree.find("function").unwrap();
        let callee = tree.key(function, "callee").unwrap();
        let arguments = tree.key(function, "arguments").unwrap();
        assert_eq!(tree.text(callee), "max");
        assert_eq!(tree.syntax(arguments), "parenthesis");
        assert_eq!(tree.text(function), "max(2, 3)");

        let first = tree.children(tree.root())[0];
        assert_eq!(tree.text(first), "1 + ");
    }

    #[test]
    fn test_spaced_parenthesis_is_not_a_call() {
        let tree = Tree::parse("max (2)", Rc::new(RecipeManager::with_defaults())).unwrap();
        assert!(tree.find("function").is_none());
    }

    #[test]
    fn test_patterns_split_strings() {
        let mut recipes = RecipeManager::with_features(&[SyntaxFeature::Reserved]);
        let keywords = catalog::reserved().with_patterns(vec![
            SyntaxPattern::new("then", &["then"]),
            SyntaxPattern::new("else", &["else"]),
        ]);
        recipes.replace(keywords).unwrap();

        let tree = Tree::parse("a then b else c", Rc::new(recipes)).unwrap();
        let reserved = tree.find_all("reserved");
        assert_eq!(reserved.len(), 2);
        assert_eq!(tree.node(reserved[0]).data["pattern"], "then");
        assert_eq!(tree.text(tree.root()), "a then b else c");
        assert_eq!(tree.children(tree.root()).len(), 5);
    }
}
