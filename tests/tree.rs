//! Integration tests for quill-tree crate.

use quill_diagnostic::ErrorCode;
use quill_recipe::RecipeManager;
use quill_tree::{Relevant, Tree, TreeError};
use std::rc::Rc;

fn recipes() -> Rc<RecipeManager> {
    Rc::new(RecipeManager::with_defaults())
}

fn parse(source: &str) -> Tree {
    Tree::parse(source, recipes()).unwrap()
}

fn child_syntaxes(tree: &Tree, id: quill_tree::NodeId) -> Vec<String> {
    tree.children(id).iter().map(|&c| tree.syntax(c).to_string()).collect()
}

// ============================================================================
// Resolver Tests
// ============================================================================

#[test]
fn test_plain_text_is_one_string() {
    let tree = parse("hello world");
    assert_eq!(child_syntaxes(&tree, tree.root()), vec!["string"]);
    assert_eq!(tree.text(tree.root()), "hello world");
}

#[test]
fn test_enclosure_relevant_characters() {
    let tree = parse("a(b)c");
    let paren = tree.find("parenthesis").unwrap();
    assert_eq!(tree.node(paren).start, 1);
    assert_eq!(tree.node(paren).length, Some(3));
    assert_eq!(tree.node(paren).relevant, vec![Relevant::Index(1), Relevant::Index(3)]);
    assert_eq!(tree.content(paren), "b");
}

#[test]
fn test_nested_enclosures_of_every_kind() {
    let tree = parse("{[(x)]}");
    let braces = tree.find("braces").unwrap();
    let brackets = tree.find("brackets").unwrap();
    let paren = tree.find("parenthesis").unwrap();
    assert_eq!(tree.parent(brackets), Some(braces));
    assert_eq!(tree.parent(paren), Some(brackets));
    assert!(tree.has_ancestor(paren, |node| node.syntax() == "braces"));
}

#[test]
fn test_text_is_preserved_for_malformed_input() {
    for source in ["(a", "a)", "((a)", "\"open", "[a}", "a,,(b|", ")(", ""] {
        let tree = parse(source);
        assert_eq!(tree.text(tree.root()), source, "{source}");
    }
}

#[test]
fn test_unbalanced_markers_become_warnings() {
    let tree = parse("(a b");
    let diagnostics = tree.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, Some(ErrorCode::UnbalancedEnclosure));
    assert!(!diagnostics[0].is_error());

    let tree = parse("a b)");
    let diagnostics = tree.diagnostics();
    assert_eq!(diagnostics[0].code, Some(ErrorCode::StrayCloser));
}

#[test]
fn test_balanced_input_has_no_diagnostics() {
    assert!(parse("f(1, [2], {3}) | \"x\"").diagnostics().is_empty());
}

// ============================================================================
// Aggregator Tests
// ============================================================================

#[test]
fn test_function_keys() {
    let tree = parse("x + max(1, 2)");
    let function = tree.find("function").unwrap();
    assert_eq!(tree.text(tree.key(function, "callee").unwrap()), "max");
    assert_eq!(tree.syntax(tree.key(function, "arguments").unwrap()), "parenthesis");
    assert_eq!(tree.key(function, "body"), None);
}

#[test]
fn test_at_sign_callee() {
    let tree = parse("@max(1)");
    let function = tree.find("function").unwrap();
    assert_eq!(tree.text(tree.key(function, "callee").unwrap()), "@max");
}

#[test]
fn test_number_before_parenthesis_is_not_a_call() {
    let tree = parse("2(3)");
    assert!(tree.find("function").is_none());
}

// ============================================================================
// Identification Tests
// ============================================================================

#[test]
fn test_context_names() {
    let tree = parse("x(a)");
    assert_eq!(tree.context(tree.root()), "root");
    let paren = tree.find("parenthesis").unwrap();
    assert_eq!(tree.context(paren), "ρ2.b");
    assert_eq!(tree.level(paren), 2);
}

#[test]
fn test_preorder_and_postorder() {
    let tree = parse("(a)");
    let pre = tree.preorder(tree.root());
    let post = tree.postorder(tree.root());
    assert_eq!(pre.len(), post.len());
    assert_eq!(pre[0], tree.root());
    assert_eq!(post[post.len() - 1], tree.root());
}

#[test]
fn test_at_index() {
    let tree = parse("ab(cd)");
    let at = tree.at(3).unwrap();
    assert_eq!(tree.text(at), "cd");
    assert_eq!(tree.at(100), None);
}

// ============================================================================
// Serialization Tests
// ============================================================================

#[test]
fn test_serialize_round_trip() {
    let source = "max(1, (2|3)) \"q\"";
    let tree = parse(source);
    let serialized = tree.serialize();
    let json = serde_json::to_string(&serialized).unwrap();
    let back = serde_json::from_str(&json).unwrap();
    let rebuilt = Tree::deserialize(source, recipes(), &back).unwrap();
    assert_eq!(rebuilt.dump(), tree.dump());
}

#[test]
fn test_deserialize_unknown_syntax() {
    let tree = parse("a");
    let mut serialized = tree.serialize();
    serialized.children[0].meta.syntax = "nope".to_string();
    assert!(matches!(
        Tree::deserialize("a", recipes(), &serialized),
        Err(TreeError::UnknownSyntax(_))
    ));
}
