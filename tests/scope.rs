//! Integration tests for quill-scope crate.

use quill_parser::parse;
use quill_recipe::{RecipeManager, SyntaxFeature};
use quill_scope::{MasterScope, Scope, ScopeTable, dump, evaluate_tree_scope};
use quill_syntax::{Expr, ExprKind};
use std::rc::Rc;

fn classify(source: &str, master: MasterScope) -> (Expr, ScopeTable) {
    let recipes = RecipeManager::with_features(&[SyntaxFeature::Percentages]);
    let parsed = parse(source, Rc::new(recipes)).unwrap();
    let table = evaluate_tree_scope(&parsed.expr, master).unwrap();
    (parsed.expr, table)
}

fn find(expr: &Expr, predicate: impl Fn(&Expr) -> bool) -> Expr {
    expr.postorder()
        .into_iter()
        .find(|e| predicate(e))
        .cloned()
        .expect("expression not found")
}

fn variable(name: &str) -> impl Fn(&Expr) -> bool + '_ {
    move |e| matches!(&e.kind, ExprKind::Variable(v) if v == name)
}

// ============================================================================
// Resolution Tests
// ============================================================================

#[test]
fn test_no_node_stays_derived() {
    let sources = [
        "st + 2",
        "hello there world",
        "\"x\" + 1",
        "f(a, (b), [c], {d})",
        "if(hp > 0 then 1 else 0)",
        "%st% points",
        "a,,b",
        "",
    ];
    for source in sources {
        for master in [MasterScope::MathEnabled, MasterScope::TextProcessing] {
            let (expr, table) = classify(source, master);
            for node in expr.postorder() {
                assert_ne!(table.scope(node.id), Scope::Derived, "{source} / {master:?}");
            }
        }
    }
}

#[test]
fn test_root_follows_master() {
    let (expr, table) = classify("hello world", MasterScope::TextProcessing);
    assert_eq!(table.scope(expr.id), Scope::Textual);
    let (expr, table) = classify("1 + 2", MasterScope::MathEnabled);
    assert_eq!(table.scope(expr.id), Scope::Logical);
}

// ============================================================================
// Context Tests
// ============================================================================

#[test]
fn test_math_mode_words_are_logical() {
    let (expr, table) = classify("st + dx", MasterScope::MathEnabled);
    assert_eq!(table.scope(find(&expr, variable("st")).id), Scope::Logical);
}

#[test]
fn test_text_mode_words_are_textual() {
    let (expr, table) = classify("hello world", MasterScope::TextProcessing);
    assert!(table.is_textual(find(&expr, variable("hello")).id));
    assert!(table.is_textual(find(&expr, Expr::is_whitespace).id));
}

#[test]
fn test_quoted_operand_makes_operation_textual() {
    let (expr, table) = classify("st + \"x\"", MasterScope::MathEnabled);
    let sum = find(&expr, |e| matches!(e.kind, ExprKind::Binary { .. }));
    assert_eq!(table.scope(sum.id), Scope::Textual);
}

#[test]
fn test_references_are_logical_in_text() {
    let (expr, table) = classify("\"st is\" %st%", MasterScope::TextProcessing);
    let reference = find(&expr, |e| matches!(e.kind, ExprKind::Reference(_)));
    assert_eq!(table.scope(reference.id), Scope::Logical);
    let quoted = find(&expr, |e| matches!(e.kind, ExprKind::Quoted(_)));
    assert_eq!(table.scope(quoted.id), Scope::Textual);
}

#[test]
fn test_call_arguments_are_logical() {
    let (expr, table) = classify("f((\"a\"))", MasterScope::TextProcessing);
    let group = find(&expr, |e| matches!(e.kind, ExprKind::Group { .. }));
    assert_eq!(table.scope(group.id), Scope::Logical);
}

// ============================================================================
// Dump Tests
// ============================================================================

#[test]
fn test_dump_has_a_line_per_node() {
    let (expr, table) = classify("1 + x", MasterScope::MathEnabled);
    let text = dump(&expr, &table);
    assert_eq!(text.lines().count(), expr.postorder().len());
    assert!(text.starts_with("root n/a → logical"));
}
