//! Integration tests for quill-eval crate.
//! Tests the full pipeline from formula text to runtime value.

use quill_env::{Environment, Invocation, ObjectSource, SourcedValue};
use quill_eval::{
    CustomOperation, DefaultProvider, EvalError, EvaluatorProvider, Interpreter, InterpreterOptions,
    ObjectValue, RuntimeEvaluation, RuntimeValue, Session, defaults, evaluate_source,
};
use quill_recipe::{RecipeManager, SyntaxFeature};
use quill_scope::MasterScope;
use quill_syntax::{BinOp, Expr, ExprKind};
use std::rc::Rc;

fn recipes() -> Rc<RecipeManager> {
    Rc::new(RecipeManager::with_features(&[SyntaxFeature::Percentages]))
}

fn character() -> Environment<RuntimeValue> {
    let mut source = ObjectSource::from_pairs(
        "character",
        [
            ("st".to_string(), RuntimeValue::Numeric(12.0)),
            ("dx".to_string(), RuntimeValue::Numeric(14.0)),
            ("name".to_string(), RuntimeValue::from("Ana")),
            ("alive".to_string(), RuntimeValue::Boolean(true)),
        ],
    )
    .unwrap();
    source.add_key("strength", SourcedValue::proxy("st")).unwrap();
    source
        .add_key(
            "min",
            SourcedValue::function(|call: &Invocation<'_, RuntimeValue>| {
                call.args
                    .iter()
                    .filter_map(RuntimeValue::as_number)
                    .reduce(f64::min)
                    .map(RuntimeValue::Numeric)
            }),
        )
        .unwrap();
    let mut env = Environment::new("sheet");
    env.add_source(source);
    env
}

fn run_with(
    source: &str,
    master: MasterScope,
    interpreter: &mut Interpreter,
    env: &Environment<RuntimeValue>,
) -> RuntimeEvaluation {
    evaluate_source(source, recipes(), master, interpreter, env)
        .unwrap()
        .result
}

fn run(source: &str) -> RuntimeEvaluation {
    run_with(source, MasterScope::MathEnabled, &mut Interpreter::default(), &character())
}

fn value(source: &str) -> RuntimeValue {
    run(source)
        .value
        .unwrap_or_else(|| panic!("{source} did not resolve"))
}

// ============================================================================
// Arithmetic Tests
// ============================================================================

#[test]
fn test_arithmetic_with_bindings() {
    assert_eq!(value("st + dx"), RuntimeValue::Numeric(26.0));
    assert_eq!(value("(st - 2) / 5"), RuntimeValue::Numeric(2.0));
    assert_eq!(value("-strength * 2"), RuntimeValue::Numeric(-24.0));
    assert_eq!(value("2st"), RuntimeValue::Numeric(24.0));
}

#[test]
fn test_comparisons_and_booleans() {
    assert_eq!(value("dx > st"), RuntimeValue::Boolean(true));
    assert_eq!(value("st == 12"), RuntimeValue::Boolean(true));
    assert_eq!(value("alive = true"), RuntimeValue::Boolean(true));
}

#[test]
fn test_calls_through_functions() {
    assert_eq!(value("min(st, dx, 20)"), RuntimeValue::Numeric(12.0));
    assert_eq!(value("min(st, dx) + 1"), RuntimeValue::Numeric(13.0));
}

#[test]
fn test_conditionals() {
    assert_eq!(value("if(alive then st else 0)"), RuntimeValue::Numeric(12.0));
    assert_eq!(value("if(st > 20, 1, 2)"), RuntimeValue::Numeric(2.0));
}

// ============================================================================
// Unresolved Tests
// ============================================================================

#[test]
fn test_unbound_names_rebuild_the_formula() {
    let result = run("st + hp * 2");
    assert!(!result.is_resolved());
    assert_eq!(result.node.to_string(), "12 + hp * 2");
}

#[test]
fn test_functions_returning_nothing_stay_calls() {
    let mut env = character();
    env.set(
        "later",
        SourcedValue::function(|_: &Invocation<'_, RuntimeValue>| None),
    );
    let result = run_with("later(dx)", MasterScope::MathEnabled, &mut Interpreter::default(), &env);
    assert!(!result.is_resolved());
    assert_eq!(result.node.to_string(), "later(14)");
}

#[test]
fn test_partial_result_resumes_in_child_environment() {
    let recipes = recipes();
    let parsed = quill_parser::parse("hp + st", recipes).unwrap();
    let scopes = quill_scope::evaluate_tree_scope(&parsed.expr, MasterScope::MathEnabled).unwrap();
    let mut interpreter = Interpreter::default();

    let first = interpreter.evaluate(&parsed.expr, &scopes, &character()).unwrap();
    assert_eq!(first.node.to_string(), "hp + 12");

    let mut scene = Environment::with_parent("scene", character());
    scene.define("hp", RuntimeValue::Numeric(8.0)).unwrap();
    let second = interpreter.evaluate(&first.node, &scopes, &scene).unwrap();
    assert_eq!(second.value, Some(RuntimeValue::Numeric(20.0)));
}

// ============================================================================
// Text Tests
// ============================================================================

#[test]
fn test_text_processing_keeps_text() {
    let mut interpreter = Interpreter::default();
    let env = character();
    let result = run_with("\"hello\" %name%", MasterScope::TextProcessing, &mut interpreter, &env);
    assert_eq!(result.value, Some(RuntimeValue::from("hello Ana")));
}

#[test]
fn test_quotes_in_math_mode() {
    assert_eq!(value("\"st + 1\""), RuntimeValue::from("st + 1"));
}

// ============================================================================
// Value Tests
// ============================================================================

#[test]
fn test_object_with_numeric_face() {
    let mut env = character();
    env.define("armor", RuntimeValue::Object(ObjectValue::new().with_numeric(3.0).with_field("kind", "leather")))
        .unwrap();
    let result = run_with("armor", MasterScope::MathEnabled, &mut Interpreter::default(), &env);
    assert_eq!(result.value, Some(RuntimeValue::Numeric(3.0)));
}

#[test]
fn test_value_display() {
    assert_eq!(RuntimeValue::Numeric(3.0).to_string(), "3");
    assert_eq!(RuntimeValue::Numeric(2.5).to_string(), "2.5");
    assert_eq!(
        RuntimeValue::List(vec![1.0.into(), "a".into(), true.into()]).to_string(),
        "1, a, true"
    );
    assert_eq!(RuntimeValue::Nil.to_string(), "");
    assert_eq!(RuntimeValue::from("x").type_name(), "string");
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_operator_errors_carry_types() {
    let error = evaluate_source(
        "name - 1",
        recipes(),
        MasterScope::MathEnabled,
        &mut Interpreter::default(),
        &character(),
    )
    .unwrap_err();
    assert!(matches!(
        error,
        EvalError::OperatorNotImplemented { op: "-", left: "string", right: "numeric", .. }
    ));
    assert!(error.span().is_some());
}

#[test]
fn test_negating_text_is_an_error() {
    let error = evaluate_source(
        "-name",
        recipes(),
        MasterScope::MathEnabled,
        &mut Interpreter::default(),
        &character(),
    )
    .unwrap_err();
    assert!(matches!(error, EvalError::TypeMismatch { .. }));
}

// ============================================================================
// Malformed Input Tests
// ============================================================================

#[test]
fn test_stray_closers_read_as_text() {
    assert_eq!(value("2) * 3"), RuntimeValue::from("2) * 3"));
    assert_eq!(value("st) * 2"), RuntimeValue::from("12) * 2"));
    assert_eq!(value("(1 2) < 3"), RuntimeValue::from("(1 2) < 3"));
    assert_eq!(value("() * 2"), RuntimeValue::from("() * 2"));
}

#[test]
fn test_malformed_markers_never_fail() {
    for source in ["x] - 1", "a, b) + 1", "2} / {", "-(1 2)", "1 + 2) * 3 - 4", "if(2) then 1 else 0)"] {
        let result = evaluate_source(
            source,
            recipes(),
            MasterScope::MathEnabled,
            &mut Interpreter::default(),
            &character(),
        );
        assert!(result.is_ok(), "{source}: {result:?}");
    }
}

// ============================================================================
// Provider Tests
// ============================================================================

/// Joins strings with `+` and knows `pi`.
struct TextProvider;

impl EvaluatorProvider for TextProvider {
    fn name(&self) -> &'static str {
        "text"
    }

    fn evaluate(&self, session: &mut Session<'_>, expr: &Expr) -> Result<RuntimeEvaluation, EvalError> {
        match &expr.kind {
            ExprKind::Variable(name) if name == "pi" => Ok(RuntimeEvaluation::resolved(
                RuntimeValue::Numeric(std::f64::consts::PI),
                expr.clone(),
            )),
            _ => defaults::evaluate(session, expr),
        }
    }

    fn evaluate_custom_operation(
        &self,
        op: BinOp,
        left: &RuntimeValue,
        right: &RuntimeValue,
        node: &Expr,
    ) -> Result<CustomOperation, EvalError> {
        match (op, left, right) {
            (BinOp::Add, RuntimeValue::String(a), RuntimeValue::String(b)) => {
                Ok(CustomOperation::Value(RuntimeValue::String(format!("{a}{b}"))))
            }
            _ => defaults::evaluate_custom_operation(op, left, right, node),
        }
    }
}

#[test]
fn test_custom_provider_hooks() {
    let mut interpreter = Interpreter::with_provider(TextProvider, InterpreterOptions::default());
    let env = character();

    let joined = run_with("name + name", MasterScope::MathEnabled, &mut interpreter, &env);
    assert_eq!(joined.value, Some(RuntimeValue::from("AnaAna")));

    let circle = run_with("pi * 2", MasterScope::MathEnabled, &mut interpreter, &env);
    let tau = circle.value.and_then(|v| v.as_number()).unwrap();
    assert!((tau - std::f64::consts::TAU).abs() < 1e-12);

    let error = evaluate_source("name * 2", recipes(), MasterScope::MathEnabled, &mut interpreter, &env)
        .unwrap_err();
    assert!(matches!(error, EvalError::OperatorNotImplemented { op: "*", .. }));
}

#[test]
fn test_default_provider_keeps_dice_symbolic() {
    let mut interpreter = Interpreter::with_provider(
        DefaultProvider,
        InterpreterOptions::default().with_roll_dice(true),
    );
    let result = run_with("2d6 + st", MasterScope::MathEnabled, &mut interpreter, &character());
    assert!(!result.is_resolved());
    assert_eq!(result.node.to_string(), "2d6 + 12");
}
