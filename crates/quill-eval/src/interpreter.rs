//! The interpreter.
//! 解释器。

use crate::{DiceProvider, EvalError, EvaluatorProvider, PostProcess, RuntimeEvaluation, RuntimeValue, defaults};
use quill_env::Environment;
use quill_scope::ScopeTable;
use quill_syntax::{Expr, ExprKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Roll dice instead of keeping them symbolic.
    pub roll_dice: bool,
    /// Seed for reproducible rolls.
    pub seed: Option<u64>,
}

impl InterpreterOptions {
    pub fn with_roll_dice(mut self, roll_dice: bool) -> Self {
        self.roll_dice = roll_dice;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Evaluates scoped expressions.
/// 对已分类的表达式求值。
pub struct Interpreter {
    provider: Box<dyn EvaluatorProvider>,
    options: InterpreterOptions,
    rng: ChaCha8Rng,
}

impl Interpreter {
    /// An interpreter with dice support.
    pub fn new(options: InterpreterOptions) -> Self {
        Self::with_provider(DiceProvider, options)
    }

    pub fn with_provider(provider: impl EvaluatorProvider + 'static, options: InterpreterOptions) -> Self {
        let rng = seeded(options.seed);
        Self {
            provider: Box::new(provider),
            options,
            rng,
        }
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    pub fn set_roll_dice(&mut self, roll_dice: bool) {
        self.options.roll_dice = roll_dice;
    }

    /// Restart the random sequence.
    pub fn reseed(&mut self, seed: Option<u64>) {
        self.options.seed = seed;
        self.rng = seeded(seed);
    }

    /// Evaluate and post-process an expression.
    pub fn evaluate(
        &mut self,
        expr: &Expr,
        scopes: &ScopeTable,
        environment: &Environment<RuntimeValue>,
    ) -> Result<RuntimeEvaluation, EvalError> {
        let provider = self.provider.as_ref();
        let mut session = Session {
            provider,
            options: &self.options,
            rng: &mut self.rng,
            scopes,
            environment,
        };
        let evaluation = session.evaluate(expr)?;
        let evaluation = match provider.post_process(&evaluation) {
            PostProcess::Keep => evaluation,
            PostProcess::Replace(value) => {
                let node = provider.convert_to_node(&value, &evaluation.node);
                RuntimeEvaluation::resolved(value, node)
            }
            PostProcess::Unresolve => RuntimeEvaluation::unresolved(evaluation.node),
        };
        tracing::debug!(
            provider = provider.name(),
            environment = environment.name(),
            ready = evaluation.is_ready(),
            "evaluated {expr}"
        );
        Ok(evaluation)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterOptions::default())
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("provider", &self.provider.name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn seeded(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

/// State of one evaluation, handed to providers.
pub struct Session<'a> {
    provider: &'a dyn EvaluatorProvider,
    options: &'a InterpreterOptions,
    rng: &'a mut ChaCha8Rng,
    scopes: &'a ScopeTable,
    environment: &'a Environment<RuntimeValue>,
}

impl<'a> Session<'a> {
    /// Evaluate a sub-expression. Textual nodes read as their text; the
    /// formula root and aggregators still evaluate their children.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<RuntimeEvaluation, EvalError> {
        if self.is_textual(expr) && !is_aggregate(expr) {
            return Ok(RuntimeEvaluation::resolved(defaults::textual(expr), expr.clone()));
        }
        let provider = self.provider;
        let evaluation = provider.evaluate(self, expr)?;
        tracing::trace!(id = expr.id.0, resolved = evaluation.is_resolved(), "node {expr}");
        Ok(evaluation)
    }

    pub fn provider(&self) -> &'a dyn EvaluatorProvider {
        self.provider
    }

    pub fn options(&self) -> &InterpreterOptions {
        self.options
    }

    pub fn environment(&self) -> &'a Environment<RuntimeValue> {
        self.environment
    }

    pub fn is_textual(&self, expr: &Expr) -> bool {
        self.scopes.is_textual(expr.id)
    }

    /// One die, `1..=faces`.
    pub fn roll(&mut self, faces: u32) -> u32 {
        if faces == 0 {
            return 0;
        }
        self.rng.random_range(1..=faces)
    }

    /// Expression an evaluation stands for: the converted value, or the
    /// rebuilt node when unresolved.
    pub fn to_node(&self, evaluation: &RuntimeEvaluation) -> Expr {
        match &evaluation.value {
            Some(value) => self.provider.convert_to_node(value, &evaluation.node),
            None => evaluation.node.clone(),
        }
    }
}

fn is_aggregate(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Root(_) | ExprKind::Sequence(_) | ExprKind::List { .. } | ExprKind::Group { open: '(', .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefaultProvider, ObjectValue};
    use quill_env::{Invocation, SourcedValue};
    use quill_recipe::{RecipeManager, SyntaxFeature};
    use quill_scope::MasterScope;
    use std::rc::Rc;

    fn sheet() -> Environment<RuntimeValue> {
        let mut env = Environment::new("sheet");
        env.define("st", RuntimeValue::Numeric(12.0)).unwrap();
        env.define("name", RuntimeValue::from("Ana")).unwrap();
        env.define("player", RuntimeValue::from("Ana")).unwrap();
        env.set(
            "max",
            SourcedValue::function(|call: &Invocation<'_, RuntimeValue>| {
                call.args
                    .iter()
                    .filter_map(RuntimeValue::as_number)
                    .reduce(f64::max)
                    .map(RuntimeValue::Numeric)
            }),
        );
        env
    }

    fn run_in(source: &str, master: MasterScope, env: &Environment<RuntimeValue>) -> RuntimeEvaluation {
        let recipes = RecipeManager::with_features(&[SyntaxFeature::Percentages]);
        let mut interpreter = Interpreter::default();
        crate::evaluate_source(source, Rc::new(recipes), master, &mut interpreter, env)
            .unwrap()
            .result
    }

    fn value(source: &str) -> RuntimeValue {
        run_in(source, MasterScope::MathEnabled, &sheet())
            .value
            .unwrap_or_else(|| panic!("{source} did not resolve"))
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(value("2+2"), RuntimeValue::Numeric(4.0));
        assert_eq!(value("2 + 3 * 4"), RuntimeValue::Numeric(14.0));
        assert_eq!(value("(2 + 3) * 4"), RuntimeValue::Numeric(20.0));
        assert_eq!(value("st / 4 - 1"), RuntimeValue::Numeric(2.0));
        assert_eq!(value("-st"), RuntimeValue::Numeric(-12.0));
        assert_eq!(value("1 / 0"), RuntimeValue::Numeric(f64::INFINITY));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(value("1 < 2"), RuntimeValue::Boolean(true));
        assert_eq!(value("st >= 13"), RuntimeValue::Boolean(false));
        assert_eq!(value("name = player"), RuntimeValue::Boolean(true));
        assert_eq!(value("name != 3"), RuntimeValue::Boolean(true));
    }

    #[test]
    fn test_quoted_operand_reads_operation_as_text() {
        assert_eq!(value("st + \"x\""), RuntimeValue::from("st + \"x\""));
    }

    #[test]
    fn test_calls_and_conditionals() {
        assert_eq!(value("max(1, st, 3)"), RuntimeValue::Numeric(12.0));
        assert_eq!(value("if(st > 10 then 1 else 2)"), RuntimeValue::Numeric(1.0));
        assert_eq!(value("if(0, 1, 2)"), RuntimeValue::Numeric(2.0));
    }

    #[test]
    fn test_unbound_names_stay_unresolved() {
        let result = run_in("hp + 1", MasterScope::MathEnabled, &sheet());
        assert!(!result.is_resolved());
        assert_eq!(result.node.to_string(), "hp + 1");

        let result = run_in("missing(st, 2)", MasterScope::MathEnabled, &sheet());
        assert!(!result.is_resolved());
        assert_eq!(result.node.to_string(), "missing(12, 2)");
    }

    #[test]
    fn test_unresolved_condition_keeps_both_branches() {
        let result = run_in("if(hp > 0 then st * 2 else 0)", MasterScope::MathEnabled, &sheet());
        assert_eq!(result.node.to_string(), "if(hp > 0 then 24 else 0)");
    }

    #[test]
    fn test_reevaluation_after_binding() {
        let recipes = Rc::new(RecipeManager::with_defaults());
        let parsed = quill_parser::parse("hp * 2 + st", recipes).unwrap();
        let scopes = quill_scope::evaluate_tree_scope(&parsed.expr, MasterScope::MathEnabled).unwrap();
        let mut interpreter = Interpreter::default();

        let mut env = sheet();
        let first = interpreter.evaluate(&parsed.expr, &scopes, &env).unwrap();
        assert_eq!(first.node.to_string(), "hp * 2 + 12");

        env.define("hp", RuntimeValue::Numeric(5.0)).unwrap();
        let second = interpreter.evaluate(&first.node, &scopes, &env).unwrap();
        assert_eq!(second.value, Some(RuntimeValue::Numeric(22.0)));
    }

    #[test]
    fn test_text_processing() {
        let env = sheet();
        let hello = run_in("hello world", MasterScope::TextProcessing, &env);
        assert_eq!(hello.value, Some(RuntimeValue::from("hello world")));

        let mixed = run_in("\"st is\" %st%", MasterScope::TextProcessing, &env);
        assert_eq!(mixed.value, Some(RuntimeValue::from("st is 12")));

        let quoted = run_in("\"st + 1\"", MasterScope::MathEnabled, &env);
        assert_eq!(quoted.value, Some(RuntimeValue::from("st + 1")));
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            value("1, st, 3"),
            RuntimeValue::List(vec![1.0.into(), 12.0.into(), 3.0.into()])
        );
    }

    #[test]
    fn test_objects_post_process() {
        let mut env = sheet();
        env.define("sword", RuntimeValue::Object(ObjectValue::new().with_numeric(8.0)))
            .unwrap();
        env.define("bag", RuntimeValue::Object(ObjectValue::new().with_field("gold", 3.0)))
            .unwrap();
        let sword = run_in("sword", MasterScope::MathEnabled, &env);
        assert_eq!(sword.value, Some(RuntimeValue::Numeric(8.0)));
        let bag = run_in("bag", MasterScope::MathEnabled, &env);
        assert!(!bag.is_resolved());
    }

    #[test]
    fn test_type_errors() {
        let env = sheet();
        let recipes = Rc::new(RecipeManager::with_defaults());
        let mut interpreter = Interpreter::default();
        let error = crate::evaluate_source("name * 2", Rc::clone(&recipes), MasterScope::MathEnabled, &mut interpreter, &env)
            .unwrap_err();
        assert!(matches!(error, EvalError::OperatorNotImplemented { op: "*", left: "string", .. }));
        assert!(error.span().is_some());

        let error = crate::evaluate_source("if(name then 1 else 2)", recipes, MasterScope::MathEnabled, &mut interpreter, &env)
            .unwrap_err();
        assert!(matches!(error, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_default_provider_leaves_dice_alone() {
        let recipes = Rc::new(RecipeManager::with_defaults());
        let mut interpreter = Interpreter::with_provider(
            DefaultProvider,
            InterpreterOptions::default().with_roll_dice(true),
        );
        let result = crate::evaluate_source("3d6", recipes, MasterScope::MathEnabled, &mut interpreter, &sheet())
            .unwrap()
            .result;
        assert!(!result.is_resolved());
        assert_eq!(result.node.to_string(), "3d6");
    }
}
