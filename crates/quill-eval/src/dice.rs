//! Dice rolls.
//! 掷骰扩展。

use crate::{
    CustomOperation, DiceRollValue, EvalError, EvaluatorProvider, PostProcess, RuntimeEvaluation, RuntimeValue,
    Session, defaults,
};
use quill_syntax::{BinOp, Expr, ExprKind};

/// Most dice one roll may throw.
pub const MAX_DICE: u32 = 10_000;

/// Evaluation with dice.
///
/// Dice stay symbolic unless the interpreter rolls them. Symbolic dice
/// combine only where the result is still plain dice: `2d6 + 1d6` is
/// `3d6`, `2d6 * 2` is `4d6`, while `1d6 + 1d8` or `2 / 1d6` are left as
/// notation. A rolled die is just its total.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiceProvider;

impl EvaluatorProvider for DiceProvider {
    fn name(&self) -> &'static str {
        "dice"
    }

    fn evaluate(&self, session: &mut Session<'_>, expr: &Expr) -> Result<RuntimeEvaluation, EvalError> {
        let ExprKind::DiceRoll { size, faces, keep } = &expr.kind else {
            return defaults::evaluate(session, expr);
        };
        let mut roll = DiceRollValue::new(*size, *faces, *keep);
        if session.options().roll_dice {
            if *size > MAX_DICE {
                return Err(EvalError::TooManyDice {
                    size: *size,
                    limit: MAX_DICE,
                    span: expr.span,
                });
            }
            let rolls: Vec<u32> = (0..*size).map(|_| session.roll(*faces)).collect();
            tracing::debug!(dice = %expr, ?rolls, "rolled");
            roll.rolls = Some(rolls);
        }
        Ok(RuntimeEvaluation::resolved(RuntimeValue::DiceRoll(roll), expr.clone()))
    }

    fn evaluate_custom_operation(
        &self,
        op: BinOp,
        left: &RuntimeValue,
        right: &RuntimeValue,
        node: &Expr,
    ) -> Result<CustomOperation, EvalError> {
        if !is_dice_operand(left) || !is_dice_operand(right) {
            return defaults::evaluate_custom_operation(op, left, right, node);
        }
        let combined = match (left, right) {
            (RuntimeValue::DiceRoll(a), RuntimeValue::DiceRoll(b)) => combine(op, a, b),
            (RuntimeValue::DiceRoll(dice), RuntimeValue::Numeric(n)) => scale(op, dice, *n),
            (RuntimeValue::Numeric(n), RuntimeValue::DiceRoll(dice)) if op == BinOp::Mul => {
                scale(op, dice, *n)
            }
            _ => None,
        };
        Ok(match combined {
            Some(dice) => CustomOperation::Value(RuntimeValue::DiceRoll(dice)),
            None => CustomOperation::Defer,
        })
    }

    fn convert_to_node(&self, value: &RuntimeValue, node: &Expr) -> Expr {
        match value {
            RuntimeValue::DiceRoll(roll) => match roll.total() {
                Some(total) => node.rebuilt(ExprKind::Number(total)),
                None => node.rebuilt(ExprKind::DiceRoll {
                    size: roll.size,
                    faces: roll.faces,
                    keep: roll.keep,
                }),
            },
            _ => defaults::convert_to_node(value, node),
        }
    }

    fn post_process(&self, evaluation: &RuntimeEvaluation) -> PostProcess {
        match &evaluation.value {
            Some(value @ RuntimeValue::DiceRoll(roll)) => match roll.total() {
                Some(total) => PostProcess::Replace(RuntimeValue::Numeric(total)),
                None => PostProcess::Replace(RuntimeValue::DiceNotation(
                    self.convert_to_node(value, &evaluation.node),
                )),
            },
            None if dice_arithmetic(&evaluation.node) == Some(true) => {
                PostProcess::Replace(RuntimeValue::DiceNotation(evaluation.node.clone()))
            }
            _ => defaults::post_process(evaluation),
        }
    }
}

fn is_dice_operand(value: &RuntimeValue) -> bool {
    matches!(
        value,
        RuntimeValue::Numeric(_) | RuntimeValue::DiceRoll(_) | RuntimeValue::DiceNotation(_)
    )
}

/// Two symbolic rolls of the same dice.
fn combine(op: BinOp, a: &DiceRollValue, b: &DiceRollValue) -> Option<DiceRollValue> {
    if a.was_rolled() || b.was_rolled() || !a.compatible(b) {
        return None;
    }
    let size = match op {
        BinOp::Add => a.size.checked_add(b.size)?,
        BinOp::Sub => a.size.checked_sub(b.size)?,
        _ => return None,
    };
    Some(DiceRollValue::new(size, a.faces, a.keep))
}

/// Symbolic roll times or divided by a whole count.
fn scale(op: BinOp, dice: &DiceRollValue, factor: f64) -> Option<DiceRollValue> {
    if dice.was_rolled() || factor.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&factor) {
        return None;
    }
    let factor = factor as u32;
    let size = match op {
        BinOp::Mul => dice.size.checked_mul(factor)?,
        BinOp::Div if factor != 0 && dice.size % factor == 0 => dice.size / factor,
        _ => return None,
    };
    Some(DiceRollValue::new(size, dice.faces, dice.keep))
}

/// `Some(has_dice)` when the expression is made only of numbers, dice and
/// arithmetic.
fn dice_arithmetic(expr: &Expr) -> Option<bool> {
    match &expr.kind {
        ExprKind::Number(_) => Some(false),
        ExprKind::DiceRoll { .. } => Some(true),
        ExprKind::Root(inner) | ExprKind::Group { open: '(', inner, .. } => dice_arithmetic(inner),
        ExprKind::Unary { operand, .. } => dice_arithmetic(operand),
        ExprKind::Binary { op, left, right } if op.is_arithmetic() => {
            Some(dice_arithmetic(left)? | dice_arithmetic(right)?)
        }
        _ => None,
    }
}
