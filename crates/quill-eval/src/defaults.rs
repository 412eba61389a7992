//! Default evaluations.
//!
//! Missing bindings and symbolic operands never fail: the affected node is
//! rebuilt from whatever did resolve and returned unresolved. Only values
//! that cannot meet under an operator are errors.

use crate::{CustomOperation, EvalError, PostProcess, RuntimeEvaluation, RuntimeValue, Session};
use quill_syntax::{BinOp, Expr, ExprKind, UnaryOp};
use std::cmp::Ordering;

pub fn evaluate(session: &mut Session<'_>, expr: &Expr) -> Result<RuntimeEvaluation, EvalError> {
    let resolved = |value: RuntimeValue| -> Result<RuntimeEvaluation, EvalError> {
        Ok(RuntimeEvaluation::resolved(value, expr.clone()))
    };
    match &expr.kind {
        ExprKind::Number(n) => resolved(RuntimeValue::Numeric(*n)),
        ExprKind::Bool(b) => resolved(RuntimeValue::Boolean(*b)),
        ExprKind::Text(text) | ExprKind::Whitespace(text) => resolved(RuntimeValue::String(text.clone())),
        ExprKind::Quoted(inner) => resolved(RuntimeValue::String(inner.to_string())),
        ExprKind::Nil => resolved(RuntimeValue::Nil),
        ExprKind::Variable(name) | ExprKind::Reference(name) => lookup(session, expr, name),
        ExprKind::Binary { op, left, right } => binary(session, expr, *op, left, right),
        ExprKind::Unary { op, operand } => unary(session, expr, *op, operand),
        ExprKind::Call { callee, args } => call(session, expr, callee, args),
        ExprKind::If {
            condition,
            then_branch,
            else_branch,
        } => conditional(session, expr, condition, then_branch, else_branch),
        ExprKind::Group { open, close, inner } => group(session, expr, *open, *close, inner),
        ExprKind::List { separator, items } => list(session, expr, *separator, items),
        ExprKind::Sequence(items) => sequence(session, expr, items),
        // Rolling needs a dice-aware provider.
        ExprKind::DiceRoll { .. } => Ok(RuntimeEvaluation::unresolved(expr.clone())),
        ExprKind::Root(inner) => {
            let evaluation = session.evaluate(inner)?;
            Ok(match evaluation.value {
                Some(value) => RuntimeEvaluation::resolved(value, expr.clone()),
                None => RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::Root(Box::new(evaluation.node)))),
            })
        }
    }
}

/// Value of a node read as text.
pub fn textual(expr: &Expr) -> RuntimeValue {
    match &expr.kind {
        ExprKind::Quoted(inner) => RuntimeValue::String(inner.to_string()),
        _ => RuntimeValue::String(expr.to_string()),
    }
}

/// Leftover text: unmatched markers, empty slots and juxtaposed runs. An
/// operator applied to it reads as text instead of failing.
pub fn is_stray(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Text(_) | ExprKind::Whitespace(_) | ExprKind::Sequence(_) | ExprKind::Nil => true,
        ExprKind::Group { inner, .. } | ExprKind::Root(inner) => is_stray(inner),
        ExprKind::Unary { operand, .. } => is_stray(operand),
        ExprKind::Binary { left, right, .. } => is_stray(left) || is_stray(right),
        _ => false,
    }
}

fn lookup(session: &Session<'_>, expr: &Expr, name: &str) -> Result<RuntimeEvaluation, EvalError> {
    Ok(match session.environment().get(name)? {
        Some(value) => RuntimeEvaluation::resolved(value, expr.clone()),
        None => {
            tracing::trace!(name, "unbound identifier");
            RuntimeEvaluation::unresolved(expr.clone())
        }
    })
}

fn binary(
    session: &mut Session<'_>,
    expr: &Expr,
    op: BinOp,
    left: &Expr,
    right: &Expr,
) -> Result<RuntimeEvaluation, EvalError> {
    if is_stray(left) || is_stray(right) {
        tracing::trace!(%expr, "operator over stray text");
        return Ok(RuntimeEvaluation::resolved(textual(expr), expr.clone()));
    }
    let left = session.evaluate(left)?;
    let right = session.evaluate(right)?;
    let deferred = |session: &Session<'_>| {
        RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::Binary {
            op,
            left: Box::new(session.to_node(&left)),
            right: Box::new(session.to_node(&right)),
        }))
    };
    let (Some(lhs), Some(rhs)) = (&left.value, &right.value) else {
        return Ok(deferred(session));
    };

    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        return Ok(RuntimeEvaluation::resolved(numeric(op, a, b), expr.clone()));
    }
    if op.is_comparison() {
        return Ok(match compare(op, lhs, rhs, expr)? {
            Some(result) => RuntimeEvaluation::resolved(RuntimeValue::Boolean(result), expr.clone()),
            None => deferred(session),
        });
    }
    match session.provider().evaluate_custom_operation(op, lhs, rhs, expr)? {
        CustomOperation::Value(value) => Ok(RuntimeEvaluation::resolved(value, expr.clone())),
        CustomOperation::Defer => Ok(deferred(session)),
    }
}

fn numeric(op: BinOp, a: f64, b: f64) -> RuntimeValue {
    match op {
        BinOp::Add => RuntimeValue::Numeric(a + b),
        BinOp::Sub => RuntimeValue::Numeric(a - b),
        BinOp::Mul => RuntimeValue::Numeric(a * b),
        BinOp::Div => RuntimeValue::Numeric(a / b),
        BinOp::Eq => RuntimeValue::Boolean(a == b),
        BinOp::Ne => RuntimeValue::Boolean(a != b),
        BinOp::Lt => RuntimeValue::Boolean(a < b),
        BinOp::Le => RuntimeValue::Boolean(a <= b),
        BinOp::Gt => RuntimeValue::Boolean(a > b),
        BinOp::Ge => RuntimeValue::Boolean(a >= b),
    }
}

/// Non-numeric comparison. `None` leaves it symbolic.
fn compare(op: BinOp, left: &RuntimeValue, right: &RuntimeValue, node: &Expr) -> Result<Option<bool>, EvalError> {
    if left.is_symbolic() || right.is_symbolic() {
        return Ok(None);
    }
    let ordering = match (left, right) {
        (RuntimeValue::String(a), RuntimeValue::String(b)) => a.cmp(b),
        (RuntimeValue::Boolean(a), RuntimeValue::Boolean(b)) => a.cmp(b),
        _ => {
            return match op {
                BinOp::Eq => Ok(Some(left == right)),
                BinOp::Ne => Ok(Some(left != right)),
                _ => Err(EvalError::TypeMismatch {
                    message: format!(
                        "cannot order {} and {}",
                        left.type_name(),
                        right.type_name()
                    ),
                    span: node.span,
                }),
            };
        }
    };
    Ok(Some(match op {
        BinOp::Eq => ordering == Ordering::Equal,
        BinOp::Ne => ordering != Ordering::Equal,
        BinOp::Lt => ordering == Ordering::Less,
        BinOp::Le => ordering != Ordering::Greater,
        BinOp::Gt => ordering == Ordering::Greater,
        BinOp::Ge => ordering != Ordering::Less,
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => return Ok(None),
    }))
}

pub fn evaluate_custom_operation(
    op: BinOp,
    left: &RuntimeValue,
    right: &RuntimeValue,
    node: &Expr,
) -> Result<CustomOperation, EvalError> {
    Err(EvalError::OperatorNotImplemented {
        op: op.as_str(),
        left: left.type_name(),
        right: right.type_name(),
        span: node.span,
    })
}

fn unary(session: &mut Session<'_>, expr: &Expr, op: UnaryOp, operand: &Expr) -> Result<RuntimeEvaluation, EvalError> {
    if is_stray(operand) {
        return Ok(RuntimeEvaluation::resolved(textual(expr), expr.clone()));
    }
    let evaluation = session.evaluate(operand)?;
    match &evaluation.value {
        Some(value) => match value.as_number() {
            Some(n) => Ok(RuntimeEvaluation::resolved(RuntimeValue::Numeric(-n), expr.clone())),
            None if value.is_symbolic() => Ok(RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::Unary {
                op,
                operand: Box::new(session.to_node(&evaluation)),
            }))),
            None => Err(EvalError::TypeMismatch {
                message: format!("cannot negate {}", value.type_name()),
                span: expr.span,
            }),
        },
        None => Ok(RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::Unary {
            op,
            operand: Box::new(evaluation.node),
        }))),
    }
}

/// Evaluate every item; `Ok(Err(nodes))` when one of them stays unresolved.
fn evaluate_all(
    session: &mut Session<'_>,
    items: &[Expr],
) -> Result<Result<Vec<RuntimeValue>, Vec<Expr>>, EvalError> {
    let evaluations = items
        .iter()
        .map(|item| session.evaluate(item))
        .collect::<Result<Vec<_>, _>>()?;
    if evaluations.iter().all(RuntimeEvaluation::is_resolved) {
        Ok(Ok(evaluations.into_iter().filter_map(|e| e.value).collect()))
    } else {
        Ok(Err(evaluations.iter().map(|e| session.to_node(e)).collect()))
    }
}

fn call(session: &mut Session<'_>, expr: &Expr, callee: &str, args: &[Expr]) -> Result<RuntimeEvaluation, EvalError> {
    let values = match evaluate_all(session, args)? {
        Ok(values) => values,
        Err(args) => {
            return Ok(RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::Call {
                callee: callee.to_string(),
                args,
            })));
        }
    };
    match session.environment().call(callee, &values)? {
        Some(value) => Ok(RuntimeEvaluation::resolved(value, expr.clone())),
        None => {
            tracing::trace!(callee, "function not available");
            let args = values
                .iter()
                .zip(args)
                .map(|(value, arg)| session.provider().convert_to_node(value, arg))
                .collect();
            Ok(RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::Call {
                callee: callee.to_string(),
                args,
            })))
        }
    }
}

fn conditional(
    session: &mut Session<'_>,
    expr: &Expr,
    condition: &Expr,
    then_branch: &Expr,
    else_branch: &Expr,
) -> Result<RuntimeEvaluation, EvalError> {
    let test = session.evaluate(condition)?;
    let truth = match &test.value {
        Some(RuntimeValue::Boolean(b)) => Some(*b),
        Some(value) if value.is_symbolic() => None,
        Some(_) if is_stray(condition) => None,
        Some(value) => match value.as_number() {
            Some(n) => Some(n != 0.0),
            None => {
                return Err(EvalError::TypeMismatch {
                    message: format!("condition must be boolean or numeric, found {}", value.type_name()),
                    span: condition.span,
                });
            }
        },
        None => None,
    };
    match truth {
        Some(true) => session.evaluate(then_branch),
        Some(false) => session.evaluate(else_branch),
        None => {
            let then_branch = session.evaluate(then_branch)?;
            let else_branch = session.evaluate(else_branch)?;
            Ok(RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::If {
                condition: Box::new(session.to_node(&test)),
                then_branch: Box::new(session.to_node(&then_branch)),
                else_branch: Box::new(session.to_node(&else_branch)),
            })))
        }
    }
}

fn group(
    session: &mut Session<'_>,
    expr: &Expr,
    open: char,
    close: char,
    inner: &Expr,
) -> Result<RuntimeEvaluation, EvalError> {
    let evaluation = session.evaluate(inner)?;
    match evaluation.value {
        Some(value) if session.is_textual(expr) => Ok(RuntimeEvaluation::resolved(
            RuntimeValue::String(format!("{open}{value}{close}")),
            expr.clone(),
        )),
        Some(value) => Ok(RuntimeEvaluation::resolved(value, expr.clone())),
        None => Ok(RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::Group {
            open,
            close,
            inner: Box::new(evaluation.node),
        }))),
    }
}

fn list(session: &mut Session<'_>, expr: &Expr, separator: char, items: &[Expr]) -> Result<RuntimeEvaluation, EvalError> {
    match evaluate_all(session, items)? {
        Ok(values) if session.is_textual(expr) => {
            let text = values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(&separator.to_string());
            Ok(RuntimeEvaluation::resolved(RuntimeValue::String(text), expr.clone()))
        }
        Ok(values) => Ok(RuntimeEvaluation::resolved(RuntimeValue::List(values), expr.clone())),
        Err(items) => Ok(RuntimeEvaluation::unresolved(
            expr.rebuilt(ExprKind::List { separator, items }),
        )),
    }
}

/// Juxtaposed values read as text.
fn sequence(session: &mut Session<'_>, expr: &Expr, items: &[Expr]) -> Result<RuntimeEvaluation, EvalError> {
    match evaluate_all(session, items)? {
        Ok(values) => {
            let text: String = values.iter().map(ToString::to_string).collect();
            Ok(RuntimeEvaluation::resolved(RuntimeValue::String(text), expr.clone()))
        }
        Err(items) => Ok(RuntimeEvaluation::unresolved(expr.rebuilt(ExprKind::Sequence(items)))),
    }
}

pub fn convert_to_node(value: &RuntimeValue, node: &Expr) -> Expr {
    let kind = match value {
        RuntimeValue::Numeric(n) => ExprKind::Number(*n),
        RuntimeValue::Boolean(b) => ExprKind::Bool(*b),
        RuntimeValue::Nil => ExprKind::Nil,
        RuntimeValue::Object(object) => match object.numeric {
            Some(n) => ExprKind::Number(n),
            None => ExprKind::Text(value.to_string()),
        },
        RuntimeValue::List(items) => ExprKind::List {
            separator: ',',
            items: items
                .iter()
                .map(|item| convert_to_node(item, &Expr::synthetic(ExprKind::Nil)))
                .collect(),
        },
        RuntimeValue::DiceNotation(expr) => return expr.clone(),
        RuntimeValue::String(_) | RuntimeValue::DiceRoll(_) => ExprKind::Text(value.to_string()),
    };
    node.rebuilt(kind)
}

/// Objects with a numeric face become numbers; other objects are not
/// final values.
pub fn post_process(evaluation: &RuntimeEvaluation) -> PostProcess {
    match &evaluation.value {
        Some(RuntimeValue::Object(object)) => match object.numeric {
            Some(n) => PostProcess::Replace(RuntimeValue::Numeric(n)),
            None => PostProcess::Unresolve,
        },
        _ => PostProcess::Keep,
    }
}
