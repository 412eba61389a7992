//! Expression nodes.
//! 表达式节点。

use crate::DiceKeep;
use quill_common::Span;
use std::fmt;

/// Identity of an expression, stable across re-evaluation.
/// 表达式的标识，在重新求值时保持稳定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

impl ExprId {
    /// Id of nodes built at runtime, outside the parsed formula.
    pub const SYNTHETIC: ExprId = ExprId(u32::MAX);

    pub fn is_synthetic(self) -> bool {
        self == ExprId::SYNTHETIC
    }
}

/// An expression.
/// 表达式。
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind, span: Span) -> Self {
        Self { id, kind, span }
    }

    pub fn synthetic(kind: ExprKind) -> Self {
        Self::new(ExprId::SYNTHETIC, kind, Span::DUMMY)
    }

    /// Same identity, new content.
    pub fn rebuilt(&self, kind: ExprKind) -> Self {
        Self::new(self.id, kind, self.span)
    }

    /// Direct sub-expressions, in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Quoted(inner) | ExprKind::Root(inner) => vec![inner.as_ref()],
            ExprKind::Group { inner, .. } => vec![inner.as_ref()],
            ExprKind::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            ExprKind::Unary { operand, .. } => vec![operand.as_ref()],
            ExprKind::Call { args, .. } => args.iter().collect(),
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => vec![condition.as_ref(), then_branch.as_ref(), else_branch.as_ref()],
            ExprKind::List { items, .. } | ExprKind::Sequence(items) => items.iter().collect(),
            ExprKind::Number(_)
            | ExprKind::Bool(_)
            | ExprKind::Text(_)
            | ExprKind::Variable(_)
            | ExprKind::Reference(_)
            | ExprKind::Whitespace(_)
            | ExprKind::Nil
            | ExprKind::DiceRoll { .. } => Vec::new(),
        }
    }

    /// Every expression of the subtree, children before parents.
    pub fn postorder(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        for child in self.children() {
            out.extend(child.postorder());
        }
        out.push(self);
        out
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, ExprKind::Whitespace(_))
    }

    /// Binding strength when printed; atoms bind tightest.
    fn precedence(&self) -> u8 {
        match &self.kind {
            ExprKind::Binary { op, .. } => op.precedence(),
            ExprKind::Unary { .. } => 4,
            _ => 5,
        }
    }
}

/// Expression kind.
/// 表达式类型。
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Number literal / 数字字面量
    Number(f64),
    /// Boolean literal / 布尔字面量
    Bool(bool),
    /// Text with no logical meaning / 无逻辑含义的文本
    Text(String),
    /// Quoted text `"..."` / 引号文本
    Quoted(Box<Expr>),
    /// Identifier that may name a binding / 可能引用绑定的标识符
    Variable(String),
    /// Explicit reference `%name%` / 显式引用
    Reference(String),
    Whitespace(String),
    /// Empty slot between separators / 分隔符之间的空位
    Nil,

    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    /// Function call `name(a, b)` / 函数调用
    Call { callee: String, args: Vec<Expr> },

    /// Conditional `if(c then a else b)` / 条件表达式
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Enclosed expression such as `(...)` or `{...}` / 包围表达式
    Group {
        open: char,
        close: char,
        inner: Box<Expr>,
    },
    /// Separator-delimited items / 分隔列表
    List { separator: char, items: Vec<Expr> },
    /// Juxtaposed expressions / 并列表达式
    Sequence(Vec<Expr>),

    /// `<size>d<faces><keep>` / 掷骰表达式
    DiceRoll {
        size: u32,
        faces: u32,
        keep: DiceKeep,
    },

    /// The whole formula / 整个公式
    Root(Box<Expr>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic 算术运算
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /

    // Comparison 比较运算
    Eq, // =
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "=",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        !self.is_arithmetic()
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }

    fn precedence(&self) -> u8 {
        match self {
            BinOp::Mul | BinOp::Div => 3,
            BinOp::Add | BinOp::Sub => 2,
            _ => 1,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg, // -
}

fn format_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{value}")
    }
}

/// Print `child`, parenthesized when it binds looser than `min`.
fn operand(f: &mut fmt::Formatter<'_>, child: &Expr, min: u8) -> fmt::Result {
    if child.precedence() < min {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}

/// Renders formula text.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Number(value) => format_number(f, *value),
            ExprKind::Bool(value) => write!(f, "{value}"),
            ExprKind::Text(text) | ExprKind::Variable(text) | ExprKind::Whitespace(text) => {
                f.write_str(text)
            }
            ExprKind::Quoted(inner) => write!(f, "\"{inner}\""),
            ExprKind::Reference(name) => write!(f, "%{name}%"),
            ExprKind::Nil => Ok(()),
            ExprKind::Binary { op, left, right } => {
                let precedence = op.precedence();
                operand(f, left, precedence)?;
                write!(f, " {} ", op.as_str())?;
                // Left-associative: an equal-precedence right side needs parentheses.
                operand(f, right, precedence + 1)
            }
            ExprKind::Unary { operand: inner, .. } => {
                f.write_str("-")?;
                operand(f, inner, 4)
            }
            ExprKind::Call { callee, args } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "if({condition} then {then_branch} else {else_branch})"),
            ExprKind::Group { open, close, inner } => write!(f, "{open}{inner}{close}"),
            ExprKind::List { separator, items } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{separator}")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            ExprKind::Sequence(items) => items.iter().try_for_each(|item| write!(f, "{item}")),
            ExprKind::DiceRoll { size, faces, keep } => write!(f, "{size}d{faces}{keep}"),
            ExprKind::Root(inner) => write!(f, "{inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: f64) -> Expr {
        Expr::synthetic(ExprKind::Number(value))
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::synthetic(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[test]
    fn test_display_respects_precedence() {
        let sum = binary(BinOp::Add, number(1.0), number(2.0));
        let product = binary(BinOp::Mul, sum.clone(), number(3.0));
        assert_eq!(product.to_string(), "(1 + 2) * 3");

        let nested = binary(BinOp::Sub, number(1.0), sum);
        assert_eq!(nested.to_string(), "1 - (1 + 2)");
    }

    #[test]
    fn test_display_dice_and_numbers() {
        let dice = Expr::synthetic(ExprKind::DiceRoll {
            size: 3,
            faces: 6,
            keep: DiceKeep {
                highest: Some(2),
                ..DiceKeep::default()
            },
        });
        assert_eq!(binary(BinOp::Add, dice, number(1.5)).to_string(), "3d6kh2 + 1.5");
    }

    #[test]
    fn test_postorder_visits_children_first() {
        let sum = binary(BinOp::Add, number(1.0), number(2.0));
        let kinds: Vec<String> = sum.postorder().iter().map(|e| e.to_string()).collect();
        assert_eq!(kinds, vec!["1", "2", "1 + 2"]);
    }
}
