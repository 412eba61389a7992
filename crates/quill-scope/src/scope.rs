//! Scope tags.

use quill_syntax::{Expr, ExprKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final classification of an expression.
/// 表达式的最终分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Logical,
    Textual,
    /// Awaiting tree context. Never survives a full pass.
    Derived,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Logical => "logical",
            Scope::Textual => "textual",
            Scope::Derived => "derived",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the whole formula is read when nothing else decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MasterScope {
    #[default]
    MathEnabled,
    TextProcessing,
}

impl MasterScope {
    pub fn scope(self) -> Scope {
        match self {
            MasterScope::MathEnabled => Scope::Logical,
            MasterScope::TextProcessing => Scope::Textual,
        }
    }
}

/// Classification from a node's kind alone.
/// 仅由节点类型得出的分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationScope {
    /// Literal whose kind fixes the scope.
    Literal { textual: bool },
    ConfirmedString,
    PossibleOperator,
    PossibleReference,
    PossibleString,
    Aggregator,
    LogicalExpression,
    Irrelevant,
    NotApplicable,
}

impl IsolationScope {
    /// Whitespace has no primary tag of its own, so its `possible-string`
    /// tag is the only one it carries.
    pub fn of(expr: &Expr) -> IsolationScope {
        match &expr.kind {
            ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::DiceRoll { .. } => {
                IsolationScope::Literal { textual: false }
            }
            ExprKind::Text(_) => IsolationScope::Literal { textual: true },
            ExprKind::Quoted(_) => IsolationScope::ConfirmedString,
            ExprKind::Variable(_) => IsolationScope::PossibleReference,
            ExprKind::Reference(_) | ExprKind::Call { .. } | ExprKind::If { .. } => {
                IsolationScope::LogicalExpression
            }
            ExprKind::Whitespace(_) => IsolationScope::PossibleString,
            ExprKind::Binary { .. } | ExprKind::Unary { .. } => IsolationScope::PossibleOperator,
            ExprKind::Group { open: '(', .. } | ExprKind::List { .. } | ExprKind::Sequence(_) => {
                IsolationScope::Aggregator
            }
            ExprKind::Group { .. } | ExprKind::Nil => IsolationScope::Irrelevant,
            ExprKind::Root(_) => IsolationScope::NotApplicable,
        }
    }

    /// Scope before any tree context is consulted.
    pub fn contextualize(self, master: MasterScope) -> Scope {
        match self {
            IsolationScope::ConfirmedString => Scope::Textual,
            IsolationScope::LogicalExpression => Scope::Logical,
            IsolationScope::Literal { textual: true } => Scope::Textual,
            IsolationScope::Literal { textual: false } => Scope::Logical,
            IsolationScope::NotApplicable => master.scope(),
            IsolationScope::PossibleOperator
            | IsolationScope::PossibleReference
            | IsolationScope::PossibleString
            | IsolationScope::Aggregator
            | IsolationScope::Irrelevant => Scope::Derived,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationScope::Literal { .. } => "literal",
            IsolationScope::ConfirmedString => "confirmed-string",
            IsolationScope::PossibleOperator => "possible-operator",
            IsolationScope::PossibleReference => "possible-reference",
            IsolationScope::PossibleString => "possible-string",
            IsolationScope::Aggregator => "aggregator",
            IsolationScope::LogicalExpression => "logical-expression",
            IsolationScope::Irrelevant => "irrelevant",
            IsolationScope::NotApplicable => "n/a",
        }
    }
}

impl fmt::Display for IsolationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both scopes of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeScope {
    pub isolation: IsolationScope,
    pub contextualized: Scope,
}
