//! Error codes for Quill diagnostics.

/// Stable codes attached to diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Tree errors (Q0001 - Q0099)
    UnbalancedEnclosure,
    StrayCloser,
    InvalidTree,

    // Parser errors (Q0100 - Q0199)
    UnexpectedToken,
    ExpectedExpression,
    MissingKeyword,

    // Scope errors (Q0200 - Q0299)
    UnresolvedScope,

    // Eval errors (Q0300 - Q0399)
    OperatorNotImplemented,
    TypeMismatch,
    UnresolvedBinding,
    DuplicateEntry,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnbalancedEnclosure => "Q0001",
            ErrorCode::StrayCloser => "Q0002",
            ErrorCode::InvalidTree => "Q0003",

            ErrorCode::UnexpectedToken => "Q0100",
            ErrorCode::ExpectedExpression => "Q0101",
            ErrorCode::MissingKeyword => "Q0102",

            ErrorCode::UnresolvedScope => "Q0200",

            ErrorCode::OperatorNotImplemented => "Q0300",
            ErrorCode::TypeMismatch => "Q0301",
            ErrorCode::UnresolvedBinding => "Q0302",
            ErrorCode::DuplicateEntry => "Q0303",
        }
    }

    /// Human-readable description of the code.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnbalancedEnclosure => "enclosure was opened but never closed",
            ErrorCode::StrayCloser => "closing character without a matching opener",
            ErrorCode::InvalidTree => "syntax tree failed structural validation",

            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::ExpectedExpression => "expected an expression",
            ErrorCode::MissingKeyword => "conditional is missing a keyword",

            ErrorCode::UnresolvedScope => "node scope could not be derived",

            ErrorCode::OperatorNotImplemented => "operator not implemented for these operands",
            ErrorCode::TypeMismatch => "mismatched value types",
            ErrorCode::UnresolvedBinding => "no value bound to this identifier",
            ErrorCode::DuplicateEntry => "identifier registered more than once",
        }
    }

    /// A short hint, when one is useful.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ErrorCode::UnbalancedEnclosure => Some("add the missing closing character"),
            ErrorCode::StrayCloser => Some("remove the closer or add the matching opener"),
            ErrorCode::MissingKeyword => Some("write conditionals as `if(cond then a else b)`"),
            ErrorCode::TypeMismatch => Some("conditions must be numbers or booleans"),
            ErrorCode::UnresolvedBinding => Some("bind the identifier with `--bind name=value`"),
            ErrorCode::DuplicateEntry => Some("each key or matcher may be registered only once"),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
