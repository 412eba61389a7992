//! Diagnostic types and builders.

use crate::ErrorCode;
use quill_common::Span;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Tree,
    Lexer,
    Parser,
    Scope,
    Eval,
}

/// A labeled span within a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A diagnostic message with optional labels, notes, and help.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub code: Option<ErrorCode>,
    pub message: String,
    pub span: Span,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        kind: DiagnosticKind,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            code: None,
            message: message.into(),
            span,
            labels: vec![],
            notes: vec![],
            help: None,
        }
    }

    pub fn error(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, kind, span, message)
    }

    pub fn warning(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, kind, span, message)
    }

    pub fn note(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Note, kind, span, message)
    }

    /// Attach a code; its suggestion becomes the help text unless one is already set.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        if self.help.is_none() {
            self.help = code.suggestion().map(str::to_string);
        }
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_supplies_default_help() {
        let diag = Diagnostic::warning(DiagnosticKind::Tree, Span::from_usize(0, 1), "unbalanced")
            .with_code(ErrorCode::UnbalancedEnclosure);
        assert_eq!(diag.help.as_deref(), Some("add the missing closing character"));
        assert!(!diag.is_error());
    }

    #[test]
    fn test_explicit_help_wins() {
        let diag = Diagnostic::error(DiagnosticKind::Eval, Span::DUMMY, "boom")
            .with_help("custom")
            .with_code(ErrorCode::TypeMismatch);
        assert_eq!(diag.help.as_deref(), Some("custom"));
    }
}
