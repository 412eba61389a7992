//! Diagnostic and error reporting for Quill.
//! Quill 的诊断和错误报告。
//!
//! This crate renders diagnostics using ariadne.
//! 本 crate 使用 ariadne 库渲染诊断信息。

mod codes;
mod diagnostic;

pub use codes::ErrorCode;
pub use diagnostic::{Diagnostic, DiagnosticKind, Label, Severity};

use ariadne::{ColorGenerator, Config, Label as AriadneLabel, Report, ReportKind, Source};
use std::ops::Range;

/// Render a diagnostic to stderr.
/// 将诊断信息渲染到标准错误输出。
///
/// Spans are character offsets, which is what ariadne expects.
pub fn emit(source: &str, filename: &str, diagnostic: &Diagnostic) {
    let report = build_report(filename, diagnostic, true);
    // A broken stderr is not worth failing the caller over.
    let _ = report.eprint((filename, Source::from(source)));
}

/// Render a diagnostic into a plain string (no colors).
/// 将诊断信息渲染为纯文本字符串。
pub fn render(source: &str, filename: &str, diagnostic: &Diagnostic) -> String {
    let report = build_report(filename, diagnostic, false);
    let mut buffer = Vec::new();
    if report
        .write((filename, Source::from(source)), &mut buffer)
        .is_err()
    {
        return diagnostic.message.clone();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

fn build_report<'a>(
    filename: &'a str,
    diagnostic: &Diagnostic,
    color: bool,
) -> Report<'a, (&'a str, Range<usize>)> {
    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };

    let mut colors = ColorGenerator::new();
    let mut report = Report::build(kind, filename, diagnostic.span.start.0 as usize)
        .with_config(Config::default().with_color(color))
        .with_message(&diagnostic.message);

    if let Some(code) = &diagnostic.code {
        report = report.with_code(code.as_str());
    }

    for label in &diagnostic.labels {
        let color = colors.next();
        let ariadne_label = AriadneLabel::new((filename, label.span.range()))
            .with_message(&label.message)
            .with_color(color);
        report = report.with_label(ariadne_label);
    }

    for note in &diagnostic.notes {
        report = report.with_note(note);
    }

    if let Some(help) = &diagnostic.help {
        report = report.with_help(help);
    }

    report.finish()
}
