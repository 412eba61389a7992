//! Output formatting utilities.
//! 输出格式化工具。

use quill_diagnostic::{Diagnostic, emit};

/// Print a success message in green.
/// 以绿色打印成功消息。
pub fn success(msg: &str) {
    println!("\x1b[32m{msg}\x1b[0m");
}

/// Print a pending (unresolved) result in yellow.
/// 以黄色打印未解析的结果。
pub fn pending(msg: &str) {
    println!("\x1b[33m{msg}\x1b[0m");
}

/// Print an error message in red.
/// 以红色打印错误消息。
pub fn error(msg: &str) {
    eprintln!("\x1b[31merror:\x1b[0m {msg}");
}

/// Print an info message in blue.
/// 以蓝色打印信息消息。
pub fn info(msg: &str) {
    println!("\x1b[34minfo:\x1b[0m {msg}");
}

/// Render diagnostics against the formula.
pub fn diagnostics(source: &str, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        emit(source, "<formula>", diagnostic);
    }
}
