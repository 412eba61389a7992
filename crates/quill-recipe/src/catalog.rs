//! Built-in recipes.
//! 内置配方。

use crate::{Recipe, RecipeKind};

pub const ROOT: &str = "root";
pub const STRING: &str = "string";
pub const NIL: &str = "nil";
pub const LIST: &str = "list";
pub const FUNCTION: &str = "function";

pub fn imaginary() -> Recipe {
    Recipe::enclosure("imaginary", "ι", '⟨', '⟩')
}

pub fn parenthesis() -> Recipe {
    Recipe::enclosure("parenthesis", "ρ", '(', ')')
}

pub fn braces() -> Recipe {
    Recipe::enclosure("braces", "γ", '{', '}')
}

pub fn brackets() -> Recipe {
    Recipe::enclosure("brackets", "β", '[', ']')
}

pub fn quotes() -> Recipe {
    Recipe::enclosure("quotes", "κ", '"', '"')
}

pub fn percentage() -> Recipe {
    Recipe::enclosure("percentage", "τ", '%', '%')
}

pub fn comma() -> Recipe {
    Recipe::separator("comma", "C", ',').with_priority(2)
}

pub fn colon() -> Recipe {
    Recipe::separator("colon", "N", ':').with_priority(3)
}

pub fn pipe() -> Recipe {
    Recipe::separator("pipe", "P", '|').with_priority(4)
}

pub fn string() -> Recipe {
    Recipe::primitive(STRING, "x")
}

pub fn nil() -> Recipe {
    Recipe::primitive(NIL, "∅")
}

pub fn list() -> Recipe {
    Recipe::primitive(LIST, "L")
}

pub fn root() -> Recipe {
    Recipe::primitive(ROOT, "r")
}

/// Function calls: a callee word immediately followed by a parenthesis.
pub fn function() -> Recipe {
    Recipe::new(
        FUNCTION,
        "f",
        RecipeKind::Aggregator {
            keys: vec!["callee".to_string(), "arguments".to_string()],
            target: "parenthesis".to_string(),
            recognize: is_callee,
        },
    )
}

/// Baseline pattern recipe. It has no patterns; specialize it with
/// [`Recipe::variant`] and [`Recipe::with_patterns`].
pub fn reserved() -> Recipe {
    Recipe::new("reserved", "#", RecipeKind::Pattern { patterns: vec![] })
}

/// Connectives that read as words but never name a function.
const NOT_CALLEES: [&str; 4] = ["then", "else", "and", "or"];

/// `@?[A-Za-z_][A-Za-z0-9_]*`, excluding connectives.
pub fn is_callee(word: &str) -> bool {
    let bare = word.strip_prefix('@').unwrap_or(word);
    let mut chars = bare.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return false;
    }
    !NOT_CALLEES.contains(&bare.to_ascii_lowercase().as_str())
}
