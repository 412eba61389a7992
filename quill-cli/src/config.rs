//! CLI configuration.
//! CLI 配置。

use quill_env::{EnvError, Environment};
use quill_eval::{InterpreterOptions, RuntimeValue};
use quill_recipe::{RecipeManager, SyntaxFeature};
use quill_scope::MasterScope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// A value bound from the configuration or the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl From<&Binding> for RuntimeValue {
    fn from(binding: &Binding) -> Self {
        match binding {
            Binding::Number(n) => RuntimeValue::Numeric(*n),
            Binding::Bool(b) => RuntimeValue::Boolean(*b),
            Binding::Text(text) => RuntimeValue::String(text.clone()),
        }
    }
}

/// Settings shared by every command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional syntax, e.g. `["percentages"]`.
    pub syntax: Vec<SyntaxFeature>,
    pub master: MasterScope,
    pub roll_dice: bool,
    pub seed: Option<u64>,
    pub bindings: BTreeMap<String, Binding>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Switch to text processing; `false` keeps the configured mode.
    pub fn with_text_processing(mut self, text: bool) -> Self {
        if text {
            self.master = MasterScope::TextProcessing;
        }
        self
    }

    /// Turn rolling on; `false` keeps the configured setting.
    pub fn with_roll_dice(mut self, roll: bool) -> Self {
        self.roll_dice |= roll;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_binding(mut self, name: impl Into<String>, value: Binding) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    pub fn recipes(&self) -> Rc<RecipeManager> {
        Rc::new(RecipeManager::with_features(&self.syntax))
    }

    pub fn interpreter_options(&self) -> InterpreterOptions {
        InterpreterOptions {
            roll_dice: self.roll_dice,
            seed: self.seed,
        }
    }

    pub fn environment(&self) -> Result<Environment<RuntimeValue>, EnvError> {
        let mut environment = Environment::new("cli");
        for (name, value) in &self.bindings {
            environment.define(name.as_str(), RuntimeValue::from(value))?;
        }
        Ok(environment)
    }
}

/// Parse `name=value`. Values read as numbers, then booleans, then text.
pub fn parse_binding(binding: &str) -> Result<(String, Binding), String> {
    let Some((name, value)) = binding.split_once('=') else {
        return Err(format!("expected NAME=VALUE, got `{binding}`"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in `{binding}`"));
    }
    Ok((name.to_string(), parse_value(value.trim())))
}

pub fn parse_value(value: &str) -> Binding {
    if let Ok(n) = value.parse::<f64>() {
        return Binding::Number(n);
    }
    match value {
        "true" => Binding::Bool(true),
        "false" => Binding::Bool(false),
        _ => Binding::Text(value.to_string()),
    }
}
