//! The `quill repl` command.

use super::eval::{describe, print_result};
use crate::config::Config;
use crate::output;
use quill_env::{Environment, SourcedValue};
use quill_eval::{Interpreter, RuntimeEvaluation, RuntimeValue};
use quill_scope::MasterScope;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

const HELP: &str = "\
Commands:
  :help, :h             Show this help
  :quit, :q             Exit the REPL
  :env                  Show current bindings
  :let NAME = FORMULA   Bind the value of a formula
  :roll on|off          Roll dice or keep them symbolic
  :mode math|text       Read formulas as math or as text";

pub fn run(config: Config) -> Result<(), String> {
    println!("Quill REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit");
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| e.to_string())?;
    let mut repl = Repl::new(config)?;

    loop {
        match rl.readline("quill> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let step = if line.starts_with(':') {
                    repl.command(line)
                } else {
                    repl.evaluate(line).map(|result| {
                        print_result(&result);
                        Step::Continue
                    })
                };
                match step {
                    Ok(Step::Continue) => {}
                    Ok(Step::Quit) => break,
                    Err(e) => output::error(&e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                output::error(&err.to_string());
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
}

/// Session state kept between lines.
struct Repl {
    config: Config,
    environment: Environment<RuntimeValue>,
    interpreter: Interpreter,
}

impl Repl {
    fn new(config: Config) -> Result<Self, String> {
        let environment = config.environment().map_err(|e| e.to_string())?;
        let interpreter = Interpreter::new(config.interpreter_options());
        Ok(Self {
            config,
            environment,
            interpreter,
        })
    }

    fn evaluate(&mut self, formula: &str) -> Result<RuntimeEvaluation, String> {
        let evaluated = quill_eval::evaluate_source(
            formula,
            self.config.recipes(),
            self.config.master,
            &mut self.interpreter,
            &self.environment,
        )
        .map_err(|e| describe(formula, &e))?;
        output::diagnostics(formula, &evaluated.parsed.diagnostics);
        Ok(evaluated.result)
    }

    fn command(&mut self, line: &str) -> Result<Step, String> {
        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match name {
            ":quit" | ":q" => return Ok(Step::Quit),
            ":help" | ":h" => println!("{HELP}"),
            ":env" => {
                for name in self.environment.names() {
                    let value = self.environment.get(&name).map_err(|e| e.to_string())?;
                    match value {
                        Some(value) => println!("  {name} = {value:?}"),
                        None => println!("  {name}"),
                    }
                }
            }
            ":let" => {
                let value = self.bind(rest)?;
                output::info(&format!("{value}"));
            }
            ":roll" => {
                let roll = switch(rest, "on", "off")?;
                self.config.roll_dice = roll;
                self.interpreter.set_roll_dice(roll);
            }
            ":mode" => {
                self.config.master = if switch(rest, "math", "text")? {
                    MasterScope::MathEnabled
                } else {
                    MasterScope::TextProcessing
                };
            }
            _ => return Err(format!("unknown command: {name}")),
        }
        Ok(Step::Continue)
    }

    /// `NAME = FORMULA`. Only ready values can be bound.
    fn bind(&mut self, binding: &str) -> Result<RuntimeValue, String> {
        let Some((name, formula)) = binding.split_once('=') else {
            return Err("usage: :let NAME = FORMULA".to_string());
        };
        let name = name.trim();
        if name.is_empty() {
            return Err("usage: :let NAME = FORMULA".to_string());
        }
        let result = self.evaluate(formula.trim())?;
        let value = match result.value {
            Some(value) if result.is_ready() => value,
            _ => return Err(format!("`{}` has no value yet", result.node)),
        };
        self.environment.set(name, SourcedValue::Simple(value.clone()));
        Ok(value)
    }
}

fn switch(arg: &str, yes: &str, no: &str) -> Result<bool, String> {
    if arg == yes {
        Ok(true)
    } else if arg == no {
        Ok(false)
    } else {
        Err(format!("expected `{yes}` or `{no}`, got `{arg}`"))
    }
}
