//! Quill CLI - formula parsing and evaluation from the command line.
//! Quill CLI - 命令行中的公式解析与求值。

mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Main CLI structure.
/// 主 CLI 结构体。
#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about = "Quill - formulas that mix text, math and dice", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file. / JSON 配置文件。
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output. / 启用详细输出。
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output. / 抑制输出。
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Available CLI commands.
/// 可用的 CLI 命令。
#[derive(Subcommand)]
enum Commands {
    /// Show the syntax tree of a formula. / 显示公式的语法树。
    Parse {
        /// The formula. / 公式。
        expr: String,

        /// Print the tree as JSON. / 以 JSON 输出语法树。
        #[arg(long)]
        json: bool,
    },

    /// Show the scope of every expression. / 显示每个表达式的作用域。
    Scope {
        /// The formula. / 公式。
        expr: String,

        /// Read the formula as text. / 以文本方式读取公式。
        #[arg(long)]
        text: bool,
    },

    /// Evaluate a formula. / 求值公式。
    Eval {
        /// The formula. / 公式。
        expr: String,

        /// Roll dice. / 掷骰。
        #[arg(long)]
        roll: bool,

        /// Seed for dice rolls. / 掷骰种子。
        #[arg(long)]
        seed: Option<u64>,

        /// Read the formula as text. / 以文本方式读取公式。
        #[arg(long)]
        text: bool,

        /// Bind a name, e.g. `--bind st=12`. / 绑定名称。
        #[arg(short, long = "bind", value_name = "NAME=VALUE")]
        bindings: Vec<String>,
    },

    /// Start an interactive REPL. / 启动交互式 REPL。
    Repl,
}

/// Main entry point.
/// 主入口点。
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Parse { expr, json } => commands::parse::run(&expr, json, &config),
        Commands::Scope { expr, text } => {
            commands::scope::run(&expr, &config.with_text_processing(text))
        }
        Commands::Eval {
            expr,
            roll,
            seed,
            text,
            bindings,
        } => {
            let mut config = config.with_text_processing(text).with_roll_dice(roll);
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            for binding in &bindings {
                let (name, value) = config::parse_binding(binding)?;
                config = config.with_binding(name, value);
            }
            commands::eval::run(&expr, &config)
        }
        Commands::Repl => commands::repl::run(config),
    });

    if let Err(e) = result {
        if !cli.quiet {
            output::error(&e);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config, String> {
    match path {
        Some(path) => Config::load(path).map_err(|e| e.to_string()),
        None => Ok(Config::default()),
    }
}

/// `RUST_LOG` wins; `--verbose` raises the default level to debug.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
