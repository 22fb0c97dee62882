//! jsty - type inference for a JavaScript-shaped language.
//!
//! The CLI is a thin wrapper over the analyzer: it reads a JSON AST dump
//! (produced by an external parser), runs the analysis, and renders the
//! result. Exit code 0 means no diagnostics; any diagnostic exits 1.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use jsty_ast::Program;
use jsty_checker::{Analysis, analyze};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod report;

#[derive(Parser)]
#[command(name = "jsty", version, about = "Flow-sensitive type inference for JavaScript")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a JSON AST dump and report inferred types and diagnostics.
    Check {
        /// Path to the AST file (`-` for stdin).
        file: PathBuf,
        /// Original source file, for line/column resolution in output.
        #[arg(long)]
        source: Option<PathBuf>,
        /// Output shape.
        #[arg(long, value_enum, default_value_t = Format::Report)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable report with colors.
    Report,
    /// The full analysis as JSON.
    Json,
    /// One `name: type` line per annotation.
    Types,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the analysis was diagnostic-free.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            file,
            source,
            format,
        } => {
            let program = read_program(&file)?;
            let source_text = match &source {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading source {}", path.display()))?,
                None => String::new(),
            };
            let analysis = analyze(&program, &source_text);
            render(&analysis, format)?;
            Ok(analysis.errors.is_empty())
        }
    }
}

fn read_program(path: &Path) -> Result<Program> {
    let text = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading AST {}", path.display()))?
    };
    serde_json::from_str(&text).context("parsing AST JSON")
}

fn render(analysis: &Analysis, format: Format) -> Result<()> {
    match format {
        Format::Report => report::print_report(analysis),
        Format::Json => {
            let json = serde_json::to_string_pretty(analysis)?;
            println!("{json}");
        }
        Format::Types => {
            for annotation in &analysis.annotations {
                let name = annotation.name.as_deref().unwrap_or("<expr>");
                println!("{name}: {}", annotation.type_string);
            }
        }
    }
    Ok(())
}
