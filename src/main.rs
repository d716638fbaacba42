//! The Lak programming language interpreter.
//!
//! This is the main entry point for the `lak` CLI. It tokenizes, parses,
//! optimizes and tree-walk interprets `.lak` source directly, rather than
//! compiling to a native executable.
//!
//! # Usage
//!
//! ```text
//! lak run <file.lak>
//! lak build <file.lak> [-o out.laki]
//! lak exec <file.laki>
//! ```
//!
//! # Error Reporting
//!
//! The interpreter uses [ariadne](https://docs.rs/ariadne) for colorful
//! error messages that show the exact location of problems in the source
//! code, for every [`lak::error::LakError`] variant that carries a span.

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use lak::error::LakError;
use std::path::PathBuf;
use std::process::ExitCode;

/// Command-line interface for the Lak interpreter.
#[derive(Parser)]
#[command(name = "lak")]
#[command(about = "The Lak programming language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize, parse, optimize and evaluate a source file.
    Run {
        /// The source file to run (e.g., `hello.lak`).
        file: PathBuf,
    },
    /// Parse a source file and write its compiled AST as `.laki`.
    Build {
        /// The source file to compile.
        file: PathBuf,
        /// Output path, defaulting to the source path with a `.laki` extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a previously compiled `.laki` file.
    Exec {
        /// The compiled AST file to evaluate.
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run { file } => run(file),
        Commands::Build { file, output } => build(file, output.as_deref()),
        Commands::Exec { file } => exec(file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err((filename, source, error)) => {
            report_error(&filename, &source, &error);
            ExitCode::FAILURE
        }
    }
}

type CliResult = Result<(), (String, String, LakError)>;

fn run(file: &PathBuf) -> CliResult {
    let source = read_source(file)?;
    match lak::run(&source) {
        Ok(_) => Ok(()),
        Err(e) => Err((display_path(file), source, e)),
    }
}

fn build(file: &PathBuf, output: Option<&std::path::Path>) -> CliResult {
    let source = read_source(file)?;
    match lak::compile(file, output) {
        Ok(()) => Ok(()),
        Err(e) => Err((display_path(file), source, e)),
    }
}

fn exec(file: &PathBuf) -> CliResult {
    match lak::interpret_from_file(file) {
        Ok(_) => Ok(()),
        Err(e) => Err((display_path(file), String::new(), e)),
    }
}

fn read_source(file: &PathBuf) -> Result<String, (String, String, LakError)> {
    std::fs::read_to_string(file).map_err(|e| {
        (
            display_path(file),
            String::new(),
            LakError::syntax(format!("Failed to read file: {e}")),
        )
    })
}

fn display_path(path: &std::path::Path) -> String {
    path.display().to_string()
}

/// Renders a [`LakError`] with [ariadne](https://docs.rs/ariadne), falling
/// back to a plain message when the error carries no span (e.g. file I/O
/// failures raised before lexing begins).
fn report_error(filename: &str, source: &str, error: &LakError) {
    match error.span() {
        Some(span) => {
            let message = error.to_string();
            Report::build(ReportKind::Error, (filename, span.start..span.end))
                .with_message(&message)
                .with_label(
                    Label::new((filename, span.start..span.end))
                        .with_message(&message)
                        .with_color(Color::Red),
                )
                .finish()
                .eprint((filename, Source::from(source)))
                .ok();
        }
        None => eprintln!("Error: {error}"),
    }
}
