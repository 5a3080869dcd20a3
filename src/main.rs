// B-Minor CLI entry point

use anyhow::Context;
use bminor::config::DEFAULT_MAX_CALL_DEPTH;
use bminor::{
    compile, parse_source, tokenize, Config, Diagnostic, Diagnostics, ErrorFormatter, Execution,
    Interpreter,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bminor")]
#[command(about = "B-Minor front-end and interpreter", long_about = None)]
struct Cli {
    /// Report diagnostics as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a source file
    Scan {
        /// Input source file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Parse a source file and print its syntax tree as JSON
    Parse {
        /// Input source file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Parse and semantically check a source file
    Check {
        /// Input source file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Check and execute a source file
    Run {
        /// Input source file
        #[arg(short, long)]
        input: PathBuf,
        /// Deepest allowed nesting of function calls
        #[arg(long, env = "BMINOR_MAX_DEPTH", default_value_t = DEFAULT_MAX_CALL_DEPTH)]
        max_depth: usize,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Scan { input } => scan(&input, cli.json)?,
        Commands::Parse { input } => parse(&input, cli.json)?,
        Commands::Check { input } => check(&input, cli.json)?,
        Commands::Run { input, max_depth } => {
            let config = Config::default().with_max_call_depth(max_depth);
            run(&input, config, cli.json)?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn read_source(input: &Path) -> anyhow::Result<String> {
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

/// Print diagnostics and tell whether there were none
fn report(source: &str, diagnostics: &Diagnostics, json: bool) -> anyhow::Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(diagnostics)?);
    } else {
        eprint!("{}", ErrorFormatter::new(source).format_all(diagnostics));
    }
    Ok(!diagnostics.has_errors())
}

fn scan(input: &Path, json: bool) -> anyhow::Result<bool> {
    let source = read_source(input)?;
    let mut diagnostics = Diagnostics::new();
    match tokenize(&source) {
        Ok(tokens) => {
            for spanned in &tokens {
                println!("{:>4}  {}", spanned.line, spanned.token);
            }
        }
        Err(err) => diagnostics.push(Diagnostic::from(&err)),
    }
    report(&source, &diagnostics, json)
}

fn parse(input: &Path, json: bool) -> anyhow::Result<bool> {
    let source = read_source(input)?;
    let mut diagnostics = Diagnostics::new();
    match parse_source(&source) {
        Ok(program) => println!("{}", serde_json::to_string_pretty(&program)?),
        Err(err) => diagnostics.push(Diagnostic::from(&err)),
    }
    report(&source, &diagnostics, json)
}

fn check(input: &Path, json: bool) -> anyhow::Result<bool> {
    let source = read_source(input)?;
    let mut diagnostics = Diagnostics::new();
    compile(&source, &mut diagnostics);
    let ok = report(&source, &diagnostics, json)?;
    if ok && !json {
        println!("{}: no errors", input.display());
    }
    Ok(ok)
}

fn run(input: &Path, config: Config, json: bool) -> anyhow::Result<bool> {
    let source = read_source(input)?;
    let mut diagnostics = Diagnostics::new();
    let Some(program) = compile(&source, &mut diagnostics) else {
        return report(&source, &diagnostics, json);
    };

    let stdout = io::stdout();
    let stdin = io::stdin();
    let mut interpreter = Interpreter::with_config(config, stdout.lock(), stdin.lock());
    match interpreter.interpret(&program, &mut diagnostics) {
        Execution::Completed(Some(value)) => log::info!("main returned {}", value),
        Execution::Completed(None) => log::info!("program finished"),
        Execution::Skipped | Execution::Failed => {}
    }
    drop(interpreter);

    report(&source, &diagnostics, json)
}
