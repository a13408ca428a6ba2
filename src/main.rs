//! forksh entry point.
//!
//! Usage:
//!   forksh              # Interactive REPL
//!   forksh -c <line>    # Run one line and exit with its status

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use forksh::builtins::BUILTINS;
use forksh::{execute, parse_line, ExecStatus};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => repl(),
        Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        Some("--version" | "-V") => {
            println!("forksh {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        Some("-c") => {
            let line = args.get(2).context("-c requires a command argument")?;
            let status = run_line(line).unwrap_or(ExecStatus::FAILURE);
            Ok(ExitCode::from(status.code() as u8))
        }
        Some(other) => anyhow::bail!("unknown argument: {other}"),
    }
}

/// Parses and executes one line. `None` for a blank line or a syntax error.
fn run_line(line: &str) -> Option<ExecStatus> {
    match parse_line(line) {
        Ok(Some(node)) => Some(execute(&node)),
        Ok(None) => None,
        Err(e) => {
            eprintln!("forksh: {e}");
            None
        }
    }
}

fn repl() -> Result<ExitCode> {
    // the shell survives Ctrl-C; exec'd children get the default action back
    ctrlc::set_handler(|| {}).context("installing SIGINT handler")?;

    let mut rl = DefaultEditor::new().map_err(|e| anyhow::anyhow!("initializing line editor: {e}"))?;
    let mut last = ExecStatus::SUCCESS;

    loop {
        match rl.readline("$ ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                match run_line(&line) {
                    Some(ExecStatus::ShellExit) => break,
                    Some(status) => last = status,
                    None => {}
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => anyhow::bail!("reading input: {e}"),
        }
    }

    Ok(ExitCode::from(last.code() as u8))
}

fn print_help() {
    println!("forksh - a small fork/exec shell");
    println!();
    println!("Usage:");
    println!("  forksh              interactive prompt");
    println!("  forksh -c <line>    run one line");
    println!();
    println!("Operators: ;  &  |  &&  ||   Redirections: <  >  >>  2>  2>>  &>");
    println!("Built-ins: {}, NAME=value", BUILTINS.join(", "));
    println!();
    println!("Set RUST_LOG=forksh=debug to trace evaluation on stderr.");
}
