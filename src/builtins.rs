use std::env;
use std::io::{self, Write};

use nix::unistd::{chdir, getcwd};

use crate::types::{ExecStatus, ShellError};
use crate::utils::report;
use crate::word::Word;

pub const BUILTINS: [&str; 4] = ["exit", "quit", "cd", "pwd"];

pub fn is_exit(name: &str) -> bool {
    matches!(name, "exit" | "quit")
}

/// Changes the shell's own working directory. No operand is a no-op.
pub fn cd(dir: Option<&Word>) -> ExecStatus {
    let Some(dir) = dir else {
        return ExecStatus::SUCCESS;
    };
    match chdir(dir.value().as_str()) {
        Ok(()) => ExecStatus::SUCCESS,
        Err(errno) => {
            report(errno.desc());
            ExecStatus::FAILURE
        }
    }
}

pub fn pwd() -> ExecStatus {
    let cwd = match getcwd() {
        Ok(cwd) => cwd,
        Err(errno) => {
            report(errno.desc());
            return ExecStatus::FAILURE;
        }
    };
    // flushed here: the caller restores fd 1 right after
    let mut stdout = io::stdout().lock();
    match writeln!(stdout, "{}", cwd.display()).and_then(|_| stdout.flush()) {
        Ok(()) => ExecStatus::SUCCESS,
        Err(err) => {
            report(&err.to_string());
            ExecStatus::FAILURE
        }
    }
}

/// Splits `NAME=value` at the first `=`.
pub fn split_assignment(text: &str) -> Option<(&str, &str)> {
    text.split_once('=')
}

fn valid_assignment(name: &str, value: &str) -> bool {
    !name.is_empty() && !name.contains('\0') && !value.contains('\0')
}

/// Sets `NAME=value` in the process environment.
pub fn assign(verb: &Word) -> ExecStatus {
    let text = verb.value();
    match split_assignment(&text) {
        Some((name, value)) if valid_assignment(name, value) => {
            env::set_var(name, value);
            ExecStatus::SUCCESS
        }
        _ => {
            report(&ShellError::InvalidAssignment(text.clone()).to_string());
            ExecStatus::FAILURE
        }
    }
}
