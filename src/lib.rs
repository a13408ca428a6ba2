//! Executor for an already-parsed shell command tree.
//!
//! Simple commands become processes (or run in-process as built-ins),
//! operator nodes map onto `fork`, `waitpid`, kernel pipes and descriptor
//! rebinding. A small lexer and parser are included so the binary can turn
//! a typed line into a tree.

pub mod ast;
pub mod builtins;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod redirect;
pub mod types;
pub mod utils;
pub mod word;

pub use ast::{CommandNode, IoMode, SimpleCommand};
pub use executor::{execute, try_execute};
pub use parser::parse_line;
pub use types::{ExecStatus, Result, ShellError};
pub use word::Word;

#[cfg(test)]
mod tests;
