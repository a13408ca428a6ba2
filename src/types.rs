use nix::errno::Errno;
use thiserror::Error;

/// Status a node hands back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// POSIX style exit status, 0 is success.
    Exited(i32),
    /// `exit`/`quit` was evaluated; the surrounding loop should stop.
    ShellExit,
}

impl ExecStatus {
    pub const SUCCESS: ExecStatus = ExecStatus::Exited(0);
    pub const FAILURE: ExecStatus = ExecStatus::Exited(1);

    /// Exit code used when a forked branch terminates with this status.
    pub fn code(&self) -> i32 {
        match self {
            ExecStatus::Exited(code) => *code,
            ExecStatus::ShellExit => 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{1}: {0}")]
    NixError(Errno, String),
    #[error("{path}: {errno}")]
    OpenError { path: String, errno: Errno },
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("{0}: invalid environment assignment")]
    InvalidAssignment(String),
}

impl ShellError {
    /// Adapter for `map_err` on nix calls.
    pub fn nix(context: &str) -> impl FnOnce(Errno) -> ShellError + '_ {
        move |errno| ShellError::NixError(errno, context.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
