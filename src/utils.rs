use std::io::{self, Write};

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

use crate::types::{Result, ShellError};

/// Reports an unrecoverable OS failure and terminates the process.
pub fn fatal(err: &ShellError) -> ! {
    tracing::error!(error = %err, "fatal");
    report(&err.to_string());
    std::process::exit(1);
}

/// Writes a diagnostic line to descriptor 2, wherever it currently points.
///
/// Goes through `io::stderr()` rather than `eprintln!` so the text follows
/// redirections of fd 2 and is not swallowed by output capture.
pub fn report(msg: &str) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{}", msg);
    let _ = stderr.flush();
}

/// Maps a wait status to the shell's integer convention.
pub fn exit_code(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
        _ => 1,
    }
}

/// Blocks until `pid` terminates and returns its translated exit code.
pub fn wait_child(pid: Pid) -> Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                return Ok(exit_code(status))
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ShellError::NixError(errno, "waitpid".to_string())),
        }
    }
}
