use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::RawFd;

use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{close, dup2, execvp, fork, pipe, ForkResult, Pid};

use crate::ast::{CommandNode, IoMode, SimpleCommand};
use crate::builtins;
use crate::redirect::{redirect, Intent, SavedStreams, Stream};
use crate::types::{ExecStatus, Result, ShellError};
use crate::utils::{fatal, report, wait_child};

/// Where a node sits relative to an enclosing pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Standalone,
    /// Right-hand side of a pipe: an external command here is not waited
    /// for, the pipe node does that.
    PipeStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Finished(ExecStatus),
    Spawned(Pid),
}

/// Runs `node` to completion. OS-level failures end the process.
pub fn execute(node: &CommandNode) -> ExecStatus {
    try_execute(node).unwrap_or_else(|err| fatal(&err))
}

/// Runs `node`, handing OS-level failures back instead of exiting.
pub fn try_execute(node: &CommandNode) -> Result<ExecStatus> {
    match evaluate(node, Role::Standalone)? {
        Outcome::Finished(status) => Ok(status),
        Outcome::Spawned(pid) => Ok(ExecStatus::Exited(wait_child(pid)?)),
    }
}

fn evaluate(node: &CommandNode, role: Role) -> Result<Outcome> {
    tracing::debug!(kind = node.kind(), ?role, "evaluate");

    let status = match node {
        CommandNode::Simple(cmd) => return evaluate_simple(cmd, role),
        CommandNode::Sequential { left, right } => {
            if run(left)? == ExecStatus::ShellExit {
                return Ok(Outcome::Finished(ExecStatus::ShellExit));
            }
            run(right)?
        }
        CommandNode::Parallel { left, right } => {
            let first = spawn(left)?;
            let second = spawn(right).inspect_err(|_| reap(first))?;
            let waited = wait_child(first);
            wait_child(second)?;
            waited?;
            // the branches' own statuses are not aggregated
            ExecStatus::SUCCESS
        }
        CommandNode::IfFailed { left, right } => match run(left)? {
            ExecStatus::Exited(code) if code != 0 => run(right)?,
            status => status,
        },
        CommandNode::IfSucceeded { left, right } => match run(left)? {
            ExecStatus::Exited(0) => run(right)?,
            status => status,
        },
        CommandNode::Pipe { left, right } => evaluate_pipe(left, right)?,
        CommandNode::Dummy => ExecStatus::SUCCESS,
    };
    Ok(Outcome::Finished(status))
}

/// Evaluates a child node that is not a pipe stage.
fn run(node: &CommandNode) -> Result<ExecStatus> {
    try_execute(node)
}

fn evaluate_pipe(left: &CommandNode, right: &CommandNode) -> Result<ExecStatus> {
    let saved = SavedStreams::capture()?;
    let (read_end, write_end) = pipe().map_err(ShellError::nix("pipe"))?;

    let writer = fork_with(|| {
        dup2(write_end, Stream::Stdout.fd()).map_err(ShellError::nix("dup2"))?;
        close_pipe(read_end, write_end)?;
        run(left)
    })
    .inspect_err(|_| {
        let _ = close_pipe(read_end, write_end);
    })?;

    let bound = dup2(read_end, Stream::Stdin.fd()).map(drop).map_err(ShellError::nix("dup2"));
    let outcome = bound
        .and(close_pipe(read_end, write_end))
        .and_then(|()| evaluate(right, Role::PipeStage));
    // Drop our copy of the read end before waiting: a writer that outlives
    // its reader only stops once no read end is left open anywhere.
    let restored = saved.restore();

    let outcome = match (outcome, restored) {
        (Ok(outcome), Ok(())) => outcome,
        (Ok(outcome), Err(err)) => {
            reap(writer);
            reap_outcome(outcome);
            return Err(err);
        }
        (Err(err), _) => {
            reap(writer);
            return Err(err);
        }
    };

    let waited = wait_child(writer);
    let status = match outcome {
        Outcome::Finished(status) => status,
        Outcome::Spawned(pid) => ExecStatus::Exited(wait_child(pid)?),
    };
    waited?;
    Ok(status)
}

/// Waits for a child whose status no longer matters because an error is
/// already on its way up.
fn reap(pid: Pid) {
    let _ = wait_child(pid);
}

fn reap_outcome(outcome: Outcome) {
    if let Outcome::Spawned(pid) = outcome {
        reap(pid);
    }
}

fn close_pipe(read_end: RawFd, write_end: RawFd) -> Result<()> {
    close(read_end).map_err(ShellError::nix("close"))?;
    close(write_end).map_err(ShellError::nix("close"))
}

/// Forks a child that evaluates `node` and exits with its status.
fn spawn(node: &CommandNode) -> Result<Pid> {
    fork_with(|| run(node))
}

/// Forks; the child runs `body` and exits with the resulting status, the
/// parent gets the child's pid.
fn fork_with<F>(body: F) -> Result<Pid>
where
    F: FnOnce() -> Result<ExecStatus>,
{
    // anything still buffered would otherwise be written twice
    io::stdout().flush()?;

    // SAFETY: the child only runs shell evaluation and then exits or execs.
    match unsafe { fork() }.map_err(ShellError::nix("fork"))? {
        ForkResult::Parent { child } => {
            tracing::trace!(%child, "forked");
            Ok(child)
        }
        ForkResult::Child => {
            let status = body().unwrap_or_else(|err| fatal(&err));
            std::process::exit(status.code());
        }
    }
}

fn evaluate_simple(cmd: &SimpleCommand, role: Role) -> Result<Outcome> {
    let saved = SavedStreams::capture()?;
    let outcome = run_simple(cmd, role)?;
    if let Err(err) = saved.restore() {
        reap_outcome(outcome);
        return Err(err);
    }
    Ok(outcome)
}

fn run_simple(cmd: &SimpleCommand, role: Role) -> Result<Outcome> {
    let verb = cmd.verb.value();

    if builtins::is_exit(&verb) {
        return Ok(Outcome::Finished(ExecStatus::ShellExit));
    }

    apply_output_redirections(cmd)?;

    let status = match verb.as_str() {
        "cd" => builtins::cd(cmd.params.first()),
        "pwd" => builtins::pwd(),
        _ if cmd.verb.is_assignment() => builtins::assign(&cmd.verb),
        _ => return spawn_external(cmd, role),
    };
    Ok(Outcome::Finished(status))
}

fn apply_output_redirections(cmd: &SimpleCommand) -> Result<()> {
    let output = cmd.output.as_ref().map(|w| w.value());
    let error = cmd.error.as_ref().map(|w| w.value());
    let out = |intent| match &output {
        Some(path) => redirect(Stream::Stdout, path, intent),
        None => Ok(()),
    };
    let err = |intent| match &error {
        Some(path) => redirect(Stream::Stderr, path, intent),
        None => Ok(()),
    };

    match cmd.io {
        IoMode::BothAppend => {
            out(Intent::Append)?;
            err(Intent::Append)?;
        }
        IoMode::ErrAppend => {
            out(Intent::WriteTruncate)?;
            err(Intent::Append)?;
        }
        IoMode::OutAppend => {
            err(Intent::WriteTruncate)?;
            out(Intent::Append)?;
        }
        IoMode::Overwrite => {
            if output.is_some() && output == error {
                // truncate once, then let both streams append to the same file
                out(Intent::WriteTruncate)?;
                out(Intent::Append)?;
                err(Intent::Append)?;
            } else {
                out(Intent::WriteTruncate)?;
                err(Intent::WriteTruncate)?;
            }
        }
    }
    Ok(())
}

fn spawn_external(cmd: &SimpleCommand, role: Role) -> Result<Outcome> {
    let pid = fork_with(|| exec_child(cmd))?;
    match role {
        Role::PipeStage => Ok(Outcome::Spawned(pid)),
        Role::Standalone => Ok(Outcome::Finished(ExecStatus::Exited(wait_child(pid)?))),
    }
}

/// Child side of an external command. Only returns if `execvp` failed.
fn exec_child(cmd: &SimpleCommand) -> Result<ExecStatus> {
    // SAFETY: restoring the default disposition before exec.
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) }.map_err(ShellError::nix("signal"))?;

    if let Some(input) = &cmd.input {
        redirect(Stream::Stdin, &input.value(), Intent::ReadOnly)?;
    }

    let argv = cmd.argv();
    let Ok(c_argv) = argv
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect::<std::result::Result<Vec<_>, _>>()
    else {
        report(&format!("{}: argument contains a NUL byte", argv[0]));
        return Ok(ExecStatus::FAILURE);
    };

    match execvp(&c_argv[0], &c_argv) {
        Err(Errno::ENOENT) => {
            report(&format!("{}: command not found", argv[0]));
            Ok(ExecStatus::Exited(127))
        }
        Err(errno) => {
            tracing::debug!(command = %argv[0], %errno, "exec failed");
            Ok(ExecStatus::FAILURE)
        }
        Ok(never) => match never {},
    }
}

