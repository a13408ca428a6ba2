//! Rebinding of the three standard stream slots.
//!
//! Every call here either succeeds or hands back an error the executor
//! treats as fatal: a half-configured stream is never left in place for a
//! caller to keep running with.

use std::os::fd::RawFd;

use nix::errno::Errno;
use nix::fcntl::{fcntl, open, FcntlArg, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};

use crate::types::{Result, ShellError};

/// Saved copies are parked at or above this number.
const SAVED_FD_FLOOR: RawFd = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
}

impl Stream {
    pub fn fd(self) -> RawFd {
        match self {
            Stream::Stdin => libc::STDIN_FILENO,
            Stream::Stdout => libc::STDOUT_FILENO,
            Stream::Stderr => libc::STDERR_FILENO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    WriteTruncate, // >
    Append,        // >>
    ReadOnly,      // <
}

impl Intent {
    fn flags(self) -> OFlag {
        match self {
            Intent::WriteTruncate => OFlag::O_WRONLY | OFlag::O_TRUNC,
            Intent::Append => OFlag::O_WRONLY | OFlag::O_APPEND,
            Intent::ReadOnly => OFlag::O_RDONLY,
        }
    }

    fn writes(self) -> bool {
        !matches!(self, Intent::ReadOnly)
    }
}

fn open_target(path: &str, intent: Intent) -> Result<RawFd> {
    let open_err = |errno| ShellError::OpenError { path: path.to_string(), errno };
    match open(path, intent.flags(), Mode::empty()) {
        Ok(fd) => Ok(fd),
        Err(Errno::ENOENT) if intent.writes() => {
            // 0644
            let mode = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH;
            open(path, intent.flags() | OFlag::O_CREAT, mode).map_err(open_err)
        }
        Err(errno) => Err(open_err(errno)),
    }
}

/// Points `stream` at `path`, opened according to `intent`.
pub fn redirect(stream: Stream, path: &str, intent: Intent) -> Result<()> {
    tracing::trace!(?stream, path, ?intent, "redirect");
    let fd = open_target(path, intent)?;
    dup2(fd, stream.fd()).map_err(ShellError::nix("dup2"))?;
    close(fd).map_err(ShellError::nix("close"))
}

/// Points `stream` back at whatever `saved` refers to and closes `saved`.
pub fn restore(stream: Stream, saved: RawFd) -> Result<()> {
    dup2(saved, stream.fd()).map_err(ShellError::nix("dup2"))?;
    close(saved).map_err(ShellError::nix("close"))
}

/// Close-on-exec duplicate of `fd`, so exec'd commands never see it.
fn save(fd: RawFd) -> Result<RawFd> {
    fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(SAVED_FD_FLOOR)).map_err(ShellError::nix("dup"))
}

/// Copies of stdin, stdout and stderr taken before a node rebinds any of
/// them.
///
/// `restore` puts them back on the normal path. If the owner returns early
/// (an error bubbling up with `?`) the drop does it instead, so the slots
/// always look the same after the node as they did before it.
#[derive(Debug)]
pub struct SavedStreams {
    fds: Option<[RawFd; 3]>,
}

impl SavedStreams {
    pub fn capture() -> Result<Self> {
        let stdin = save(Stream::Stdin.fd())?;
        let stdout = save(Stream::Stdout.fd())?;
        let stderr = save(Stream::Stderr.fd())?;
        Ok(Self { fds: Some([stdin, stdout, stderr]) })
    }

    pub fn restore(mut self) -> Result<()> {
        self.restore_all()
    }

    fn restore_all(&mut self) -> Result<()> {
        let Some([stdin, stdout, stderr]) = self.fds.take() else {
            return Ok(());
        };
        restore(Stream::Stdin, stdin)?;
        restore(Stream::Stdout, stdout)?;
        restore(Stream::Stderr, stderr)
    }
}

impl Drop for SavedStreams {
    fn drop(&mut self) {
        if let Err(err) = self.restore_all() {
            crate::utils::fatal(&err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_flags() {
        assert!(Intent::WriteTruncate.flags().contains(OFlag::O_TRUNC));
        assert!(Intent::Append.flags().contains(OFlag::O_APPEND));
        assert!(!Intent::Append.flags().contains(OFlag::O_TRUNC));
        assert_eq!(Intent::ReadOnly.flags(), OFlag::O_RDONLY);
        assert!(!Intent::ReadOnly.writes());
    }

    #[test]
    fn open_target_creates_missing_file_for_writing() {
        let _guard = crate::tests::serial();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("created");
        let path = path.to_str().unwrap();

        let fd = open_target(path, Intent::Append).unwrap();
        close(fd).unwrap();

        let meta = std::fs::metadata(path).unwrap();
        use std::os::unix::fs::PermissionsExt;
        // umask may only clear bits
        assert_eq!(meta.permissions().mode() & !0o644 & 0o777, 0);
    }

    #[test]
    fn open_target_does_not_create_for_reading() {
        let _guard = crate::tests::serial();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");

        match open_target(path.to_str().unwrap(), Intent::ReadOnly) {
            Err(ShellError::OpenError { errno, .. }) => assert_eq!(errno, Errno::ENOENT),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!path.exists());
    }
}
