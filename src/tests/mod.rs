//! Tests that run real processes and rebind the descriptors of the test
//! process itself. Everything touching fds 0/1/2, the cwd or the environment
//! holds [`serial`] so tests do not trample each other.

use std::fs;
use std::os::fd::RawFd;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use nix::sys::stat::fstat;

use crate::ast::{CommandNode, SimpleCommand};

mod parser_tests;

static SERIAL: Mutex<()> = Mutex::new(());

pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

/// `sh -c <script>` as a leaf.
pub fn sh(script: &str) -> SimpleCommand {
    SimpleCommand::new("sh").arg("-c").arg(script)
}

pub fn leaf(verb: &str, args: &[&str]) -> CommandNode {
    SimpleCommand::new(verb).args(args.iter().copied()).into()
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Device and inode behind each standard descriptor.
pub fn stream_identity() -> [(u64, u64); 3] {
    let id = |fd: RawFd| {
        let st = fstat(fd).unwrap();
        (st.st_dev as u64, st.st_ino as u64)
    };
    [id(0), id(1), id(2)]
}

pub fn open_fd_count() -> usize {
    fs::read_dir("/proc/self/fd").unwrap().count()
}
