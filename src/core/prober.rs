//! Isolated mount prober.
//!
//! A `stat` on a dead network mount can sit in uninterruptible sleep forever,
//! so the check runs in a forked child that reports over a pipe. The parent
//! waits on the pipe with `poll` and SIGKILLs the child once the deadline
//! passes. Every path closes both pipe ends and reaps the child.

use crate::config::types::{MountCheckError, Result};
use crate::core::types::{ChildExit, ProbeOutcome, ProbeReport};
use crate::mounts::table::MountDescriptor;
use log::{debug, warn};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, pipe2, ForkResult, Pid};
use std::ffi::{CStr, CString};
use std::io::Write;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Upper bound on the child's message; the child writes far less than this.
const MAX_MESSAGE_BYTES: usize = 4096;

/// Held from `pipe2` until the parent has closed its write end, so a child
/// forked by a concurrent probe never inherits another probe's write end.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Metadata check run inside the probe child.
///
/// Runs after `fork()` in a possibly multi-threaded parent, so it must not
/// allocate or take locks.
pub type MetadataCheck = fn(&CStr) -> nix::Result<()>;

/// Default check: `stat(2)` on the mountpoint
pub fn stat_check(path: &CStr) -> nix::Result<()> {
    nix::sys::stat::stat(path).map(|_| ())
}

fn to_process_error(prefix: &str, err: impl std::fmt::Display) -> MountCheckError {
    MountCheckError::Process(format!("{prefix}: {err}"))
}

/// Anything that can classify a mount's liveness within a timeout
pub trait MountProber {
    fn probe_mount(&self, mount: &MountDescriptor, timeout: Duration) -> Result<ProbeOutcome>;
}

/// Process-per-probe prober
#[derive(Clone, Copy, Debug)]
pub struct IsolatedProber {
    check: MetadataCheck,
}

impl Default for IsolatedProber {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolatedProber {
    pub fn new() -> Self {
        Self { check: stat_check }
    }

    /// Use a different metadata check in the child
    pub fn with_check(check: MetadataCheck) -> Self {
        Self { check }
    }

    /// Probe `path` in a child process, waiting at most `timeout` for its answer.
    ///
    /// Errors are returned only when no child could be started (pipe or fork
    /// failure, NUL byte in the path). Once a child exists the call always
    /// returns a report with the child reaped.
    ///
    /// Safe to call from several threads: child creation is serialized so the
    /// pipe's write end is only ever held by its own child.
    pub fn probe(&self, path: impl AsRef<Path>, timeout: Duration) -> Result<ProbeReport> {
        let path = path.as_ref();
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            MountCheckError::Process(format!("path contains NUL byte: {}", path.display()))
        })?;

        let (started, child, read_end) = {
            let _spawn = SPAWN_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

            let (read_raw, write_raw) =
                pipe2(OFlag::O_CLOEXEC).map_err(|e| to_process_error("pipe(probe)", e))?;
            // SAFETY: both descriptors were just returned by pipe2 and are owned by nobody else.
            let read_end = unsafe { OwnedFd::from_raw_fd(read_raw) };
            let write_end = unsafe { OwnedFd::from_raw_fd(write_raw) };

            let started = Instant::now();

            // SAFETY: the child only calls the allocation-free check, write(2) and _exit(2).
            let child = match unsafe { fork() }.map_err(|e| to_process_error("fork(probe)", e))? {
                ForkResult::Child => {
                    drop(read_end);
                    run_probe_child(self.check, &c_path, write_end.as_raw_fd())
                }
                ForkResult::Parent { child } => child,
            };

            drop(write_end);
            (started, child, read_end)
        };

        let mut notes = Vec::new();
        let deadline = started + timeout;
        let response = read_response(&read_end, deadline);
        drop(read_end);

        let mut kill_sent = false;
        let outcome = match response {
            Response::Message(message) => ProbeOutcome::from_message(&message),
            Response::Deadline => {
                kill_sent = kill_child(child, &mut notes);
                ProbeOutcome::TimedOut
            }
            Response::ChannelError(err) => {
                kill_sent = kill_child(child, &mut notes);
                ProbeOutcome::Unhealthy {
                    detail: format!("probe channel error: {err}"),
                }
            }
        };

        let child_exit = reap_child(child);
        if let ChildExit::ReapFailed(reason) = &child_exit {
            notes.push(format!("reap failed: {reason}"));
        }

        Ok(ProbeReport {
            outcome,
            child_pid: child.as_raw(),
            elapsed: started.elapsed(),
            kill_sent,
            child_exit,
            notes,
        })
    }
}

impl MountProber for IsolatedProber {
    fn probe_mount(&self, mount: &MountDescriptor, timeout: Duration) -> Result<ProbeOutcome> {
        let report = self.probe(&mount.mountpoint, timeout)?;
        debug!(
            "probe child {} for {} finished in {:?} (kill_sent={}, exit={:?})",
            report.child_pid,
            mount.mountpoint.display(),
            report.elapsed,
            report.kill_sent,
            report.child_exit
        );
        for note in &report.notes {
            debug!("probe child {}: {}", report.child_pid, note);
        }
        Ok(report.outcome)
    }
}

/// Child side of the protocol. Never returns.
fn run_probe_child(check: MetadataCheck, path: &CStr, fd: RawFd) -> ! {
    let mut buf = [0u8; 256];
    let len = {
        let mut cursor = std::io::Cursor::new(&mut buf[..]);
        let _ = match check(path) {
            Ok(()) => cursor.write_all(b"ok\n"),
            Err(errno) => writeln!(cursor, "error: {:?}: {}", errno, errno.desc()),
        };
        cursor.position() as usize
    };

    let mut written = 0;
    while written < len {
        match nix::unistd::write(fd, &buf[written..len]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }

    // SAFETY: _exit skips atexit handlers and stdio flushing inherited from the parent.
    unsafe { libc::_exit(0) }
}

enum Response {
    Message(String),
    Deadline,
    ChannelError(Errno),
}

/// Read the child's message, never waiting past `deadline`
fn read_response(read_end: &OwnedFd, deadline: Instant) -> Response {
    let fd = read_end.as_raw_fd();
    let mut message = Vec::with_capacity(64);
    let mut buf = [0u8; 512];

    loop {
        match wait_readable(fd, deadline) {
            Ok(true) => {}
            Ok(false) => return Response::Deadline,
            Err(err) => return Response::ChannelError(err),
        }

        match nix::unistd::read(fd, &mut buf) {
            Ok(0) => break,
            Ok(n) => {
                message.extend_from_slice(&buf[..n]);
                if message.contains(&b'\n') || message.len() >= MAX_MESSAGE_BYTES {
                    break;
                }
            }
            Err(Errno::EINTR) => continue,
            Err(err) => return Response::ChannelError(err),
        }
    }

    let line = message.split(|b| *b == b'\n').next().unwrap_or_default();
    Response::Message(String::from_utf8_lossy(line).into_owned())
}

/// Wait for `fd` to become readable (or hung up) before `deadline`
fn wait_readable(fd: RawFd, deadline: Instant) -> nix::Result<bool> {
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }

        let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
        match poll(&mut fds, poll_timeout_ms(remaining)) {
            Ok(0) => return Ok(false),
            Ok(_) => return Ok(true),
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Round up to whole milliseconds so a sub-millisecond remainder still waits
fn poll_timeout_ms(remaining: Duration) -> libc::c_int {
    let ms = (remaining.as_micros() + 999) / 1000;
    ms.min(libc::c_int::MAX as u128) as libc::c_int
}

fn kill_child(child: Pid, notes: &mut Vec<String>) -> bool {
    match kill(child, Signal::SIGKILL) {
        Ok(()) => true,
        Err(err) => {
            // The child may already have exited on its own.
            debug!("SIGKILL to probe child {} failed: {}", child, err);
            notes.push(format!("SIGKILL failed: {err}"));
            false
        }
    }
}

fn reap_child(child: Pid) -> ChildExit {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return ChildExit::Exited(code),
            Ok(WaitStatus::Signaled(_, sig, _)) => return ChildExit::Signaled(sig as i32),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(err) => {
                warn!("waitpid(probe child {}) failed: {}", child, err);
                return ChildExit::ReapFailed(err.to_string());
            }
        }
    }
}
