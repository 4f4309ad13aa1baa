//! Integration tests for the isolated prober
//!
//! These tests verify the process lifecycle guarantees: bounded wait,
//! forced termination, and reaping on every path.

use mountprobe::core::types::{ChildExit, NO_REPORT_DETAIL};
use mountprobe::{IsolatedProber, ProbeOutcome};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::ffi::CStr;
use std::thread;
use std::time::{Duration, Instant};

fn block_in_sleep(_path: &CStr) -> nix::Result<()> {
    loop {
        unsafe {
            libc::sleep(3600);
        }
    }
}

fn exit_without_reporting(_path: &CStr) -> nix::Result<()> {
    unsafe { libc::_exit(0) }
}

fn child_exists(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None::<Signal>) != Err(Errno::ESRCH)
}

#[test]
fn temp_dir_is_healthy_well_under_timeout() {
    let dir = std::env::temp_dir();
    let started = Instant::now();
    let report = IsolatedProber::new()
        .probe(&dir.display().to_string(), Duration::from_secs(10))
        .unwrap();

    assert_eq!(report.outcome, ProbeOutcome::Healthy);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!child_exists(report.child_pid));
}

#[test]
fn blocked_probe_is_killed_and_reaped() {
    let timeout = Duration::from_millis(300);
    let started = Instant::now();
    let report = IsolatedProber::with_check(block_in_sleep)
        .probe("/", timeout)
        .unwrap();
    let waited = started.elapsed();

    assert_eq!(report.outcome, ProbeOutcome::TimedOut);
    assert!(waited >= timeout);
    assert!(waited < timeout + Duration::from_secs(3));
    assert!(report.kill_sent);
    assert!(report.reaped());
    assert_eq!(report.child_exit, ChildExit::Signaled(libc::SIGKILL));
    assert!(!child_exists(report.child_pid));
}

#[test]
fn repeated_timeouts_leave_no_children_behind() {
    let prober = IsolatedProber::with_check(block_in_sleep);
    let pids: Vec<i32> = (0..5)
        .map(|_| {
            prober
                .probe("/", Duration::from_millis(50))
                .unwrap()
                .child_pid
        })
        .collect();

    for pid in pids {
        assert!(!child_exists(pid), "probe child {pid} leaked");
    }
}

#[test]
fn nonexistent_path_has_error_detail() {
    let report = IsolatedProber::new()
        .probe("/definitely/not/mounted/here", Duration::from_secs(5))
        .unwrap();

    match report.outcome {
        ProbeOutcome::Unhealthy { detail } => assert!(!detail.is_empty()),
        other => panic!("expected unhealthy, got {other:?}"),
    }
    assert_eq!(report.child_exit, ChildExit::Exited(0));
}

#[test]
fn concurrent_children_do_not_hold_each_others_pipes() {
    let blocker = thread::spawn(|| {
        let prober = IsolatedProber::with_check(block_in_sleep);
        for _ in 0..3 {
            let report = prober.probe("/", Duration::from_secs(2)).unwrap();
            assert_eq!(report.outcome, ProbeOutcome::TimedOut);
        }
    });

    // A silent child is only detected through EOF, which never arrives while
    // another child still holds a copy of the write end.
    let prober = IsolatedProber::with_check(exit_without_reporting);
    for _ in 0..50 {
        let report = prober.probe("/", Duration::from_secs(2)).unwrap();
        assert_eq!(
            report.outcome,
            ProbeOutcome::Unhealthy {
                detail: NO_REPORT_DETAIL.to_string()
            }
        );
        assert!(report.elapsed < Duration::from_secs(1));
        assert!(!child_exists(report.child_pid));
    }

    blocker.join().unwrap();
}
