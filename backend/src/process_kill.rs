//! Process killing functionality.

use crate::select::Target;
use crate::types::ProcError;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::{thread, time::Duration};
use tracing::debug;

/// Time a process gets to exit after SIGTERM before it is sent SIGKILL.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(1);

/// Delivers signals. Swapped out in tests.
pub trait Signaler {
    fn send(&self, pid: i32, sig: Signal) -> nix::Result<()>;

    /// Whether `pid` still exists.
    fn alive(&self, pid: i32) -> bool;
}

/// Signals real processes with `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSignaler;

impl Signaler for SystemSignaler {
    fn send(&self, pid: i32, sig: Signal) -> nix::Result<()> {
        signal::kill(Pid::from_raw(pid), sig)
    }

    fn alive(&self, pid: i32) -> bool {
        match signal::kill(Pid::from_raw(pid), None) {
            Ok(()) => true,
            // exists, but owned by someone else
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}

/// Progress notifications from [`terminate_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillEvent<'a> {
    Sent(Signal, &'a Target),
}

/// Outcome of a termination pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KillReport {
    /// PIDs that could not be signalled, in the order they failed.
    pub failed: Vec<i32>,
}

impl KillReport {
    pub fn all_terminated(&self) -> bool {
        self.failed.is_empty()
    }

    fn fail(&mut self, pid: i32) {
        if !self.failed.contains(&pid) {
            self.failed.push(pid);
        }
    }
}

/// SIGTERM every target, wait `grace`, then SIGKILL the survivors.
///
/// A target that is already gone when SIGTERM is sent is skipped. Targets
/// that could not be sent SIGTERM are reported as failed and not retried.
pub fn terminate_all<S, F>(
    signaler: &S,
    targets: &[Target],
    grace: Duration,
    mut on_event: F,
) -> KillReport
where
    S: Signaler,
    F: FnMut(KillEvent<'_>),
{
    let mut report = KillReport::default();

    for target in targets {
        on_event(KillEvent::Sent(Signal::SIGTERM, target));
        match signaler.send(target.pid, Signal::SIGTERM) {
            Ok(()) => {}
            Err(Errno::ESRCH) => debug!(pid = target.pid, "already exited"),
            Err(e) => {
                debug!(pid = target.pid, "SIGTERM failed: {}", e);
                report.fail(target.pid);
            }
        }
    }

    if !grace.is_zero() {
        thread::sleep(grace);
    }

    for target in targets {
        if report.failed.contains(&target.pid) || !signaler.alive(target.pid) {
            continue;
        }
        on_event(KillEvent::Sent(Signal::SIGKILL, target));
        match signaler.send(target.pid, Signal::SIGKILL) {
            Ok(()) => {}
            // exited between the liveness check and the signal
            Err(Errno::ESRCH) => debug!(pid = target.pid, "already exited"),
            Err(e) => {
                debug!(pid = target.pid, "SIGKILL failed: {}", e);
                report.fail(target.pid);
            }
        }
    }

    report
}

/// Kill a process by PID with SIGKILL, no grace period.
pub fn kill_now<S: Signaler>(signaler: &S, pid: i32) -> Result<(), ProcError> {
    signaler.send(pid, Signal::SIGKILL).map_err(|e| match e {
        Errno::EPERM => ProcError::PermissionDenied(pid),
        Errno::ESRCH => ProcError::NotFound(pid),
        other => ProcError::SignalError(pid, other.to_string()),
    })
}
