//! Data types and error definitions for process management.

use std::process::ExitStatus;
use thiserror::Error;

/// Represents a process entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: i32,
    pub ppid: i32,
    pub name: String,
    /// argv joined with spaces, or `[name]` when argv is empty.
    pub cmdline: String,
}

impl ProcessInfo {
    pub fn new(pid: i32, ppid: i32, name: &str, argv: &[String]) -> Self {
        Self {
            pid,
            ppid,
            name: name.to_string(),
            cmdline: render_cmdline(name, argv),
        }
    }
}

/// A process listening on a TCP port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub pid: i32,
    pub command: String,
    pub port: u16,
}

/// Errors that can occur during process management.
#[derive(Error, Debug)]
pub enum ProcError {
    #[error("Permission denied for PID {0}")]
    PermissionDenied(i32),
    #[error("Process {0} not found")]
    NotFound(i32),
    #[error("Failed to send signal to PID {0}: {1}")]
    SignalError(i32, String),
    #[error("{0} is not available: {1}")]
    ToolUnavailable(&'static str, String),
    #[error("{0} exited with {1}")]
    ToolFailed(&'static str, ExitStatus),
    #[error("Procfs error: {0}")]
    ProcfsError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Other error: {0}")]
    Other(String),
}

impl From<procfs::ProcError> for ProcError {
    fn from(err: procfs::ProcError) -> Self {
        ProcError::ProcfsError(err.to_string())
    }
}

pub(crate) fn render_cmdline(name: &str, argv: &[String]) -> String {
    let joined = argv
        .iter()
        .map(String::as_str)
        .filter(|arg| !arg.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        format!("[{}]", name)
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmdline_joins_argv() {
        let argv = vec!["node".to_string(), "server.js".to_string()];
        let info = ProcessInfo::new(10, 1, "node", &argv);
        assert_eq!(info.cmdline, "node server.js");
    }

    #[test]
    fn kernel_thread_gets_bracketed_name() {
        let info = ProcessInfo::new(2, 0, "kthreadd", &[]);
        assert_eq!(info.cmdline, "[kthreadd]");
    }
}
