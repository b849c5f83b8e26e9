//! Discovery of processes listening on a TCP port.
//!
//! Three backends are available: procfs socket tables, `lsof`, and `ss`.
//! They are tried in order and the first one that succeeds wins; a backend
//! that errors (tool missing, non-zero exit) falls through to the next.

use crate::process_list::{ProcessSource, SystemProcesses};
use crate::types::{Listener, ProcError};
use procfs::net::TcpState;
use procfs::process::FDTarget;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

/// Where listener information comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerBackend {
    Procfs,
    Lsof,
    Ss,
}

impl ListenerBackend {
    pub const ALL: [ListenerBackend; 3] = [
        ListenerBackend::Procfs,
        ListenerBackend::Lsof,
        ListenerBackend::Ss,
    ];
}

impl fmt::Display for ListenerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerBackend::Procfs => "procfs",
            ListenerBackend::Lsof => "lsof",
            ListenerBackend::Ss => "ss",
        };
        f.write_str(name)
    }
}

impl FromStr for ListenerBackend {
    type Err = ProcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "procfs" => Ok(ListenerBackend::Procfs),
            "lsof" => Ok(ListenerBackend::Lsof),
            "ss" => Ok(ListenerBackend::Ss),
            other => Err(ProcError::Other(format!(
                "unknown listener backend '{}' (expected procfs, lsof or ss)",
                other
            ))),
        }
    }
}

/// Something that can report which processes listen on a TCP port.
pub trait ListenerSource {
    /// Listeners on `port`, one entry per PID. Best effort: an empty list
    /// is returned when no backend can answer.
    fn listeners(&self, port: u16) -> Vec<Listener>;
}

/// Listener lookup against the running system.
#[derive(Debug, Clone)]
pub struct SystemListeners<S = SystemProcesses> {
    backends: Vec<ListenerBackend>,
    processes: S,
}

impl Default for SystemListeners<SystemProcesses> {
    fn default() -> Self {
        Self::new(ListenerBackend::ALL.to_vec(), SystemProcesses)
    }
}

impl<S: ProcessSource> SystemListeners<S> {
    pub fn new(backends: Vec<ListenerBackend>, processes: S) -> Self {
        Self {
            backends,
            processes,
        }
    }

    pub fn backends(&self) -> &[ListenerBackend] {
        &self.backends
    }

    fn lookup(&self, backend: ListenerBackend, port: u16) -> Result<Vec<Listener>, ProcError> {
        let found = match backend {
            ListenerBackend::Procfs => procfs_listener_pids(port)?
                .into_iter()
                .map(|pid| self.listener(pid, port, None))
                .collect(),
            ListenerBackend::Lsof => {
                let port_arg = format!(":{}", port);
                let out = run_tool("lsof", &["-i", &port_arg, "-sTCP:LISTEN", "-n", "-P"])?;
                parse_lsof(&out)
                    .into_iter()
                    .map(|(pid, command)| self.listener(pid, port, Some(command)))
                    .collect()
            }
            ListenerBackend::Ss => {
                let out = run_tool("ss", &["-ltnp"])?;
                parse_ss(&out, port)
                    .into_iter()
                    .map(|pid| self.listener(pid, port, None))
                    .collect()
            }
        };
        Ok(dedup_by_pid(found))
    }

    fn listener(&self, pid: i32, port: u16, fallback: Option<String>) -> Listener {
        let command = self
            .processes
            .command_of(pid)
            .filter(|cmd| !cmd.is_empty())
            .or(fallback)
            .unwrap_or_default();
        Listener { pid, command, port }
    }
}

impl<S: ProcessSource> ListenerSource for SystemListeners<S> {
    fn listeners(&self, port: u16) -> Vec<Listener> {
        first_answer(&self.backends, port, |backend| self.lookup(backend, port))
    }
}

/// Walk `backends` in order and return the first successful lookup, even an
/// empty one. Errors fall through; if every backend errors the result is
/// empty.
fn first_answer<F>(backends: &[ListenerBackend], port: u16, lookup: F) -> Vec<Listener>
where
    F: Fn(ListenerBackend) -> Result<Vec<Listener>, ProcError>,
{
    for &backend in backends {
        match lookup(backend) {
            Ok(found) => {
                debug!(%backend, port, count = found.len(), "listener lookup succeeded");
                return found;
            }
            Err(e) => debug!(%backend, port, "listener lookup failed, trying next: {}", e),
        }
    }
    debug!(port, "no listener backend could answer");
    Vec::new()
}

fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, ProcError> {
    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| ProcError::ToolUnavailable(tool, e.to_string()))?;
    if !output.status.success() {
        return Err(ProcError::ToolFailed(tool, output.status));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// PIDs owning a listening TCP socket on `port`, from `/proc/net/tcp{,6}`
/// and the fd tables of every readable process.
fn procfs_listener_pids(port: u16) -> Result<Vec<i32>, ProcError> {
    let mut inodes = HashSet::new();
    let mut tables_read = 0;
    for (family, table) in [("tcp", procfs::net::tcp()), ("tcp6", procfs::net::tcp6())] {
        match table {
            Ok(entries) => {
                tables_read += 1;
                inodes.extend(
                    entries
                        .into_iter()
                        .filter(|e| {
                            matches!(e.state, TcpState::Listen) && e.local_address.port() == port
                        })
                        .map(|e| e.inode),
                );
            }
            Err(e) => debug!(family, "cannot read socket table: {}", e),
        }
    }
    if tables_read == 0 {
        return Err(ProcError::ProcfsError("no TCP socket table is readable".into()));
    }
    if inodes.is_empty() {
        return Ok(Vec::new());
    }

    let mut pids = Vec::new();
    for proc in procfs::process::all_processes()?.flatten() {
        let Ok(fds) = proc.fd() else {
            continue;
        };
        let owns_socket = fds
            .flatten()
            .any(|fd| matches!(fd.target, FDTarget::Socket(inode) if inodes.contains(&inode)));
        if owns_socket {
            pids.push(proc.pid());
        }
    }

    if pids.is_empty() {
        // sockets exist but their owners are hidden from us
        return Err(ProcError::Other(format!(
            "listening sockets on port {} have no visible owner",
            port
        )));
    }
    Ok(pids)
}

/// Parse `lsof -i :PORT -sTCP:LISTEN -n -P` output into `(pid, command)`
/// pairs. The header row and rows without a numeric PID column are skipped.
pub fn parse_lsof(output: &str) -> Vec<(i32, String)> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let command = parts.next()?;
            let pid = parts.next()?;
            if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some((pid.parse().ok()?, command.to_string()))
        })
        .collect()
}

/// Parse `ss -ltnp` output into the PIDs listening on `port`.
pub fn parse_ss(output: &str, port: u16) -> Vec<i32> {
    static PID_RE: OnceLock<Regex> = OnceLock::new();
    let pid_re = PID_RE.get_or_init(|| Regex::new(r"pid=(\d+)").expect("valid regex"));

    let needle = format!(":{} ", port);
    let suffix = format!(":{}", port);
    output
        .lines()
        .filter(|line| line.contains(&needle) || line.trim().ends_with(&suffix))
        .filter_map(|line| pid_re.captures(line)?.get(1)?.as_str().parse().ok())
        .collect()
}

fn dedup_by_pid(listeners: Vec<Listener>) -> Vec<Listener> {
    let mut seen = HashSet::new();
    listeners
        .into_iter()
        .filter(|l| seen.insert(l.pid))
        .collect()
}
