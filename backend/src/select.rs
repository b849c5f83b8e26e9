//! Target selection for the two tools.

use crate::listeners::ListenerSource;
use crate::matcher::{matches_marker, EmulatorFilter, DEFAULT_PORTS};
use crate::process_list::ProcessSource;
use crate::types::{ProcError, ProcessInfo};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// A process picked for termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub pid: i32,
    pub cmd: String,
}

/// Processes whose command line carries a marker or which listen on one of
/// `ports`, keyed and sorted by PID. An empty `ports` means
/// [`DEFAULT_PORTS`]. Marker matches keep their command line. `self_pid` and
/// its ancestors are never returned.
pub fn find_dev_processes<P, L, S>(
    processes: &P,
    listeners: &L,
    markers: &[S],
    ports: &[u16],
    self_pid: i32,
) -> Result<Vec<Target>, ProcError>
where
    P: ProcessSource,
    L: ListenerSource,
    S: AsRef<str>,
{
    let ports = if ports.is_empty() { &DEFAULT_PORTS[..] } else { ports };

    let table = processes.processes()?;
    let protected = self_and_ancestors(&table, self_pid);

    let mut by_pid: BTreeMap<i32, String> = table
        .into_iter()
        .filter(|p| matches_marker(&p.cmdline, markers))
        .map(|p| (p.pid, p.cmdline))
        .collect();
    debug!(count = by_pid.len(), "marker matches");

    for &port in ports {
        for listener in listeners.listeners(port) {
            by_pid.entry(listener.pid).or_insert(listener.command);
        }
    }

    by_pid.retain(|pid, _| !protected.contains(pid));
    Ok(by_pid
        .into_iter()
        .map(|(pid, cmd)| Target { pid, cmd })
        .collect())
}

/// Emulator processes in enumeration order, excluding `self_pid` and its
/// ancestors.
pub fn find_emulators<P: ProcessSource>(
    processes: &P,
    filter: &EmulatorFilter,
    self_pid: i32,
) -> Result<Vec<Target>, ProcError> {
    let table = processes.processes()?;
    let protected = self_and_ancestors(&table, self_pid);
    Ok(table
        .into_iter()
        .filter(|p| !protected.contains(&p.pid) && filter.matches(&p.cmdline))
        .map(|ProcessInfo { pid, cmdline, .. }| Target { pid, cmd: cmdline })
        .collect())
}

/// `self_pid` plus every process on its parent chain. A launcher such as
/// `sudo kill-emulator` or `sh -c "jest; kill-dev --kill"` would otherwise
/// match its own child's filter.
fn self_and_ancestors(table: &[ProcessInfo], self_pid: i32) -> HashSet<i32> {
    let parents: HashMap<i32, i32> = table.iter().map(|p| (p.pid, p.ppid)).collect();
    let mut chain = HashSet::new();
    let mut pid = self_pid;
    // insert() returning false means a ppid cycle
    while pid > 0 && chain.insert(pid) {
        match parents.get(&pid) {
            Some(&ppid) => pid = ppid,
            None => break,
        }
    }
    debug!(?chain, "protected pids");
    chain
}
