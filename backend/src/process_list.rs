//! Process enumeration over `/proc`.

use crate::types::{ProcError, ProcessInfo};
use procfs::process::Process;
use tracing::debug;

/// Something that can enumerate processes and resolve a PID to its command.
pub trait ProcessSource {
    fn processes(&self) -> Result<Vec<ProcessInfo>, ProcError>;

    /// Command line of a single process, `None` if it is gone.
    fn command_of(&self, pid: i32) -> Option<String>;
}

/// Reads the live process table through procfs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessSource for SystemProcesses {
    fn processes(&self) -> Result<Vec<ProcessInfo>, ProcError> {
        list_processes()
    }

    fn command_of(&self, pid: i32) -> Option<String> {
        command_of(pid)
    }
}

/// List all processes with their command lines.
/// Processes that exit or cannot be read mid-walk are skipped.
pub fn list_processes() -> Result<Vec<ProcessInfo>, ProcError> {
    let all_procs = procfs::process::all_processes()
        .map_err(|e| ProcError::Other(format!("Failed to read /proc: {}", e)))?;

    let mut processes = Vec::new();
    for proc_result in all_procs {
        let proc = match proc_result {
            Ok(proc) => proc,
            Err(e) => {
                debug!("skipping unreadable /proc entry: {}", e);
                continue;
            }
        };
        match read_process(&proc) {
            Ok(info) => processes.push(info),
            Err(e) => debug!(pid = proc.pid(), "skipping process: {}", e),
        }
    }

    Ok(processes)
}

/// Look up the command line of one process, like `ps -p PID -o cmd=`.
pub fn command_of(pid: i32) -> Option<String> {
    let proc = Process::new(pid).ok()?;
    read_process(&proc).ok().map(|info| info.cmdline)
}

fn read_process(proc: &Process) -> Result<ProcessInfo, ProcError> {
    let stat = proc.stat()?;
    // cmdline is unreadable for some processes owned by other users
    let argv = proc.cmdline().unwrap_or_default();
    Ok(ProcessInfo::new(stat.pid, stat.ppid, &stat.comm, &argv))
}
