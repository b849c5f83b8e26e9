//! UI-agnostic process lookup and termination library for Linux.
//!
//! Finds processes by command-line text or by the TCP port they listen on,
//! and terminates them with a SIGTERM-then-SIGKILL escalation.
//! Uses `nix` and `procfs` for system interaction.

mod listeners;
mod matcher;
mod process_kill;
mod process_list;
mod select;
mod types;

pub use listeners::{parse_lsof, parse_ss, ListenerBackend, ListenerSource, SystemListeners};
pub use matcher::{
    matches_marker, parse_ports, EmulatorFilter, PortList, DEFAULT_MARKERS, DEFAULT_PORTS,
};
pub use process_kill::{
    kill_now, terminate_all, KillEvent, KillReport, Signaler, SystemSignaler, DEFAULT_GRACE,
};
pub use process_list::{command_of, list_processes, ProcessSource, SystemProcesses};
pub use select::{find_dev_processes, find_emulators, Target};
pub use types::{Listener, ProcError, ProcessInfo};

pub use nix::errno::Errno;
pub use nix::sys::signal::Signal;
