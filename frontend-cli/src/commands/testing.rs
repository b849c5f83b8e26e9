//! In-memory stand-ins for the process table, listener lookup and signals.

use backend::{
    Errno, Listener, ListenerSource, ProcError, ProcessInfo, ProcessSource, Signal, Signaler,
};
use std::cell::RefCell;
use std::collections::HashMap;

pub struct Table(pub Vec<ProcessInfo>);

impl Table {
    pub fn new(rows: &[(i32, &str)]) -> Self {
        Table(
            rows.iter()
                .map(|&(pid, cmd)| {
                    let argv: Vec<String> = cmd.split(' ').map(str::to_string).collect();
                    ProcessInfo::new(pid, 1, "test", &argv)
                })
                .collect(),
        )
    }
}

impl ProcessSource for Table {
    fn processes(&self) -> Result<Vec<ProcessInfo>, ProcError> {
        Ok(self.0.clone())
    }

    fn command_of(&self, pid: i32) -> Option<String> {
        self.0.iter().find(|p| p.pid == pid).map(|p| p.cmdline.clone())
    }
}

/// A process table that cannot be read.
pub struct Unreadable;

impl ProcessSource for Unreadable {
    fn processes(&self) -> Result<Vec<ProcessInfo>, ProcError> {
        Err(ProcError::Other("Failed to read /proc".into()))
    }

    fn command_of(&self, _pid: i32) -> Option<String> {
        None
    }
}

#[derive(Default)]
pub struct Ports {
    by_port: HashMap<u16, Vec<Listener>>,
    pub asked: RefCell<Vec<u16>>,
}

impl Ports {
    pub fn with(mut self, port: u16, pid: i32, command: &str) -> Self {
        self.by_port.entry(port).or_default().push(Listener {
            pid,
            command: command.to_string(),
            port,
        });
        self
    }
}

impl ListenerSource for Ports {
    fn listeners(&self, port: u16) -> Vec<Listener> {
        self.asked.borrow_mut().push(port);
        self.by_port.get(&port).cloned().unwrap_or_default()
    }
}

/// Records signals; every PID exits on SIGTERM unless listed in
/// `survives_term`, and PIDs in `denied` refuse every signal with EPERM.
#[derive(Default)]
pub struct FakeSignaler {
    pub survives_term: Vec<i32>,
    pub denied: Vec<i32>,
    pub sent: RefCell<Vec<(i32, Signal)>>,
}

impl FakeSignaler {
    pub fn deny(mut self, pid: i32) -> Self {
        self.denied.push(pid);
        self
    }
}

impl Signaler for FakeSignaler {
    fn send(&self, pid: i32, sig: Signal) -> Result<(), Errno> {
        self.sent.borrow_mut().push((pid, sig));
        if self.denied.contains(&pid) {
            Err(Errno::EPERM)
        } else {
            Ok(())
        }
    }

    fn alive(&self, pid: i32) -> bool {
        self.survives_term.contains(&pid) || self.denied.contains(&pid)
    }
}
