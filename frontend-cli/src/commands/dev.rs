//! `kill-dev`: stop lingering Jest/e2e runners and servers bound to ports.

use super::{self_pid, CommonArgs, Outcome};
use crate::config::{load_config, DevConfig};
use crate::logging::init_logging;
use anyhow::{Context, Result};
use backend::{
    find_dev_processes, parse_ports, terminate_all, KillEvent, ListenerSource, ProcessSource,
    Signaler, SystemListeners, SystemProcesses, SystemSignaler,
};
use clap::Parser;
use std::io::{self, Write};
use tracing::debug;

/// Kill Jest/e2e or Node listeners on specified ports.
///
/// Lists matches by default; pass --kill to send SIGTERM, then SIGKILL to
/// anything still alive after the grace period.
#[derive(Parser, Debug)]
#[command(name = "kill-dev", version)]
pub struct DevCli {
    /// Port(s) to target; can be repeated or comma-separated
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub ports: Vec<String>,

    /// Send SIGTERM then SIGKILL if still alive
    #[arg(long)]
    pub kill: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Entry point for the binary: wires up logging, config and the live system.
pub fn main(cli: DevCli) -> Result<Outcome> {
    init_logging(cli.common.verbose)?;
    let config = load_config(cli.common.config.as_deref())?;
    let listeners = SystemListeners::new(config.dev.backends()?, SystemProcesses);
    debug!(backends = ?listeners.backends(), "listener backends");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(
        &cli,
        &config.dev,
        &SystemProcesses,
        &listeners,
        &SystemSignaler,
        self_pid(),
        &mut out,
    )
}

pub fn run<P, L, S, W>(
    cli: &DevCli,
    config: &DevConfig,
    processes: &P,
    listeners: &L,
    signaler: &S,
    self_pid: i32,
    out: &mut W,
) -> Result<Outcome>
where
    P: ProcessSource,
    L: ListenerSource,
    S: Signaler,
    W: Write,
{
    let parsed = parse_ports(cli.ports.as_slice());
    for token in &parsed.rejected {
        writeln!(out, "Warning: ignoring non-numeric port '{}'", token)?;
    }
    let ports = if parsed.ports.is_empty() {
        config.default_ports.clone()
    } else {
        parsed.ports
    };
    debug!(?ports, "targeting ports");

    let targets = find_dev_processes(
        processes,
        listeners,
        config.markers.as_slice(),
        &ports,
        self_pid,
    )
    .context("Failed to enumerate processes")?;
    if targets.is_empty() {
        writeln!(out, "No matching processes found.")?;
        return Ok(Outcome::Done);
    }

    writeln!(out, "Matched processes:")?;
    for target in &targets {
        writeln!(out, "  {}\t{}", target.pid, target.cmd)?;
    }

    if !cli.kill {
        writeln!(out, "(Dry run) Re-run with --kill to terminate them.")?;
        return Ok(Outcome::Done);
    }

    let mut write_err = None;
    let report = terminate_all(signaler, &targets, config.grace(), |KillEvent::Sent(sig, t)| {
        if write_err.is_none() {
            write_err = writeln!(out, "{} {} :: {}", sig.as_str(), t.pid, t.cmd).err();
        }
    });
    if let Some(e) = write_err {
        return Err(e.into());
    }

    if report.all_terminated() {
        writeln!(out, "All matching processes terminated.")?;
        Ok(Outcome::Done)
    } else {
        writeln!(out, "Some PIDs could not be killed: {:?}", report.failed)?;
        Ok(Outcome::SomeFailed)
    }
}
