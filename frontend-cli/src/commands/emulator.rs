//! `kill-emulator`: SIGKILL every running Android emulator process.

use super::{self_pid, CommonArgs, Outcome};
use crate::config::{load_config, EmulatorConfig};
use crate::logging::init_logging;
use anyhow::Result;
use backend::{find_emulators, kill_now, ProcessSource, Signaler, SystemProcesses, SystemSignaler};
use clap::Parser;
use std::io::{self, Write};
use tracing::debug;

/// Find and kill Android emulator processes.
#[derive(Parser, Debug)]
#[command(name = "kill-emulator", version)]
pub struct EmulatorCli {
    /// List matching processes without killing them
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn main(cli: EmulatorCli) -> Result<Outcome> {
    init_logging(cli.common.verbose)?;
    let config = load_config(cli.common.config.as_deref())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(
        &cli,
        &config.emulator,
        &SystemProcesses,
        &SystemSignaler,
        self_pid(),
        &mut out,
    )
}

pub fn run<P, S, W>(
    cli: &EmulatorCli,
    config: &EmulatorConfig,
    processes: &P,
    signaler: &S,
    self_pid: i32,
    out: &mut W,
) -> Result<Outcome>
where
    P: ProcessSource,
    S: Signaler,
    W: Write,
{
    let filter = config.filter();
    debug!(pattern = %filter.pattern, exclude = ?filter.exclude, "emulator filter");

    let targets = match find_emulators(processes, &filter, self_pid) {
        Ok(targets) => targets,
        Err(e) => {
            writeln!(out, "Error detecting emulator processes: {}", e)?;
            Vec::new()
        }
    };

    if targets.is_empty() {
        writeln!(out, "No Android emulator processes found.")?;
        return Ok(Outcome::Done);
    }

    writeln!(out, "Found {} Android emulator process(es):", targets.len())?;
    for target in &targets {
        writeln!(out, "  PID: {} | CMD: {}", target.pid, target.cmd)?;
    }

    if cli.dry_run {
        writeln!(out, "(Dry run) Re-run without --dry-run to kill them.")?;
        return Ok(Outcome::Done);
    }

    let mut outcome = Outcome::Done;
    for target in &targets {
        writeln!(out, "Killing emulator process PID {}...", target.pid)?;
        if let Err(e) = kill_now(signaler, target.pid) {
            writeln!(out, "Failed to kill PID {}: {}", target.pid, e)?;
            outcome = Outcome::SomeFailed;
        }
    }
    Ok(outcome)
}
