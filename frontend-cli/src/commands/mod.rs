//! Command implementations shared by the `kill-dev` and `kill-emulator`
//! binaries.

pub mod dev;
pub mod emulator;

use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;

/// Flags every tool accepts.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Config file (default: ~/.config/reaper/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log lookup and signal details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// How a run ended, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do, a dry run, or every target terminated.
    Done,
    /// At least one target could not be signalled.
    SomeFailed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::SomeFailed => ExitCode::from(2),
        }
    }
}

/// PID of this tool, never a kill target.
pub fn self_pid() -> i32 {
    std::process::id() as i32
}

#[cfg(test)]
pub(crate) mod testing;
