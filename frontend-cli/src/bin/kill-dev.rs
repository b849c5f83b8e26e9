use clap::Parser;
use reaper::commands::dev::{self, DevCli};
use std::process::ExitCode;

fn main() -> ExitCode {
    match dev::main(DevCli::parse()) {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
