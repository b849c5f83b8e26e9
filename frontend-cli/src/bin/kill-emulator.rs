use clap::Parser;
use reaper::commands::emulator::{self, EmulatorCli};
use std::process::ExitCode;

fn main() -> ExitCode {
    match emulator::main(EmulatorCli::parse()) {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
