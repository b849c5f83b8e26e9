//! Command-line front end for the `backend` process library.
//!
//! Two binaries share this crate: `kill-dev` stops test runners and dev
//! servers, `kill-emulator` stops Android emulators.

pub mod commands;
pub mod config;
pub mod logging;
