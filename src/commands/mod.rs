//! Command implementations for the CLI
//!
//! - serve: flush the boot log, wire storage and start the server
//! - check: validate a configuration file

pub mod check;
pub mod serve;
