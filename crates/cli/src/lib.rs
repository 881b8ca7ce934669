//! cfr2 CLI library
//!
//! Command definitions, output formatting and exit codes for the `cfr2`
//! binary.

pub mod commands;
pub mod exit_code;
pub mod output;
