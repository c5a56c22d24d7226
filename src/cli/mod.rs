//! CLI module for catalogd
//!
//! Provides command-line interface for:
//! - serve: run the HTTP API
//! - submit: one-shot write from a file or stdin
//! - fetch: print a summary of the stored document

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{fetch, run, run_command, serve, submit, DocumentSummary};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_submission, write_error, write_json};
