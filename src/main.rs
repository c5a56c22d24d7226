//! catalogd CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Installs the tracing subscriber (`RUST_LOG`, default `info`)
//! 2. Dispatches to CLI commands (via cli::run)
//! 3. Reports errors as JSON on stdout and on stderr
//! 4. Exits with the error's exit code on failure
//!
//! All logic is delegated to the CLI module.

use catalogd::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run() {
        let _ = cli::write_error(&e);
        eprintln!("{}", e);
        std::process::exit(e.code().exit_code());
    }
}
