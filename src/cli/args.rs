//! CLI argument definitions using clap
//!
//! Commands:
//! - catalogd serve --config <path>
//! - catalogd submit --config <path> [--input <file>]
//! - catalogd fetch --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// catalogd - content catalog service over a single JSON document
#[derive(Parser, Debug)]
#[command(name = "catalogd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the catalog HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./catalogd.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Apply one submission and print the receipt
    Submit {
        /// Path to configuration file
        #[arg(long, default_value = "./catalogd.json")]
        config: PathBuf,

        /// Submission body; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Fetch the current document and print a summary
    Fetch {
        /// Path to configuration file
        #[arg(long, default_value = "./catalogd.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
