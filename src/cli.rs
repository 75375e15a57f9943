//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aula", about = "Enrollment-gated lecture streaming platform", version)]
pub struct Cli {
    /// Path to the JSON config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Start {
        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate a config file and print a summary.
    Validate {
        /// Config file to validate (defaults to --config).
        config: Option<PathBuf>,
    },

    /// Hash a password for the bootstrap admin account.
    HashPassword { password: String },

    /// Generate a random media signing secret.
    GenerateSecret,

    /// Print the version.
    Version,
}
