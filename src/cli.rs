//! CLI definitions for taskpages.

use clap::Parser;

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 8000;

/// Page-scoped task and subtask tracker with an HTTP API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the database file
    #[arg(short, long, default_value = "taskpages.db")]
    pub database: String,

    /// Port for the HTTP API
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
