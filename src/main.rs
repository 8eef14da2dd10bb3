//! taskpages server
//!
//! A page-scoped task/subtask tracker exposing a small CRUD and
//! lifecycle-transition API over HTTP.

use anyhow::Result;
use clap::Parser;
use taskpages::cli::Cli;
use taskpages::db::Database;
use taskpages::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let db = Database::open(&cli.database)?;
    info!(database = %cli.database, "opened database");

    server::serve(db, cli.port).await
}
