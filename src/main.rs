//! hound binary entrypoint.
//! Loads `.env`, sets up logging on stderr, then runs the selected command.

use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hound::cli::{self, Cli};

/// Logs go to stderr so the timeline on stdout stays clean.
/// `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let started_at = Instant::now();

    let res = cli::execute(&cli).await;

    println!("\n> processed in {:?}", started_at.elapsed());
    res
}
