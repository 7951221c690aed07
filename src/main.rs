use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod error;
mod handlers;
mod password;
mod router;
mod schemas;
mod session;
mod validation;

#[cfg(test)]
mod test_utils;

use cli::Cli;

/// Main entry point for the adverts service.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adverts=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Environment first, so `.env` values reach the CLI's env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.run().await
}
