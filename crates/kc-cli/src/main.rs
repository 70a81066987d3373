//! # kc-import
//!
//! Imports realm definitions into the identity store.

#![forbid(unsafe_code)]
#![deny(warnings)]

use clap::Parser;
use kc_cli::{cli::Cli, commands::run_import, output::error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run_import(&cli).await {
        error(&e.to_string());
        std::process::exit(1);
    }
}
