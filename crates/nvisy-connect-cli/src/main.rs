#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod shutdown;

use std::process;

use anyhow::Context;
use nvisy_connect::ConnectContext;
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "nvisy_connect_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "nvisy_connect_cli::shutdown";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format!("{error:#}"),
            "MinIO connection check failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();
    cli.validate()?;

    let token = CancellationToken::new();
    let signals = tokio::spawn(shutdown::cancel_on_signal(token.clone()));
    let ctx = ConnectContext::from_token(token.clone());

    let result = cli.connect.establish(&ctx).await;
    token.cancel();
    let _ = signals.await;

    let connection = result.context("failed to connect to MinIO")?;
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        endpoint = %connection.endpoint(),
        access_key = %connection.credentials().access_key_masked(),
        "MinIO endpoint and credentials are valid"
    );

    Ok(())
}
