//! CLI configuration management.
//!
//! ```text
//! Cli
//! └── connect: ConnectConfig   # Endpoint, credentials, timeouts, region
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! nvisy-connect --minio-endpoint http://localhost:9000 \
//!     --minio-access-key minioadmin --minio-secret-key minioadmin
//!
//! # Or via environment variables
//! MINIO_ENDPOINT=http://localhost:9000 MINIO_ACCESS_KEY=... MINIO_SECRET_KEY=... nvisy-connect
//! ```

use std::process;

use anyhow::Context;
use clap::Parser;
use nvisy_connect::ConnectConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_STARTUP;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "nvisy-connect")]
#[command(about = "Validates a MinIO endpoint and credentials")]
#[command(version)]
pub struct Cli {
    /// MinIO connection configuration.
    #[clap(flatten)]
    pub connect: ConnectConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.connect
            .validate()
            .context("invalid MinIO configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        self.connect.log();
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "nvisy-connect",
            "--minio-endpoint",
            "https://minio.example.com",
            "--minio-access-key",
            "access",
            "--minio-secret-key",
            "secret",
            "--minio-connect-timeout",
            "0",
        ])
        .unwrap();

        assert_eq!(cli.connect.endpoint, "https://minio.example.com");
        assert_eq!(cli.connect.connect_timeout(), None);
        assert_eq!(cli.connect.region, "us-east-1");
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let cli = Cli::try_parse_from([
            "nvisy-connect",
            "--minio-endpoint",
            "minio.example.com",
            "--minio-access-key",
            "access",
            "--minio-secret-key",
            "secret",
        ])
        .unwrap();

        let err = cli.validate().unwrap_err();
        assert!(format!("{err:#}").contains("invalid MinIO configuration"));
    }
}
