#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_CLIENT: &str = "nvisy_connect::client";
pub const TRACING_TARGET_PROBE: &str = "nvisy_connect::probe";
pub const TRACING_TARGET_ADMIN: &str = "nvisy_connect::admin";

mod connection;
mod context;
mod error;
mod probe;

pub mod config;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod transport;

// Re-export for convenience
pub use crate::config::{ConnectConfig, Credentials, Endpoint, TransportSecurity};
pub use crate::connection::{MinioConnection, establish, establish_with};
pub use crate::context::{CancelReason, ConnectContext};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::transport::{
    AdminApi, AdminClient, AdminClientConfig, Connector, MinioConnector, MinioStorage, ServerInfo,
    StorageApi, TransportError, TransportErrorKind,
};
