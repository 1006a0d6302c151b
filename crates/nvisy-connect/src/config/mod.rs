//! Endpoint, credential and connection configuration.
//!
//! [`Endpoint`] and [`Credentials`] are the validated inputs of an
//! establishment attempt. [`ConnectConfig`] bundles them with timeouts and can
//! be loaded from command-line arguments or environment variables when the
//! `config` feature is enabled.

mod connect_config;
mod credentials;
mod endpoint;

pub use connect_config::ConnectConfig;
pub use credentials::Credentials;
pub use endpoint::{Endpoint, TransportSecurity};
