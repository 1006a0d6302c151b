//! Connection configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::transport::{AdminClientConfig, MinioConnector};
use crate::{
    ConnectContext, Credentials, Endpoint, Error, MinioConnection, Result, TRACING_TARGET_CLIENT,
};

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default admin request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default signing region.
const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for establishing a MinIO connection.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ConnectConfig {
    /// MinIO endpoint URL, e.g. `http://localhost:9000`.
    #[cfg_attr(
        feature = "config",
        arg(long = "minio-endpoint", env = "MINIO_ENDPOINT")
    )]
    pub endpoint: String,

    /// Access key for MinIO authentication.
    #[cfg_attr(
        feature = "config",
        arg(long = "minio-access-key", env = "MINIO_ACCESS_KEY")
    )]
    pub access_key: String,

    /// Secret key for MinIO authentication.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "minio-secret-key",
            env = "MINIO_SECRET_KEY",
            hide_env_values = true
        )
    )]
    #[serde(skip_serializing, default)]
    pub secret_key: String,

    /// Maximum time in seconds to wait for the connection to be validated.
    ///
    /// Zero disables the deadline.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "minio-connect-timeout",
            env = "MINIO_CONNECT_TIMEOUT",
            default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout in seconds for individual admin API requests.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "minio-request-timeout",
            env = "MINIO_REQUEST_TIMEOUT",
            default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Region used to sign admin API requests.
    #[cfg_attr(
        feature = "config",
        arg(long = "minio-region", env = "MINIO_REGION", default_value = DEFAULT_REGION)
    )]
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_region() -> String {
    DEFAULT_REGION.to_owned()
}

impl ConnectConfig {
    /// Creates a configuration with default timeouts and region.
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            region: default_region(),
        }
    }

    /// Sets the connect timeout. A zero duration disables the deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the admin request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the signing region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Returns the connect deadline, or `None` if disabled.
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_secs > 0).then(|| Duration::from_secs(self.connect_timeout_secs))
    }

    /// Returns the admin request timeout.
    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the credentials.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.access_key, &self.secret_key)
    }

    /// Returns the admin client configuration.
    pub fn admin_config(&self) -> AdminClientConfig {
        AdminClientConfig::default()
            .with_timeout(self.request_timeout())
            .with_region(&self.region)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint is not a valid
    /// `http`/`https` URL or the request timeout is zero.
    pub fn validate(&self) -> Result<Endpoint> {
        let endpoint = Endpoint::parse(&self.endpoint)?;

        if self.request_timeout_secs == 0 {
            return Err(Error::configuration(
                "request timeout must be greater than zero",
            ));
        }

        Ok(endpoint)
    }

    /// Logs the configuration (no sensitive information).
    pub fn log(&self) {
        let endpoint = Endpoint::parse(&self.endpoint)
            .map(|e| e.masked())
            .unwrap_or_else(|_| "<invalid>".to_owned());

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            endpoint = %endpoint,
            access_key = %self.credentials().access_key_masked(),
            connect_timeout_secs = self.connect_timeout_secs,
            request_timeout_secs = self.request_timeout_secs,
            region = %self.region,
            "MinIO configuration"
        );
    }

    /// Establishes a connection with this configuration.
    ///
    /// The connect timeout is applied to a child of `ctx`, so cancelling
    /// `ctx` still aborts the attempt.
    ///
    /// # Errors
    ///
    /// See [`establish_with`](crate::establish_with).
    pub async fn establish(&self, ctx: &ConnectContext) -> Result<MinioConnection> {
        let endpoint = self.validate()?;

        let ctx = match self.connect_timeout() {
            Some(timeout) => ctx.child().with_timeout(timeout),
            None => ctx.child(),
        };

        let connector = MinioConnector::new(self.admin_config());
        MinioConnection::connect(connector, &ctx, endpoint, self.credentials()).await
    }
}

impl std::fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.credentials().access_key_masked())
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
