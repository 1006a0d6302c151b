//! Client construction and probe operations behind the establisher.
//!
//! The establisher never talks to the network directly. It asks a
//! [`Connector`] for a data-plane client and an admin client, then probes
//! them through [`StorageApi`] and [`AdminApi`]. [`MinioConnector`] is the
//! production implementation; tests substitute a scripted connector.

mod admin;
mod storage;
mod signer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

pub use self::admin::{AdminClient, AdminClientConfig};
pub use self::storage::{MinioConnector, MinioStorage};
use crate::{BoxedError, Credentials, Endpoint, Result};

/// Builds the two SDK clients for an endpoint.
pub trait Connector: Send + Sync + 'static {
    /// Data-plane client type.
    type Storage: StorageApi;
    /// Admin client type.
    type Admin: AdminApi;

    /// Constructs a data-plane client. Must not perform network I/O.
    fn storage_client(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Self::Storage, BoxedError>;

    /// Constructs an admin client. Must not perform network I/O.
    fn admin_client(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Self::Admin, BoxedError>;
}

/// Data-plane operations used to probe connectivity.
#[async_trait]
pub trait StorageApi: Send + Sync + 'static {
    /// Checks whether a bucket exists.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, TransportError>;
}

/// Admin operations used to probe connectivity.
#[async_trait]
pub trait AdminApi: Send + Sync + 'static {
    /// Fetches server information.
    async fn server_info(&self) -> Result<ServerInfo, TransportError>;
}

/// Classification of a [`TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TransportErrorKind {
    /// The requested bucket does not exist.
    NoSuchBucket,
    /// The server rejected the request with HTTP 403.
    AccessDenied,
    /// Anything else.
    Other,
}

/// Error reported by a transport operation.
///
/// Carries the HTTP status and the S3 error code when the server produced a
/// response, so that callers can tell "not found" apart from other failures.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status code of the response, if one was received.
    pub status_code: Option<u16>,
    /// S3/MinIO error code such as `NoSuchBucket`, if one was reported.
    pub code: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Underlying error.
    #[source]
    pub source: Option<BoxedError>,
}

impl TransportError {
    /// Error code reported for a missing bucket.
    pub const NO_SUCH_BUCKET: &'static str = "NoSuchBucket";
    /// Error code reported for rejected credentials.
    pub const ACCESS_DENIED: &'static str = "AccessDenied";

    /// Creates a new transport error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates the error a server returns for a missing bucket.
    pub fn no_such_bucket(bucket: &str) -> Self {
        Self::new(format!("bucket '{bucket}' does not exist"))
            .with_status(404)
            .with_code(Self::NO_SUCH_BUCKET)
    }

    /// Creates the error a server returns for rejected credentials.
    pub fn access_denied() -> Self {
        Self::new("Access Denied")
            .with_status(403)
            .with_code(Self::ACCESS_DENIED)
    }

    /// Sets the HTTP status code.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Sets the S3 error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the underlying error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Classifies this error.
    ///
    /// A `NoSuchBucket` code wins over the status code; a 403 status is
    /// reported as access denied whatever the code says.
    pub fn kind(&self) -> TransportErrorKind {
        if self.code.as_deref() == Some(Self::NO_SUCH_BUCKET) {
            TransportErrorKind::NoSuchBucket
        } else if self.status_code == Some(403) {
            TransportErrorKind::AccessDenied
        } else {
            TransportErrorKind::Other
        }
    }
}

/// Subset of the MinIO admin `info` response.
///
/// Only used to confirm the admin API answers; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Cluster mode, e.g. `online`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Deployment identifier.
    #[serde(default, rename = "deploymentID")]
    pub deployment_id: Option<String>,
    /// Configured region.
    #[serde(default)]
    pub region: Option<String>,
    /// Per-node properties.
    #[serde(default)]
    pub servers: Vec<ServerProperties>,
}

/// Properties of a single MinIO node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerProperties {
    /// Node state, e.g. `online`.
    #[serde(default)]
    pub state: Option<String>,
    /// Node endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Server version.
    #[serde(default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_such_bucket_classification() {
        let err = TransportError::no_such_bucket("probe");
        assert_eq!(err.kind(), TransportErrorKind::NoSuchBucket);

        // The code decides even without a status.
        let err = TransportError::new("missing").with_code("NoSuchBucket");
        assert_eq!(err.kind(), TransportErrorKind::NoSuchBucket);
    }

    #[test]
    fn test_access_denied_classification() {
        assert_eq!(
            TransportError::access_denied().kind(),
            TransportErrorKind::AccessDenied
        );

        let err = TransportError::new("forbidden")
            .with_status(403)
            .with_code("SignatureDoesNotMatch");
        assert_eq!(err.kind(), TransportErrorKind::AccessDenied);
    }

    #[test]
    fn test_other_classification() {
        let err = TransportError::new("connection refused");
        assert_eq!(err.kind(), TransportErrorKind::Other);

        let err = TransportError::new("server error").with_status(500);
        assert_eq!(err.kind(), TransportErrorKind::Other);

        let err = TransportError::new("denied by code only").with_code("AccessDenied");
        assert_eq!(err.kind(), TransportErrorKind::Other);
    }

    #[test]
    fn test_server_info_decoding() {
        let body = r#"{
            "mode": "online",
            "deploymentID": "7a8b2c1e-0000-4000-8000-000000000000",
            "region": "us-east-1",
            "buckets": {"count": 3},
            "servers": [{"state": "online", "endpoint": "minio:9000", "version": "2024-01-01"}]
        }"#;
        let info: ServerInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.mode.as_deref(), Some("online"));
        assert_eq!(
            info.deployment_id.as_deref(),
            Some("7a8b2c1e-0000-4000-8000-000000000000")
        );
        assert_eq!(info.servers.len(), 1);
        assert_eq!(info.servers[0].endpoint.as_deref(), Some("minio:9000"));
    }

    #[test]
    fn test_server_info_decoding_minimal() {
        let info: ServerInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, ServerInfo::default());
    }
}
