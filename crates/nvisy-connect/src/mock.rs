//! Scripted transport for testing.
//!
//! [`MockConnector`] implements [`Connector`] without touching the network.
//! Each step of the probe can be scripted to fail, every call is counted, and
//! an artificial latency can be added to network calls to exercise
//! cancellation.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! nvisy-connect = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use nvisy_connect::mock::{BucketProbe, MockConnector};
//! use nvisy_connect::{ConnectContext, establish_with};
//!
//! let connector = MockConnector::new().with_bucket_probe(BucketProbe::AccessDenied);
//! let ctx = ConnectContext::new();
//! let err = establish_with(connector, &ctx, "http://localhost:9000", "a", "b")
//!     .await
//!     .unwrap_err();
//! assert!(err.is_authorization());
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::transport::{AdminApi, Connector, ServerInfo, StorageApi, TransportError};
use crate::{BoxedError, Credentials, Endpoint, Result};

/// Scripted answer to the bucket-existence probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketProbe {
    /// Fails with a `NoSuchBucket` error.
    #[default]
    NoSuchBucket,
    /// Succeeds, reporting the bucket as present.
    Exists,
    /// Succeeds, reporting the bucket as absent.
    Missing,
    /// Fails with HTTP 403.
    AccessDenied,
    /// Fails with the given HTTP status and no error code.
    Status(u16),
    /// Fails without any response.
    Unreachable,
}

#[derive(Debug, Default)]
struct MockScript {
    fail_storage_construction: bool,
    fail_admin_construction: bool,
    server_info_status: Option<u16>,
    bucket_probe: BucketProbe,
    latency: Duration,
}

#[derive(Debug, Default)]
struct MockCalls {
    storage_constructed: AtomicUsize,
    admin_constructed: AtomicUsize,
    server_info: AtomicUsize,
    bucket_exists: AtomicUsize,
    buckets: Mutex<Vec<String>>,
}

/// A [`Connector`] with scripted outcomes and call counters.
///
/// Clones share counters, so a clone kept by the test observes the calls
/// made through the one handed to the establisher.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    script: Arc<MockScript>,
    calls: Arc<MockCalls>,
}

impl MockConnector {
    /// Creates a connector whose probe succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    fn script_mut(&mut self) -> &mut MockScript {
        Arc::get_mut(&mut self.script).expect("mock must be scripted before it is cloned")
    }

    /// Makes data-plane client construction fail.
    pub fn fail_storage_construction(mut self) -> Self {
        self.script_mut().fail_storage_construction = true;
        self
    }

    /// Makes admin client construction fail.
    pub fn fail_admin_construction(mut self) -> Self {
        self.script_mut().fail_admin_construction = true;
        self
    }

    /// Makes the server-info call fail with the given HTTP status.
    pub fn fail_server_info(mut self, status: u16) -> Self {
        self.script_mut().server_info_status = Some(status);
        self
    }

    /// Sets the answer to the bucket-existence probe.
    pub fn with_bucket_probe(mut self, probe: BucketProbe) -> Self {
        self.script_mut().bucket_probe = probe;
        self
    }

    /// Delays every network call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.script_mut().latency = latency;
        self
    }

    /// Number of data-plane clients constructed.
    pub fn storage_constructed(&self) -> usize {
        self.calls.storage_constructed.load(Ordering::SeqCst)
    }

    /// Number of admin clients constructed.
    pub fn admin_constructed(&self) -> usize {
        self.calls.admin_constructed.load(Ordering::SeqCst)
    }

    /// Number of server-info calls made.
    pub fn server_info_calls(&self) -> usize {
        self.calls.server_info.load(Ordering::SeqCst)
    }

    /// Number of bucket-existence calls made.
    pub fn bucket_exists_calls(&self) -> usize {
        self.calls.bucket_exists.load(Ordering::SeqCst)
    }

    /// Number of network calls made.
    pub fn network_calls(&self) -> usize {
        self.server_info_calls() + self.bucket_exists_calls()
    }

    /// Bucket names passed to the existence probe, in call order.
    pub fn probed_buckets(&self) -> Vec<String> {
        self.calls
            .buckets
            .lock()
            .map(|buckets| buckets.clone())
            .unwrap_or_default()
    }
}

impl Connector for MockConnector {
    type Admin = MockAdmin;
    type Storage = MockStorage;

    fn storage_client(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Self::Storage, BoxedError> {
        if self.script.fail_storage_construction {
            return Err("mock storage client construction failed".into());
        }

        self.calls.storage_constructed.fetch_add(1, Ordering::SeqCst);
        Ok(MockStorage {
            connector: self.clone(),
            endpoint: endpoint.clone(),
            credentials: credentials.clone(),
        })
    }

    fn admin_client(
        &self,
        endpoint: &Endpoint,
        credentials: &Credentials,
    ) -> Result<Self::Admin, BoxedError> {
        if self.script.fail_admin_construction {
            return Err("mock admin client construction failed".into());
        }

        self.calls.admin_constructed.fetch_add(1, Ordering::SeqCst);
        Ok(MockAdmin {
            connector: self.clone(),
            endpoint: endpoint.clone(),
            credentials: credentials.clone(),
        })
    }
}

/// Data-plane client produced by [`MockConnector`].
#[derive(Debug, Clone)]
pub struct MockStorage {
    connector: MockConnector,
    endpoint: Endpoint,
    credentials: Credentials,
}

impl MockStorage {
    /// Endpoint the client was built for.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Credentials the client was built with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl StorageApi for MockStorage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, TransportError> {
        let MockConnector { script, calls } = &self.connector;
        calls.bucket_exists.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut buckets) = calls.buckets.lock() {
            buckets.push(bucket.to_owned());
        }

        if !script.latency.is_zero() {
            tokio::time::sleep(script.latency).await;
        }

        match script.bucket_probe {
            BucketProbe::NoSuchBucket => Err(TransportError::no_such_bucket(bucket)),
            BucketProbe::Exists => Ok(true),
            BucketProbe::Missing => Ok(false),
            BucketProbe::AccessDenied => Err(TransportError::access_denied()),
            BucketProbe::Status(status) => {
                Err(TransportError::new(format!("mock bucket probe failed with status {status}"))
                    .with_status(status))
            }
            BucketProbe::Unreachable => Err(TransportError::new("mock endpoint unreachable")),
        }
    }
}

/// Admin client produced by [`MockConnector`].
#[derive(Debug, Clone)]
pub struct MockAdmin {
    connector: MockConnector,
    endpoint: Endpoint,
    credentials: Credentials,
}

impl MockAdmin {
    /// Endpoint the client was built for.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Credentials the client was built with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl AdminApi for MockAdmin {
    async fn server_info(&self) -> Result<ServerInfo, TransportError> {
        let MockConnector { script, calls } = &self.connector;
        calls.server_info.fetch_add(1, Ordering::SeqCst);

        if !script.latency.is_zero() {
            tokio::time::sleep(script.latency).await;
        }

        match script.server_info_status {
            Some(status) => Err(TransportError::new(format!(
                "mock server info failed with status {status}"
            ))
            .with_status(status)),
            None => Ok(ServerInfo {
                mode: Some("online".to_owned()),
                deployment_id: Some(self.credentials.access_key().to_owned()),
                ..ServerInfo::default()
            }),
        }
    }
}
