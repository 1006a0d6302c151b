//! MinIO admin API client.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jiff::Timestamp;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use url::Url;

use super::signer::{RequestSigner, SERVICE_TYPE_S3, hex_sha256};
use super::{AdminApi, ServerInfo, TransportError};
use crate::{Credentials, Endpoint, Result, TRACING_TARGET_ADMIN};

/// Default timeout for admin requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default signing region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Path of the server information endpoint.
const SERVER_INFO_PATH: &str = "minio/admin/v3/info";

/// Configuration for the admin API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClientConfig {
    /// Timeout for a single admin request.
    pub timeout: Duration,
    /// User-Agent header to send with requests.
    pub user_agent: String,
    /// Region used in request signatures.
    pub region: String,
}

impl Default for AdminClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: Self::default_user_agent(),
            region: DEFAULT_REGION.to_owned(),
        }
    }
}

impl AdminClientConfig {
    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("nvisy-connect/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the signing region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Returns the effective region, using default if empty.
    pub fn effective_region(&self) -> &str {
        if self.region.is_empty() {
            DEFAULT_REGION
        } else {
            &self.region
        }
    }
}

/// Error body returned by the admin API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AdminErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

struct AdminClientInner {
    http: Client,
    base_url: Url,
    credentials: Credentials,
    region: String,
}

/// Client for the MinIO admin API.
///
/// Requests are signed with the same credentials as the data-plane client.
/// Cloning is cheap; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

impl AdminClient {
    /// Creates an admin client for the endpoint.
    ///
    /// No connectivity is tested.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: &Endpoint,
        credentials: &Credentials,
        config: AdminClientConfig,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(&format!("{}/", endpoint.base_url())).map_err(|e| {
            TransportError::new(format!("invalid admin base URL: {e}")).with_source(e)
        })?;

        let http = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                TransportError::new(format!("failed to build admin HTTP client: {e}"))
                    .with_source(e)
            })?;

        tracing::debug!(
            target: TRACING_TARGET_ADMIN,
            endpoint = %endpoint.host(),
            secure = endpoint.is_secure(),
            timeout_ms = config.effective_timeout().as_millis(),
            "Admin client created"
        );

        let inner = AdminClientInner {
            http,
            base_url,
            credentials: credentials.clone(),
            region: config.effective_region().to_owned(),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the base URL of the admin API.
    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Sends a signed `GET` request with an empty body.
    async fn get(&self, path: &str) -> Result<reqwest::Response, TransportError> {
        let url = self.inner.base_url.join(path).map_err(|e| {
            TransportError::new(format!("invalid admin path '{path}': {e}")).with_source(e)
        })?;

        let payload_hash = hex_sha256(b"");
        let mut headers = BTreeMap::new();
        headers.insert("x-amz-content-sha256".to_owned(), payload_hash.clone());
        if let Some(token) = self.inner.credentials.session_token() {
            headers.insert("x-amz-security-token".to_owned(), token.to_owned());
        }

        let signer = RequestSigner::new(&self.inner.credentials, &self.inner.region, SERVICE_TYPE_S3);
        let authorization = signer.sign("GET", &url, &mut headers, &payload_hash, Timestamp::now());

        // reqwest derives the Host header from the URL.
        let request = headers
            .iter()
            .filter(|(name, _)| name.as_str() != "host")
            .fold(self.inner.http.get(url), |request, (name, value)| {
                request.header(name, value)
            })
            .header(AUTHORIZATION, authorization);

        let response = request.send().await.map_err(|e| {
            TransportError::new(format!("admin request failed: {e}")).with_source(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_else(|e| {
            tracing::debug!(
                target: TRACING_TARGET_ADMIN,
                error = %e,
                status = %status,
                "Failed to read admin error body"
            );
            String::new()
        });
        let mut error = TransportError::new(format!("admin API responded with {status}"))
            .with_status(status.as_u16());
        if let Ok(parsed) = serde_json::from_str::<AdminErrorBody>(&body) {
            if !parsed.message.is_empty() {
                error.message = format!("{}: {}", error.message, parsed.message);
            }
            error = error.with_code(parsed.code);
        }

        Err(error)
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn server_info(&self) -> Result<ServerInfo, TransportError> {
        let start = Instant::now();
        let response = self.get(SERVER_INFO_PATH).await.inspect_err(|e| {
            tracing::debug!(
                target: TRACING_TARGET_ADMIN,
                error = %e,
                status = ?e.status_code,
                elapsed = ?start.elapsed(),
                "Server info request failed"
            );
        })?;

        let info = response.json::<ServerInfo>().await.map_err(|e| {
            TransportError::new(format!("invalid server info response: {e}")).with_source(e)
        })?;

        tracing::debug!(
            target: TRACING_TARGET_ADMIN,
            mode = ?info.mode,
            deployment_id = ?info.deployment_id,
            servers = info.servers.len(),
            elapsed = ?start.elapsed(),
            "Server info received"
        );

        Ok(info)
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("region", &self.inner.region)
            .field("access_key", &self.inner.credentials.access_key_masked())
            .finish_non_exhaustive()
    }
}
