//! Connection establishment and the resulting handle.

use tokio::sync::oneshot;

use crate::transport::{
    AdminApi, AdminClient, Connector, MinioConnector, MinioStorage, StorageApi,
};
use crate::{
    ConnectContext, Credentials, Endpoint, Error, ErrorKind, Result, TRACING_TARGET_CLIENT, probe,
};

/// A validated connection to MinIO.
///
/// Holds the endpoint, the credentials, a data-plane client and an admin
/// client. It is only produced by a fully successful establishment and is
/// never modified afterwards.
#[derive(Clone)]
pub struct MinioConnection<S = MinioStorage, A = AdminClient> {
    endpoint: Endpoint,
    credentials: Credentials,
    storage: S,
    admin: A,
}

impl<S, A> MinioConnection<S, A> {
    /// Returns the endpoint the connection was established against.
    #[inline]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the credentials the connection was established with.
    #[inline]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the data-plane client.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the admin client.
    #[inline]
    pub fn admin(&self) -> &A {
        &self.admin
    }

    /// Consumes the connection, returning the data-plane and admin clients.
    pub fn into_clients(self) -> (S, A) {
        (self.storage, self.admin)
    }

    /// Establishes a connection from an already validated endpoint.
    ///
    /// Client construction and the connectivity probe run on a spawned task.
    /// This call waits for whichever comes first: the probe outcome or `ctx`
    /// being done. A context that is already done always wins. Once `ctx` is
    /// done the probe task stops at its next await point and its outcome is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns the categorized probe error, or a cancellation error if `ctx`
    /// finished first.
    pub async fn connect<C>(
        connector: C,
        ctx: &ConnectContext,
        endpoint: Endpoint,
        credentials: Credentials,
    ) -> Result<Self>
    where
        C: Connector<Storage = S, Admin = A>,
        S: StorageApi,
        A: AdminApi,
    {
        let (tx, rx) = oneshot::channel();

        let task_ctx = ctx.clone();
        let task_endpoint = endpoint.clone();
        let task_credentials = credentials.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = task_ctx.done() => return,
                outcome = probe::run(&connector, &task_endpoint, &task_credentials) => outcome,
            };

            // The receiver is gone if the caller already returned.
            let _ = tx.send(outcome);
        });

        tokio::select! {
            biased;
            reason = ctx.done() => {
                tracing::warn!(
                    target: TRACING_TARGET_CLIENT,
                    endpoint = %endpoint.host(),
                    reason = ?reason,
                    "MinIO connection attempt abandoned"
                );
                Err(Error::cancelled(reason))
            }
            outcome = rx => match outcome {
                Ok(Ok(clients)) => Ok(Self {
                    endpoint,
                    credentials,
                    storage: clients.storage,
                    admin: clients.admin,
                }),
                Ok(Err(err)) => {
                    tracing::error!(
                        target: TRACING_TARGET_CLIENT,
                        endpoint = %endpoint.host(),
                        kind = err.kind_str(),
                        error = %err,
                        "MinIO connection failed"
                    );
                    Err(err)
                }
                Err(_) => Err(Error::new(ErrorKind::Internal)),
            },
        }
    }
}

/// Establishes a validated connection to MinIO.
///
/// Uses [`MinioConnector`] with default settings. See [`establish_with`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use nvisy_connect::{ConnectContext, establish};
///
/// # async fn run() -> nvisy_connect::Result<()> {
/// let ctx = ConnectContext::new().with_timeout(Duration::from_secs(10));
/// let connection = establish(&ctx, "http://localhost:9000", "minioadmin", "minioadmin").await?;
/// println!("connected to {}", connection.endpoint());
/// # Ok(())
/// # }
/// ```
pub async fn establish(
    ctx: &ConnectContext,
    endpoint: &str,
    access_key: impl Into<String>,
    secret_key: impl Into<String>,
) -> Result<MinioConnection> {
    establish_with(MinioConnector::default(), ctx, endpoint, access_key, secret_key).await
}

/// Establishes a validated connection using the given connector.
///
/// The endpoint is validated before anything else happens: it must be a
/// non-empty `http` or `https` URL with a host. Then both clients are built
/// and probed as described on [`MinioConnection::connect`].
///
/// # Errors
///
/// Returns [`ErrorKind::Configuration`] for an invalid endpoint, without any
/// network activity. Otherwise see [`MinioConnection::connect`].
pub async fn establish_with<C: Connector>(
    connector: C,
    ctx: &ConnectContext,
    endpoint: &str,
    access_key: impl Into<String>,
    secret_key: impl Into<String>,
) -> Result<MinioConnection<C::Storage, C::Admin>> {
    let endpoint = Endpoint::parse(endpoint).inspect_err(|e| {
        tracing::error!(
            target: TRACING_TARGET_CLIENT,
            error = %e,
            "Invalid MinIO endpoint"
        );
    })?;
    let credentials = Credentials::new(access_key, secret_key);

    MinioConnection::connect(connector, ctx, endpoint, credentials).await
}

impl<S: std::fmt::Debug, A: std::fmt::Debug> std::fmt::Debug for MinioConnection<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinioConnection")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("storage", &self.storage)
            .field("admin", &self.admin)
            .finish()
    }
}
