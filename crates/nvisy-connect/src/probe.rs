//! The connectivity probe run by the establisher.

use std::time::Instant;

use uuid::Uuid;

use crate::transport::{AdminApi, Connector, StorageApi, TransportErrorKind};
use crate::{Credentials, Endpoint, Error, ErrorKind, Result, TRACING_TARGET_PROBE};

/// Message carried by [`ErrorKind::Authorization`] errors.
pub(crate) const ACCESS_DENIED: &str = "Access Denied";

/// Clients that passed the probe.
pub(crate) struct ProbedClients<S, A> {
    pub storage: S,
    pub admin: A,
}

/// Builds both clients and checks that the server answers with these credentials.
///
/// Steps run strictly in order and stop at the first failure:
/// 1. construct the data-plane client,
/// 2. construct the admin client,
/// 3. fetch admin server info,
/// 4. check a random bucket name that should not exist.
///
/// A "no such bucket" answer to step 4 is the expected success.
pub(crate) async fn run<C: Connector>(
    connector: &C,
    endpoint: &Endpoint,
    credentials: &Credentials,
) -> Result<ProbedClients<C::Storage, C::Admin>> {
    let start = Instant::now();
    tracing::debug!(
        target: TRACING_TARGET_PROBE,
        endpoint = %endpoint.host(),
        secure = endpoint.is_secure(),
        "Connecting to MinIO"
    );

    let storage = connector
        .storage_client(endpoint, credentials)
        .map_err(|e| Error::new(ErrorKind::ClientConstruction).with_source(e))?;

    let admin = connector
        .admin_client(endpoint, credentials)
        .map_err(|e| Error::new(ErrorKind::AdminConstruction).with_source(e))?;

    let info = admin
        .server_info()
        .await
        .map_err(|e| Error::new(ErrorKind::AdminConnectivity).with_source(e))?;

    tracing::debug!(
        target: TRACING_TARGET_PROBE,
        mode = ?info.mode,
        deployment_id = ?info.deployment_id,
        "Admin API reachable"
    );

    let bucket = Uuid::new_v4().to_string();
    match storage.bucket_exists(&bucket).await {
        Ok(exists) => {
            tracing::debug!(
                target: TRACING_TARGET_PROBE,
                bucket = %bucket,
                exists,
                "Probe bucket check succeeded"
            );
        }
        Err(err) => match err.kind() {
            TransportErrorKind::NoSuchBucket => {
                tracing::debug!(
                    target: TRACING_TARGET_PROBE,
                    bucket = %bucket,
                    "Probe bucket does not exist"
                );
            }
            TransportErrorKind::AccessDenied => {
                return Err(Error::new(ErrorKind::Authorization)
                    .with_message(ACCESS_DENIED)
                    .with_source(err));
            }
            TransportErrorKind::Other => {
                return Err(Error::new(ErrorKind::Connectivity).with_source(err));
            }
        },
    }

    tracing::info!(
        target: TRACING_TARGET_PROBE,
        endpoint = %endpoint.host(),
        elapsed = ?start.elapsed(),
        "Successfully connected to MinIO"
    );

    Ok(ProbedClients { storage, admin })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{BucketProbe, MockConnector};

    fn endpoint() -> Endpoint {
        Endpoint::parse("http://localhost:9000").unwrap()
    }

    fn credentials() -> Credentials {
        Credentials::new("access", "secret")
    }

    #[tokio::test]
    async fn test_probe_uses_fresh_uuid_bucket() {
        let connector = MockConnector::new();
        run(&connector, &endpoint(), &credentials()).await.unwrap();
        run(&connector, &endpoint(), &credentials()).await.unwrap();

        let buckets = connector.probed_buckets();
        assert_eq!(buckets.len(), 2);
        assert_ne!(buckets[0], buckets[1]);
        for bucket in &buckets {
            assert!(Uuid::parse_str(bucket).is_ok());
        }
    }

    #[tokio::test]
    async fn test_steps_stop_at_admin_construction() {
        let connector = MockConnector::new().fail_admin_construction();
        let err = run(&connector, &endpoint(), &credentials())
            .await
            .err()
            .unwrap();

        assert_eq!(err.kind(), ErrorKind::AdminConstruction);
        assert_eq!(connector.storage_constructed(), 1);
        assert_eq!(connector.admin_constructed(), 0);
        assert_eq!(connector.server_info_calls(), 0);
        assert_eq!(connector.bucket_exists_calls(), 0);
    }

    #[tokio::test]
    async fn test_admin_failure_wraps_admin_error() {
        let connector = MockConnector::new().fail_server_info(500);
        let err = run(&connector, &endpoint(), &credentials())
            .await
            .err()
            .unwrap();

        assert_eq!(err.kind(), ErrorKind::AdminConnectivity);
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(source.contains("server info"));
        assert_eq!(connector.bucket_exists_calls(), 0);
    }

    #[tokio::test]
    async fn test_other_bucket_failure_is_connectivity() {
        let connector = MockConnector::new().with_bucket_probe(BucketProbe::Status(500));
        let err = run(&connector, &endpoint(), &credentials())
            .await
            .err()
            .unwrap();

        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert!(std::error::Error::source(&err).is_some());
    }
}
