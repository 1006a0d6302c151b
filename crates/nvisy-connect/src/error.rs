//! Error types for connection establishment.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

use crate::context::CancelReason;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Specialized [`Result`] type for connection establishment.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of failures that can end an establishment attempt.
///
/// Every kind is fatal for the attempt. Nothing is retried internally; the
/// caller decides whether to call [`establish`](crate::establish) again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Empty or malformed endpoint, or an unsupported URL scheme.
    ///
    /// Detected before any network activity.
    Configuration,
    /// The data-plane client could not be constructed.
    ClientConstruction,
    /// The admin client could not be constructed.
    AdminConstruction,
    /// The admin server-info probe failed.
    AdminConnectivity,
    /// The data-plane probe was rejected with HTTP 403.
    Authorization,
    /// The data-plane probe failed for any other reason.
    Connectivity,
    /// The caller cancelled the context.
    Cancelled,
    /// The context deadline elapsed before the probe completed.
    DeadlineExceeded,
    /// The probe task terminated without reporting an outcome.
    Internal,
}

impl ErrorKind {
    /// Returns a short description of the phase that failed.
    pub fn description(self) -> &'static str {
        match self {
            Self::Configuration => "invalid MinIO configuration",
            Self::ClientConstruction => "creating a MinIO client failed",
            Self::AdminConstruction => "creating an admin client failed",
            Self::AdminConnectivity => "admin client failed to connect to MinIO",
            Self::Authorization | Self::Connectivity => "connection to MinIO failed",
            Self::Cancelled => "connection attempt cancelled",
            Self::DeadlineExceeded => "connection attempt deadline exceeded",
            Self::Internal => "connection probe terminated unexpectedly",
        }
    }
}

/// A structured error returned by connection establishment.
#[derive(Debug, Error)]
#[error("{}{}", .kind.description(), .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
#[must_use = "errors should be handled appropriately"]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration).with_message(message)
    }

    /// Creates the error reported when the context finished first.
    pub fn cancelled(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Cancelled => Self::new(ErrorKind::Cancelled),
            CancelReason::DeadlineExceeded => Self::new(ErrorKind::DeadlineExceeded),
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns the message attached to this error, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns whether this error indicates a configuration issue.
    pub fn is_configuration(&self) -> bool {
        self.kind == ErrorKind::Configuration
    }

    /// Returns whether the server rejected the credentials.
    pub fn is_authorization(&self) -> bool {
        self.kind == ErrorKind::Authorization
    }

    /// Returns whether the attempt ended because the context was done.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled | ErrorKind::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_phase_and_message() {
        let err = Error::new(ErrorKind::Authorization).with_message("Access Denied");
        assert_eq!(err.to_string(), "connection to MinIO failed: Access Denied");

        let err = Error::new(ErrorKind::Cancelled);
        assert_eq!(err.to_string(), "connection attempt cancelled");
    }

    #[test]
    fn test_kind_str() {
        let err = Error::new(ErrorKind::AdminConnectivity);
        assert_eq!(err.kind_str(), "admin_connectivity");
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(Error::cancelled(CancelReason::Cancelled).is_cancellation());
        assert_eq!(
            Error::cancelled(CancelReason::DeadlineExceeded).kind(),
            ErrorKind::DeadlineExceeded
        );
        assert!(!Error::configuration("bad").is_cancellation());
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::other("connection reset");
        let err = Error::new(ErrorKind::Connectivity).with_source(io);
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("connection reset"));
    }
}
