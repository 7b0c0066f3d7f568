//! Errors returned by the router and path handlers.

use crate::codec::CodecError;
use crate::policy::PolicyError;

use super::request::Operation;

/// Error type for backend request handling.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Request fields are missing or malformed.
    #[error("invalid request: {0}")]
    Validation(String),
    /// Policy list failed validation.
    #[error("invalid policies: {0}")]
    Policy(#[from] PolicyError),
    /// Stored value could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Underlying storage failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// No registered path matches.
    #[error("unsupported path: {0}")]
    UnsupportedPath(String),
    /// Path matched but does not handle the operation.
    #[error("unsupported operation {operation} on path {path}")]
    UnsupportedOperation {
        /// Request path.
        path: String,
        /// Requested operation.
        operation: Operation,
    },
    /// Request context was cancelled before the storage call.
    #[error("request cancelled")]
    Cancelled,
    /// A path pattern failed to compile.
    #[error("invalid path pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Regex compile error.
        #[source]
        source: regex_lite::Error,
    },
}

impl BackendError {
    /// Wrap a storage backend error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(err))
    }

    /// Whether the caller is at fault (as opposed to the server).
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Policy(_)
                | Self::UnsupportedPath(_)
                | Self::UnsupportedOperation { .. }
        )
    }
}
