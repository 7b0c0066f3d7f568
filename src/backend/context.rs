//! Request-scoped context passed into every handler.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::BackendError;

/// Per-request context.
///
/// Clones share the cancellation token, so a clone handed to a signal handler
/// can cancel the request it was taken from.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Create a context with a fresh request id.
    pub fn new() -> Self {
        Self::with_request_id(Uuid::new_v4())
    }

    /// Create a context with a caller-supplied request id.
    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            cancel: CancellationToken::new(),
        }
    }

    /// Request identifier, for log correlation.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Cancel the request.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the request is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Drive a storage call, abandoning it if the request is cancelled.
    ///
    /// An already-cancelled context never polls `call`. Dropping the call
    /// mid-flight leaves the outcome to the storage backend; the caller
    /// always sees `BackendError::Cancelled`.
    pub async fn run<F, T, E>(&self, call: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BackendError::Cancelled),
            result = call => result.map_err(BackendError::storage),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
