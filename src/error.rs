//! Error types for http-dispatch.

use thiserror::Error;

/// Main error type for all dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// I/O error while writing to the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (body helpers only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `suspend()` called more than once on the same request.
    #[error("request already suspended")]
    AlreadySuspended,

    /// `complete()` called after the request was already finalized
    /// (or while another caller is finalizing it).
    #[error("response already completed")]
    DoubleCompletion,

    /// An interceptor in the post-process chain faulted; the chain was
    /// aborted and the partial response discarded.
    #[error("interceptor fault: {0}")]
    InterceptorFault(String),

    /// Encoding or writing the finalized response failed.
    #[error("serialization fault: {0}")]
    SerializationFault(String),

    /// The handler itself faulted before producing a response or
    /// suspending (synchronous path only).
    #[error("handler fault: {0}")]
    HandlerFault(String),

    /// The connection's write channel is gone.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using DispatchError.
pub type Result<T> = std::result::Result<T, DispatchError>;
