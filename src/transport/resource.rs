//! Transport resource handle and idempotent release.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::writer::WriterHandle;

/// The underlying connection resource, as the dispatch core sees it.
///
/// Implementations need not be idempotent themselves;
/// [`ResourceGuard`] guarantees `release` is invoked at most once.
pub trait TransportResource: Send + Sync {
    /// Give the connection back to the transport layer.
    ///
    /// A fault here is surfaced to logging only; it never masks the
    /// response or the primary fault of the request.
    fn release(&self) -> io::Result<()>;
}

/// Idempotent wrapper around a [`TransportResource`].
///
/// Both the completion path and a failure path may try to release the
/// same connection; the first caller wins, every later call is a
/// no-op. Dropping an unreleased guard releases as a last resort, so a
/// suspended request whose every completion handle is dropped still
/// gives its connection back.
pub struct ResourceGuard {
    resource: Arc<dyn TransportResource>,
    released: AtomicBool,
}

impl ResourceGuard {
    /// Wrap a resource.
    pub fn new(resource: Arc<dyn TransportResource>) -> Self {
        Self {
            resource,
            released: AtomicBool::new(false),
        }
    }

    /// Release the resource if it has not been released yet.
    ///
    /// Returns `true` if this call performed the release.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Err(e) = self.resource.release() {
            tracing::warn!("transport release failed: {}", e);
        }
        true
    }

    /// Whether the resource has already been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Transport resource backed by a connection's writer task.
///
/// Releasing closes the write channel; the writer task flushes what is
/// queued and shuts the stream down.
pub struct StreamResource {
    writer: WriterHandle,
}

impl StreamResource {
    /// Wrap a writer handle as the connection resource.
    pub fn new(writer: WriterHandle) -> Self {
        Self { writer }
    }
}

impl TransportResource for StreamResource {
    fn release(&self) -> io::Result<()> {
        self.writer.close();
        Ok(())
    }
}
