//! Per-request context.
//!
//! Handlers receive a [`RequestContext`] and either return a response
//! (synchronous path) or call [`suspend`](RequestContext::suspend) and
//! hand the returned [`CompletionHandle`] to whatever will eventually
//! produce the response.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{DispatchError, Result};
use crate::http::Request;

use super::completion::CompletionHandle;
use super::finalize::FinalizeCell;
use super::state::State;

/// Context for one in-flight request.
///
/// Cheaply cloneable; clones share the same lifecycle state, so the
/// state machine - not ownership - enforces that only one response is
/// ever finalized.
#[derive(Clone)]
pub struct RequestContext {
    request: Arc<Request>,
    cell: Arc<FinalizeCell>,
}

impl RequestContext {
    pub(crate) fn new(request: Request, cell: Arc<FinalizeCell>) -> Self {
        Self {
            request: Arc::new(request),
            cell,
        }
    }

    /// The inbound request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Mark this request suspended and return its completion handle.
    ///
    /// Valid only while the handler is still on the synchronous path;
    /// a second call returns [`DispatchError::AlreadySuspended`] and
    /// leaves the state untouched. The request task must return to the
    /// transport layer without writing a response after this.
    ///
    /// `timeout` is how long the transport layer should let the
    /// response stay pending; the dispatcher's watchdog competes
    /// through the ordinary `complete()` path when it fires.
    pub fn suspend(&self, timeout: Duration) -> Result<CompletionHandle> {
        if !self.cell.state.transition(State::Active, State::Suspended) {
            return Err(DispatchError::AlreadySuspended);
        }
        self.cell.set_timeout(timeout);
        tracing::debug!(
            method = self.request.method().as_str(),
            uri = self.request.uri(),
            ?timeout,
            "request suspended"
        );
        Ok(CompletionHandle::new(self.cell.clone()))
    }

    /// Whether `suspend()` has been called.
    pub fn is_suspended(&self) -> bool {
        self.cell.state.get() != State::Active
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.cell.state.get()
    }

    /// Another handle to a suspended request, or `None` while still
    /// active. Used by the dispatcher's timeout watchdog.
    pub fn completion_handle(&self) -> Option<CompletionHandle> {
        if self.is_suspended() {
            Some(CompletionHandle::new(self.cell.clone()))
        } else {
            None
        }
    }

    pub(crate) fn cell(&self) -> &Arc<FinalizeCell> {
        &self.cell
    }
}
