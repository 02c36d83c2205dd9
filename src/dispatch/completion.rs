//! Completion handle for suspended requests.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{DispatchError, Result};
use crate::http::Response;

use super::finalize::FinalizeCell;
use super::state::State;

/// The sole conduit through which a suspended request's response is
/// eventually supplied.
///
/// Created by [`suspend()`](super::RequestContext::suspend) and
/// cheaply cloneable; all clones share one at-most-once completion
/// slot. Any task may call [`complete`](Self::complete) - a worker, a
/// timer, an external callback - and when several race, exactly one
/// wins and the rest observe [`DispatchError::DoubleCompletion`]
/// before touching the connection.
#[derive(Clone)]
pub struct CompletionHandle {
    cell: Arc<FinalizeCell>,
}

impl std::fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle").finish_non_exhaustive()
    }
}

impl CompletionHandle {
    pub(crate) fn new(cell: Arc<FinalizeCell>) -> Self {
        Self { cell }
    }

    /// Deliver the response and finish the request.
    ///
    /// The winner runs the full finalize sequence: interceptor chain,
    /// encoding, write, resource release. Faults from that sequence
    /// come back to this caller - with the resource released
    /// regardless. Every other call, concurrent or later, fails fast
    /// with [`DispatchError::DoubleCompletion`] and has no side
    /// effects.
    pub async fn complete(&self, response: Response) -> Result<()> {
        if !self
            .cell
            .state
            .transition(State::Suspended, State::Completing)
        {
            return Err(DispatchError::DoubleCompletion);
        }
        self.cell.finalize(response).await
    }

    /// The suspension timeout recorded by `suspend()`.
    pub fn timeout(&self) -> Option<Duration> {
        self.cell.timeout()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.cell.state.get()
    }
}
