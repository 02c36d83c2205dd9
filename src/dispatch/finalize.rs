//! The one finalize routine shared by both paths.
//!
//! Whoever wins the transition into `Completing` - the request task on
//! the synchronous path, a `complete()` caller on the suspended path -
//! runs this sequence: interceptor chain, encode, write, release. The
//! release is guaranteed on every exit: on success, on a chain or
//! serialization fault, and (through the [`ResourceGuard`] drop) even
//! if the routine unwinds or every handle is dropped uncompleted.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::codec::Http1Codec;
use crate::error::{DispatchError, Result};
use crate::http::Response;
use crate::interceptor::InterceptorChain;
use crate::transport::ResourceGuard;
use crate::writer::WriterHandle;

use super::state::{State, StateCell};

/// Shared per-request finalization state.
///
/// One cell per request, shared (via `Arc`) between the request context
/// and every completion handle cloned from it.
pub(crate) struct FinalizeCell {
    pub(crate) state: StateCell,
    chain: Arc<InterceptorChain>,
    writer: WriterHandle,
    guard: ResourceGuard,
    /// Suspension timeout, set by `suspend()`.
    timeout: Mutex<Option<Duration>>,
}

impl FinalizeCell {
    pub fn new(chain: Arc<InterceptorChain>, writer: WriterHandle, guard: ResourceGuard) -> Self {
        Self {
            state: StateCell::new(),
            chain,
            writer,
            guard,
            timeout: Mutex::new(None),
        }
    }

    pub fn set_timeout(&self, timeout: Duration) {
        *self.timeout.lock().unwrap() = Some(timeout);
    }

    pub fn timeout(&self) -> Option<Duration> {
        *self.timeout.lock().unwrap()
    }

    pub fn is_released(&self) -> bool {
        self.guard.is_released()
    }

    /// Run the finalize sequence. The caller must already hold the
    /// `Completing` state.
    ///
    /// On a fault the partial response is discarded, a best-effort 500
    /// is written if the channel still works, and the fault is returned
    /// to the caller - with the resource released either way.
    pub async fn finalize(&self, response: Response) -> Result<()> {
        let result = self.run_pipeline(response).await;

        match result {
            Ok(()) => {
                self.state.store(State::Completed);
                self.guard.release();
                Ok(())
            }
            Err(e) => {
                self.state.store(State::Failed);
                self.write_error_best_effort().await;
                self.guard.release();
                Err(e)
            }
        }
    }

    /// Interceptors, then encode, then write.
    async fn run_pipeline(&self, response: Response) -> Result<()> {
        let response = self.chain.run(response)?;
        let bytes = Http1Codec::encode(&response)?;
        self.writer
            .send(bytes)
            .await
            .map_err(|e| DispatchError::SerializationFault(e.to_string()))
    }

    /// Try to tell the client something went wrong. The plain 500 does
    /// not go back through the chain - the chain already had its one
    /// run for this response.
    async fn write_error_best_effort(&self) {
        let fallback = Response::new(500);
        match Http1Codec::encode(&fallback) {
            Ok(bytes) => {
                if self.writer.send(bytes).await.is_err() {
                    tracing::debug!("error response dropped, write channel closed");
                }
            }
            Err(e) => tracing::debug!("error response not encodable: {}", e),
        }
    }
}
