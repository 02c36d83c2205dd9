//! Dispatch module - the suspend/complete bridge.
//!
//! Provides:
//! - [`RequestContext`] - per-request state, `suspend()` entry point
//! - [`CompletionHandle`] - the sole conduit for resuming a suspended
//!   request from any task
//! - [`Dispatcher`] - handler invocation, suspension detection, and the
//!   finalize routine with its exactly-once release guarantee
//!
//! # Lifecycle
//!
//! ```text
//! ACTIVE ──suspend()──► SUSPENDED ──complete()──► COMPLETING ─► COMPLETED
//!    │                                                │
//!    └──────────── handler returns ──────────────►────┴─(fault)─► FAILED
//! ```
//!
//! Exactly one finalize sequence (interceptors → encode → write →
//! release) runs per request; the `SUSPENDED → COMPLETING` edge is a
//! single-winner compare-and-swap, so concurrent completion attempts,
//! including the timeout watchdog, resolve without special cases.
//!
//! # Example
//!
//! ```ignore
//! use http_dispatch::dispatch::{Dispatcher, Handled};
//!
//! let dispatcher = Dispatcher::builder()
//!     .interceptor_fn("stamp", |mut resp| {
//!         resp.headers_mut().set("x-bridge", "1");
//!         Ok(resp)
//!     })
//!     .build();
//!
//! let outcome = dispatcher
//!     .dispatch(request, writer, resource, &|ctx: RequestContext| async move {
//!         let handle = ctx.suspend(Duration::from_secs(30))?;
//!         tokio::spawn(async move {
//!             // compute elsewhere, deliver later
//!             let _ = handle.complete(Response::ok("done")).await;
//!         });
//!         Ok(Handled::Suspended)
//!     })
//!     .await?;
//! ```

mod completion;
mod context;
mod dispatcher;
mod finalize;
mod state;

pub use completion::CompletionHandle;
pub use context::RequestContext;
pub use dispatcher::{
    BoxFuture, DispatchOutcome, Dispatcher, DispatcherBuilder, Handled, Handler, HandlerResult,
};
pub use state::State;
