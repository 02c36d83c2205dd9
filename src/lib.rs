//! # http-dispatch
//!
//! Asynchronous request/response bridge for an HTTP server-side
//! dispatch layer. A handler may suspend the task that received an
//! inbound request, compute the response later - on a timer, a worker
//! task, an external callback - and deliver it back through the
//! original connection, with the connection's resources released
//! exactly once on every path.
//!
//! ## Architecture
//!
//! - **Synchronous path**: handler returns a response; the dispatcher
//!   finalizes it on the same task.
//! - **Suspended path**: handler calls `suspend()` and hands the
//!   returned completion handle to whoever will produce the response;
//!   `complete()` re-enters the same finalize routine from any task.
//! - **Finalization** (exactly once per request): post-process
//!   interceptor chain in registration order, HTTP/1.1 encoding, write
//!   through the connection's writer task, transport release.
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use http_dispatch::{Dispatcher, Handled, RequestContext, Response};
//!
//! let dispatcher = Dispatcher::builder()
//!     .interceptor_fn("server-header", |mut resp| {
//!         resp.headers_mut().set("server", "bridge/0.2");
//!         Ok(resp)
//!     })
//!     .build();
//!
//! // Per connection: give the write half to a writer task, wrap it as
//! // the transport resource, then dispatch each parsed request.
//! let (writer, _task) = dispatcher.connect(write_half);
//! let resource = std::sync::Arc::new(
//!     http_dispatch::transport::StreamResource::new(writer.clone()),
//! );
//! let ctx = dispatcher.context(request, writer, resource);
//!
//! dispatcher
//!     .dispatch(ctx, &|ctx: RequestContext| async move {
//!         let handle = ctx.suspend(Duration::from_secs(30))?;
//!         tokio::spawn(async move {
//!             let _ = handle.complete(Response::ok("computed later")).await;
//!         });
//!         Ok(Handled::Suspended)
//!     })
//!     .await?;
//! ```

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod transport;
pub mod writer;

pub use dispatch::{
    CompletionHandle, DispatchOutcome, Dispatcher, DispatcherBuilder, Handled, Handler,
    HandlerResult, RequestContext, State,
};
pub use error::{DispatchError, Result};
pub use http::{Request, Response};
