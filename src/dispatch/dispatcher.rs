//! Dispatcher - handler invocation, suspension detection, finalization.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{DispatchError, Result};
use crate::http::{Request, Response};
use crate::interceptor::{InterceptorChain, PostProcessInterceptor};
use crate::transport::{ResourceGuard, TransportResource};
use crate::writer::WriterHandle;

use super::context::RequestContext;
use super::finalize::FinalizeCell;
use super::state::State;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler did with the request.
#[derive(Debug)]
pub enum Handled {
    /// A response, produced on the request task.
    Response(Response),
    /// The handler suspended; a completion handle owns the response.
    Suspended,
}

/// Result type for handler functions.
pub type HandlerResult = Result<Handled>;

/// An external callable that, given a request context, either returns
/// a response or suspends.
pub trait Handler: Send + Sync {
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx))
    }
}

/// How a dispatch call ended, as seen by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Response written and resource released on this call.
    Completed,
    /// Response pending; a completion handle (or the timeout watchdog)
    /// will finish the request later.
    Pending,
}

/// Builder for configuring a [`Dispatcher`].
///
/// Interceptor registration happens here, ahead of time; the chain is
/// immutable once dispatching begins.
pub struct DispatcherBuilder {
    chain: InterceptorChain,
    timeout_response: Arc<dyn Fn() -> Response + Send + Sync>,
    writer_capacity: usize,
}

impl DispatcherBuilder {
    /// Create a builder with an empty chain and a plain 503 timeout
    /// response.
    pub fn new() -> Self {
        Self {
            chain: InterceptorChain::new(),
            timeout_response: Arc::new(|| Response::new(503).body("request timed out")),
            writer_capacity: crate::writer::DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Append a post-process interceptor. Registration order is
    /// invocation order.
    pub fn interceptor(mut self, interceptor: Arc<dyn PostProcessInterceptor>) -> Self {
        self.chain.push(interceptor);
        self
    }

    /// Append a closure interceptor.
    pub fn interceptor_fn<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.chain.push_fn(name, func);
        self
    }

    /// Response the timeout watchdog delivers when a suspension
    /// expires. Default: 503.
    pub fn timeout_response<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Response + Send + Sync + 'static,
    {
        self.timeout_response = Arc::new(factory);
        self
    }

    /// Channel capacity for per-connection writer tasks spawned via
    /// [`Dispatcher::connect`].
    pub fn writer_capacity(mut self, capacity: usize) -> Self {
        self.writer_capacity = capacity;
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            chain: Arc::new(self.chain),
            timeout_response: self.timeout_response,
            writer_capacity: self.writer_capacity,
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates one request: runs the handler, detects suspension, and
/// guarantees the exactly-once finalize/release discipline on every
/// path.
#[derive(Clone)]
pub struct Dispatcher {
    chain: Arc<InterceptorChain>,
    timeout_response: Arc<dyn Fn() -> Response + Send + Sync>,
    writer_capacity: usize,
}

impl Dispatcher {
    /// Create a dispatcher builder.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Spawn a writer task for a connection's write half, using the
    /// configured channel capacity.
    pub fn connect<W>(
        &self,
        write_half: W,
    ) -> (WriterHandle, tokio::task::JoinHandle<Result<()>>)
    where
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        crate::writer::spawn_writer_task(write_half, self.writer_capacity)
    }

    /// Build the context for an inbound request on the given
    /// connection. The resource is guarded from this point on: it will
    /// be released exactly once, whatever happens next.
    pub fn context(
        &self,
        request: Request,
        writer: WriterHandle,
        resource: Arc<dyn TransportResource>,
    ) -> RequestContext {
        let cell = FinalizeCell::new(
            self.chain.clone(),
            writer,
            ResourceGuard::new(resource),
        );
        RequestContext::new(request, Arc::new(cell))
    }

    /// Run the handler for one request and finish - or arrange to
    /// finish - the response.
    ///
    /// Synchronous path: the handler's response (or a generated error
    /// response, if it faulted) is finalized here and the resource
    /// released before this returns. Suspended path: returns
    /// [`DispatchOutcome::Pending`] and spawns the timeout watchdog;
    /// finalization happens through the completion handle.
    pub async fn dispatch<H: Handler + ?Sized>(
        &self,
        ctx: RequestContext,
        handler: &H,
    ) -> Result<DispatchOutcome> {
        match handler.call(ctx.clone()).await {
            Ok(Handled::Response(response)) => {
                if ctx.cell().state.transition(State::Active, State::Completing) {
                    ctx.cell().finalize(response).await?;
                    Ok(DispatchOutcome::Completed)
                } else {
                    // Handler suspended and then also returned a
                    // response; the handle owns finalization, this
                    // response is dropped.
                    tracing::warn!(
                        uri = ctx.request().uri(),
                        "handler returned a response after suspending; response dropped"
                    );
                    self.arm_watchdog(&ctx);
                    Ok(DispatchOutcome::Pending)
                }
            }
            Ok(Handled::Suspended) => {
                if !ctx.is_suspended() {
                    // Claimed suspension without calling suspend().
                    return self
                        .fail_sync(&ctx, "handler reported suspension without suspending")
                        .await;
                }
                self.arm_watchdog(&ctx);
                Ok(DispatchOutcome::Pending)
            }
            Err(e) => {
                if ctx.is_suspended() {
                    // The handle outlives the handler fault; it still
                    // owns finalization.
                    tracing::warn!(uri = ctx.request().uri(), error = %e, "handler faulted after suspending");
                    self.arm_watchdog(&ctx);
                    return Ok(DispatchOutcome::Pending);
                }
                self.fail_sync(&ctx, &e.to_string()).await
            }
        }
    }

    /// Synchronous-path handler fault: finalize a generated 500 so the
    /// client hears something, release the resource, surface the fault.
    async fn fail_sync(&self, ctx: &RequestContext, reason: &str) -> Result<DispatchOutcome> {
        tracing::error!(uri = ctx.request().uri(), "handler fault: {}", reason);
        if ctx.cell().state.transition(State::Active, State::Completing) {
            let error_response = Response::new(500).body("internal server error");
            if let Err(e) = ctx.cell().finalize(error_response).await {
                tracing::debug!("error response finalization failed: {}", e);
            }
        }
        Err(DispatchError::HandlerFault(reason.to_string()))
    }

    /// Spawn the timeout watchdog for a suspended request.
    ///
    /// Competes through the ordinary `complete()` path, so a watchdog
    /// racing a legitimate late completion is resolved by the same
    /// single-winner rule as everything else.
    fn arm_watchdog(&self, ctx: &RequestContext) {
        let Some(handle) = ctx.completion_handle() else {
            return;
        };
        let Some(timeout) = handle.timeout() else {
            return;
        };
        let factory = self.timeout_response.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            match handle.complete(factory()).await {
                Ok(()) => tracing::warn!(?timeout, "suspended request timed out"),
                Err(DispatchError::DoubleCompletion) => {
                    tracing::debug!("request completed before timeout");
                }
                Err(e) => tracing::error!("timeout finalization failed: {}", e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StreamResource;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};

    fn plumbing(
        dispatcher: &Dispatcher,
        request: Request,
    ) -> (RequestContext, DuplexStream) {
        let (client, server) = duplex(64 * 1024);
        let (writer, _task) = dispatcher.connect(client);
        let resource: Arc<dyn TransportResource> =
            Arc::new(StreamResource::new(writer.clone()));
        (dispatcher.context(request, writer, resource), server)
    }

    async fn read_all(mut server: DuplexStream) -> String {
        let mut out = Vec::new();
        server.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_sync_path_completes() {
        let dispatcher = Dispatcher::builder().build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("GET", "/hello"));

        let outcome = dispatcher
            .dispatch(ctx, &|_ctx: RequestContext| async {
                Ok(Handled::Response(Response::ok("hello world")))
            })
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Completed);
        let text = read_all(server).await;
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("hello world"));
    }

    #[tokio::test]
    async fn test_sync_path_runs_interceptors() {
        let dispatcher = Dispatcher::builder()
            .interceptor_fn("stamp", |mut resp| {
                resp.headers_mut().set("x-bridge", "yes");
                Ok(resp)
            })
            .build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("GET", "/"));

        dispatcher
            .dispatch(ctx, &|_ctx: RequestContext| async {
                Ok(Handled::Response(Response::ok("ok")))
            })
            .await
            .unwrap();

        let text = read_all(server).await;
        assert!(text.contains("x-bridge: yes\r\n"));
    }

    #[tokio::test]
    async fn test_suspended_path_completes_later() {
        let dispatcher = Dispatcher::builder().build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("POST", "/jobs"));

        let outcome = dispatcher
            .dispatch(ctx, &|ctx: RequestContext| async move {
                let handle = ctx.suspend(Duration::from_secs(30))?;
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    handle
                        .complete(Response::new(201).body("queued"))
                        .await
                        .unwrap();
                });
                Ok(Handled::Suspended)
            })
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Pending);
        let text = read_all(server).await;
        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(text.ends_with("queued"));
    }

    #[tokio::test]
    async fn test_handler_fault_writes_500_and_reports() {
        let dispatcher = Dispatcher::builder().build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("GET", "/boom"));

        let err = dispatcher
            .dispatch(ctx, &|_ctx: RequestContext| async {
                Err(DispatchError::HandlerFault("db unavailable".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::HandlerFault(_)));
        let text = read_all(server).await;
        assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[tokio::test]
    async fn test_claimed_suspension_without_suspend_is_fault() {
        let dispatcher = Dispatcher::builder().build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("GET", "/liar"));

        let err = dispatcher
            .dispatch(ctx, &|_ctx: RequestContext| async {
                Ok(Handled::Suspended)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::HandlerFault(_)));
        let text = read_all(server).await;
        assert!(text.starts_with("HTTP/1.1 500"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_times_out_suspension() {
        let dispatcher = Dispatcher::builder().build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("GET", "/slow"));
        let late = Arc::new(std::sync::Mutex::new(None));
        let late_slot = late.clone();

        dispatcher
            .dispatch(ctx, &move |ctx: RequestContext| {
                let late_slot = late_slot.clone();
                async move {
                    let handle = ctx.suspend(Duration::from_secs(30))?;
                    *late_slot.lock().unwrap() = Some(handle);
                    Ok(Handled::Suspended)
                }
            })
            .await
            .unwrap();

        // Fire the watchdog.
        tokio::time::sleep(Duration::from_secs(31)).await;

        let text = read_all(server).await;
        assert!(text.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
        assert!(text.ends_with("request timed out"));

        // A late legitimate completion loses cleanly.
        let handle = late.lock().unwrap().take().unwrap();
        let err = handle.complete(Response::ok("too late")).await.unwrap_err();
        assert!(matches!(err, DispatchError::DoubleCompletion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_loses_to_real_completion() {
        let dispatcher = Dispatcher::builder()
            .timeout_response(|| Response::new(503).body("expired"))
            .build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("GET", "/fast-enough"));

        dispatcher
            .dispatch(ctx, &|ctx: RequestContext| async move {
                let handle = ctx.suspend(Duration::from_secs(30))?;
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    handle.complete(Response::new(201).body("on time")).await.unwrap();
                });
                Ok(Handled::Suspended)
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;

        let text = read_all(server).await;
        assert_eq!(text.matches("HTTP/1.1").count(), 1);
        assert!(text.starts_with("HTTP/1.1 201"));
        assert!(text.ends_with("on time"));
    }

    #[tokio::test]
    async fn test_interceptor_fault_on_sync_path_surfaces() {
        let dispatcher = Dispatcher::builder()
            .interceptor_fn("veto", |_| {
                Err(DispatchError::HandlerFault("not today".into()))
            })
            .build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("GET", "/vetoed"));

        let err = dispatcher
            .dispatch(ctx, &|_ctx: RequestContext| async {
                Ok(Handled::Response(Response::ok("fine")))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::InterceptorFault(_)));
        // Best-effort 500 instead of the vetoed response.
        let text = read_all(server).await;
        assert!(text.starts_with("HTTP/1.1 500"));
        assert!(!text.contains("fine"));
    }

    #[tokio::test]
    async fn test_builder_chain_order() {
        let dispatcher = Dispatcher::builder()
            .interceptor_fn("first", |mut resp| {
                resp.headers_mut().set("x-order", "1");
                Ok(resp)
            })
            .interceptor_fn("second", |mut resp| {
                let prev = resp.headers().get("x-order").unwrap_or("").to_string();
                resp.headers_mut().set("x-order", &format!("{prev},2"));
                Ok(resp)
            })
            .build();
        let (ctx, server) = plumbing(&dispatcher, Request::new("GET", "/"));

        dispatcher
            .dispatch(ctx, &|_ctx: RequestContext| async {
                Ok(Handled::Response(Response::ok("")))
            })
            .await
            .unwrap();

        let text = read_all(server).await;
        assert!(text.contains("x-order: 1,2\r\n"));
    }
}
