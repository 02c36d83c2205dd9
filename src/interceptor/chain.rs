//! Ordered post-process interceptor chain.
//!
//! Interceptors are registered once, before dispatching begins, and run
//! in registration order on every finalized response - synchronous or
//! suspended path, same chain, same order. A faulting interceptor
//! aborts the chain and the partially-processed response is discarded.

use std::sync::Arc;

use crate::error::{DispatchError, Result};
use crate::http::Response;

/// A registered unit of response post-processing.
///
/// Implementations must be thread-safe: the same interceptor instance
/// runs for every request, possibly from different tasks.
pub trait PostProcessInterceptor: Send + Sync {
    /// Name used in fault reports and logs.
    fn name(&self) -> &str;

    /// Observe and possibly transform the response.
    ///
    /// Returning an error aborts the chain; the response value is
    /// consumed either way, so a faulting interceptor cannot leak a
    /// half-modified response downstream.
    fn post_process(&self, response: Response) -> Result<Response>;
}

/// Adaptor turning a closure into an interceptor.
pub struct FnInterceptor<F>
where
    F: Fn(Response) -> Result<Response> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: Fn(Response) -> Result<Response> + Send + Sync,
{
    /// Wrap a closure as a named interceptor.
    pub fn new(name: &str, func: F) -> Self {
        Self {
            name: name.to_string(),
            func,
        }
    }
}

impl<F> PostProcessInterceptor for FnInterceptor<F>
where
    F: Fn(Response) -> Result<Response> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn post_process(&self, response: Response) -> Result<Response> {
        (self.func)(response)
    }
}

/// Registration-ordered sequence of interceptors.
///
/// Built once (normally through the dispatcher builder) and shared
/// across all requests. Ordering is significant: a compression
/// interceptor declared after a content-negotiation interceptor runs
/// after it, every time.
#[derive(Default)]
pub struct InterceptorChain {
    entries: Vec<Arc<dyn PostProcessInterceptor>>,
}

impl InterceptorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an interceptor at the end of the chain.
    pub fn push(&mut self, interceptor: Arc<dyn PostProcessInterceptor>) {
        self.entries.push(interceptor);
    }

    /// Append a closure interceptor at the end of the chain.
    pub fn push_fn<F>(&mut self, name: &str, func: F)
    where
        F: Fn(Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.entries.push(Arc::new(FnInterceptor::new(name, func)));
    }

    /// Number of registered interceptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the chain over a response, in registration order.
    ///
    /// A fault from any interceptor aborts the run and surfaces as
    /// [`DispatchError::InterceptorFault`] naming the offender; the
    /// partially-processed response is dropped with it.
    pub fn run(&self, mut response: Response) -> Result<Response> {
        for entry in &self.entries {
            response = entry.post_process(response).map_err(|e| {
                DispatchError::InterceptorFault(format!("{}: {}", entry.name(), e))
            })?;
        }
        Ok(response)
    }
}
