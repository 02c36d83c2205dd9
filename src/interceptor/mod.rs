//! Interceptor module - ordered response post-processing.
//!
//! Provides:
//! - [`PostProcessInterceptor`] - runs once per finalized response,
//!   before the body is serialized
//! - [`FnInterceptor`] - closure adaptor
//! - [`InterceptorChain`] - registration-ordered invocation
//!
//! # Example
//!
//! ```ignore
//! use http_dispatch::interceptor::InterceptorChain;
//!
//! let mut chain = InterceptorChain::new();
//! chain.push_fn("stamp", |mut resp| {
//!     resp.headers_mut().set("x-served-by", "bridge");
//!     Ok(resp)
//! });
//! ```

mod chain;

pub use chain::{FnInterceptor, InterceptorChain, PostProcessInterceptor};
