//! HTTP value types - opaque request/response structures.
//!
//! The dispatch core does not parse or route; it only carries these
//! values between the handler, the interceptor chain, and the codec.
//! Headers preserve insertion order so interceptors see the response
//! exactly as it will be serialized.

mod message;

pub use message::{Headers, Method, Request, Response};
