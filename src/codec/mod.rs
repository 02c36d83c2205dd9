//! Codec module - response serialization.
//!
//! Turns a finalized [`Response`](crate::http::Response) into the bytes
//! handed to the transport writer:
//!
//! - [`Http1Codec`] - HTTP/1.1 text encoding (status line, headers,
//!   `Content-Length`, body)
//!
//! # Design
//!
//! The codec is a marker struct with static methods rather than a trait
//! object. Encoding happens once, at finalization, after the
//! interceptor chain has run; nothing in the dispatch core writes raw
//! response parts directly.
//!
//! # Example
//!
//! ```
//! use http_dispatch::codec::Http1Codec;
//! use http_dispatch::http::Response;
//!
//! let bytes = Http1Codec::encode(&Response::ok("hi")).unwrap();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

mod http1;

pub use http1::Http1Codec;
