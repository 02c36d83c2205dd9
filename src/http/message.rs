//! Request and response value types.
//!
//! These are deliberately small: the dispatch layer treats them as
//! opaque structured values that can be constructed, mutated by
//! interceptors, and handed to the codec. Parsing inbound bytes into a
//! [`Request`] is an external concern.
//!
//! # Example
//!
//! ```
//! use http_dispatch::http::{Request, Response};
//!
//! let req = Request::new("GET", "/orders/42");
//! assert_eq!(req.method().as_str(), "GET");
//!
//! let resp = Response::new(201)
//!     .header("location", "/orders/42")
//!     .body("created");
//! assert_eq!(resp.status(), 201);
//! ```

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// HTTP request method.
///
/// Stored as an owned uppercase string rather than an enum so extension
/// methods pass through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method(String);

impl Method {
    /// Create a method, normalizing to uppercase.
    pub fn new(name: &str) -> Self {
        Self(name.to_ascii_uppercase())
    }

    /// Get the method name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Method {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Ordered header collection.
///
/// Insertion order is preserved; lookups are case-insensitive on the
/// header name. Duplicate names are allowed (e.g. `set-cookie`).
#[derive(Debug, Clone, Default)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Create an empty header collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a header, keeping any existing entries with the same name.
    pub fn append(&mut self, name: &str, value: &str) {
        self.0.push((name.to_ascii_lowercase(), value.to_string()));
    }

    /// Set a header, replacing all existing entries with the same name.
    pub fn set(&mut self, name: &str, value: &str) {
        let lower = name.to_ascii_lowercase();
        self.0.retain(|(n, _)| *n != lower);
        self.0.push((lower, value.to_string()));
    }

    /// Get the first value for a header name.
    pub fn get(&self, name: &str) -> Option<&str> {
        let lower = name.to_ascii_lowercase();
        self.0
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a header with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of header entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An inbound HTTP request as seen by the dispatch layer.
///
/// Identity only - the body has already been read by the transport
/// layer and arrives as bytes.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    headers: Headers,
    body: Bytes,
}

impl Request {
    /// Create a request with an empty body and no headers.
    pub fn new(method: impl Into<Method>, uri: &str) -> Self {
        Self {
            method: method.into(),
            uri: uri.to_string(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Attach a header (builder style).
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Attach a body (builder style).
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the request URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Get the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the request body bytes.
    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }
}

/// A fully-formed HTTP response: status, headers, body.
///
/// Interceptors receive the response by value and may mutate or replace
/// it before serialization.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Create a response with the given status, no headers, empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Create a 200 response with a plain body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200).body(body)
    }

    /// Create a response with a JSON-serialized body and content type.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new(status)
            .header("content-type", "application/json")
            .body(body))
    }

    /// Attach a header (builder style), replacing same-named entries.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Attach a body (builder style).
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Set the status code in place.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Get the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the response headers mutably (for interceptors).
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Get the body bytes.
    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    /// Replace the body in place.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_normalizes_case() {
        assert_eq!(Method::new("get").as_str(), "GET");
        assert_eq!(Method::from("Post").as_str(), "POST");
    }

    #[test]
    fn test_headers_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "text/plain");

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.contains("Content-type"));
    }

    #[test]
    fn test_headers_preserve_insertion_order() {
        let mut headers = Headers::new();
        headers.append("x-first", "1");
        headers.append("x-second", "2");
        headers.append("x-third", "3");

        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["x-first", "x-second", "x-third"]);
    }

    #[test]
    fn test_headers_set_replaces_all() {
        let mut headers = Headers::new();
        headers.append("x-tag", "a");
        headers.append("x-tag", "b");
        headers.set("x-tag", "c");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-tag"), Some("c"));
    }

    #[test]
    fn test_headers_append_allows_duplicates() {
        let mut headers = Headers::new();
        headers.append("set-cookie", "a=1");
        headers.append("set-cookie", "b=2");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("set-cookie"), Some("a=1"));
    }

    #[test]
    fn test_request_builder() {
        let req = Request::new("get", "/items")
            .header("accept", "application/json")
            .body("query");

        assert_eq!(req.method().as_str(), "GET");
        assert_eq!(req.uri(), "/items");
        assert_eq!(req.headers().get("accept"), Some("application/json"));
        assert_eq!(req.body_bytes().as_ref(), b"query");
    }

    #[test]
    fn test_response_builder() {
        let resp = Response::new(404).header("x-reason", "missing").body("gone");

        assert_eq!(resp.status(), 404);
        assert_eq!(resp.headers().get("x-reason"), Some("missing"));
        assert_eq!(resp.body_bytes().as_ref(), b"gone");
    }

    #[test]
    fn test_response_json() {
        #[derive(serde::Serialize)]
        struct Payload {
            id: u32,
        }

        let resp = Response::json(201, &Payload { id: 7 }).unwrap();
        assert_eq!(resp.status(), 201);
        assert_eq!(resp.headers().get("content-type"), Some("application/json"));
        assert_eq!(resp.body_bytes().as_ref(), br#"{"id":7}"#);
    }

    #[test]
    fn test_response_mutation() {
        let mut resp = Response::ok("hello");
        resp.set_status(202);
        resp.headers_mut().set("x-processed", "yes");
        resp.set_body("world");

        assert_eq!(resp.status(), 202);
        assert_eq!(resp.headers().get("x-processed"), Some("yes"));
        assert_eq!(resp.body_bytes().as_ref(), b"world");
    }
}
