//! HTTP/1.1 response encoding.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{DispatchError, Result};
use crate::http::Response;

/// Codec producing HTTP/1.1 wire bytes from a [`Response`].
pub struct Http1Codec;

impl Http1Codec {
    /// Encode a finalized response.
    ///
    /// Emits the status line, all headers in insertion order, an
    /// automatic `Content-Length` (unless the response already set
    /// one), a blank line, and the body. Header names and values
    /// containing CR or LF are rejected as a serialization fault.
    pub fn encode(response: &Response) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(128 + response.body_bytes().len());

        buf.put_slice(b"HTTP/1.1 ");
        buf.put_slice(response.status().to_string().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(reason_phrase(response.status()).as_bytes());
        buf.put_slice(b"\r\n");

        for (name, value) in response.headers().iter() {
            validate_header(name, value)?;
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }

        if !response.headers().contains("content-length") {
            buf.put_slice(b"content-length: ");
            buf.put_slice(response.body_bytes().len().to_string().as_bytes());
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"\r\n");
        buf.put_slice(response.body_bytes());

        Ok(buf.freeze())
    }
}

/// Reject header names/values that would break framing.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || name.bytes().any(|b| b == b'\r' || b == b'\n' || b == b':') {
        return Err(DispatchError::SerializationFault(format!(
            "invalid header name: {name:?}"
        )));
    }
    if value.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(DispatchError::SerializationFault(format!(
            "invalid header value for {name}: {value:?}"
        )));
    }
    Ok(())
}

/// Reason phrase for common status codes.
fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
