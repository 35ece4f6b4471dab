/*
 *   Copyright (c) 2024 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

use std::collections::HashMap;

use evio_core::ByteBuffer;

/// An HTTP/1.1 response a route handler builds and the connection loop
/// serializes onto the wire. `Content-Length` is always derived from
/// `body.len()` rather than tracked separately -- there's no way for it
/// to drift out of sync with what actually gets written.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Appends the status line, headers, and body to `buf` in wire order.
    pub fn serialize(&self, buf: &mut ByteBuffer) {
        buf.append(b"HTTP/1.1 ");
        buf.append(self.status.to_string().as_bytes());
        buf.append(b" ");
        buf.append(status_phrase(self.status).as_bytes());
        buf.append(b"\r\n");

        buf.append(b"Content-Length: ");
        buf.append(self.body.len().to_string().as_bytes());
        buf.append(b"\r\n");

        for (name, value) in &self.headers {
            buf.append(name.as_bytes());
            buf.append(b": ");
            buf.append(value.as_bytes());
            buf.append(b"\r\n");
        }
        buf.append(b"\r\n");
        buf.append(&self.body);
    }
}

/// The reason phrase for a status code, matching the subset of
/// IANA-registered phrases a small HTTP/1.1 server is likely to emit.
/// Unrecognized codes get a generic placeholder rather than an empty
/// reason phrase, which some clients treat as malformed.
pub fn status_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        411 => "Length Required",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        426 => "Upgrade Required",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "Unknown Status",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_writes_status_line_headers_and_body() {
        let response = Response::ok()
            .with_body(Vec::from(&b"hi"[..]))
            .with_header("X-Test", "1");
        let mut buf = ByteBuffer::new();
        response.serialize(&mut buf);
        let text = String::from_utf8(buf.as_slice().to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.contains("X-Test: 1\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));
    }

    #[test]
    fn not_found_uses_404_status_line() {
        let mut buf = ByteBuffer::new();
        Response::not_found().serialize(&mut buf);
        let text = String::from_utf8(buf.as_slice().to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }
}
