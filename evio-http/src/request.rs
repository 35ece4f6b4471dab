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
use std::fmt;

/// The HTTP/1.1 request-line method. `Other` carries anything this crate
/// doesn't special-case (PATCH, CONNECT, a client's typo) through
/// unmodified -- the router keys on the raw string either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Other(s) => s,
        }
    }

    pub(crate) fn parse(raw: &[u8]) -> Self {
        match raw {
            b"GET" => Method::Get,
            b"POST" => Method::Post,
            b"PUT" => Method::Put,
            b"DELETE" => Method::Delete,
            b"HEAD" => Method::Head,
            b"OPTIONS" => Method::Options,
            other => Method::Other(String::from_utf8_lossy(other).into_owned()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

/// A fully materialized HTTP/1.1 request: request line, headers, and the
/// whole body (chunked/streaming bodies are out of scope -- the
/// connection loop only ever hands the router a request once the body
/// named by `Content-Length` has fully arrived).
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub version: Version,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    /// Looks up a header by name, case-insensitively (RFC 7230 §3.2).
    /// `self.headers` stores names already lowercased by the parser, so
    /// only `name` needs folding here.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// `HTTP/1.1` defaults to persistent connections unless `Connection:
    /// close` says otherwise; `HTTP/1.0` is the opposite default.
    pub fn keep_alive(&self) -> bool {
        match self.header("Connection") {
            Some(value) => !value.eq_ignore_ascii_case("close"),
            None => self.version != Version::Http10,
        }
    }
}
