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

//! Request-line and header tokenizing, built on `nom`'s `complete`
//! combinators.
//!
//! This parser is whole-message, not incremental: it only ever runs once
//! the connection loop's buffer already contains a full `\r\n\r\n`
//! header terminator, and reports "not enough yet" for everything up to
//! that point by scanning for the terminator first rather than by
//! threading `nom::Err::Incomplete` through (the `complete` parsers never
//! produce it -- that variant is for `streaming` combinators this crate
//! doesn't use). Once headers are complete, `Content-Length` says how
//! many more bytes the body needs; chunked transfer encoding is not
//! recognized.

use std::collections::HashMap;

use nom::bytes::complete::{tag, take_until, take_while1};
use nom::character::complete::{char, space0};
use nom::sequence::tuple;
use nom::IResult;

use crate::error::{HttpError, Result};
use crate::request::{Method, Request, Version};

/// A fully parsed request plus how many bytes of the input it consumed.
pub struct Parsed {
    pub request: Request,
    pub consumed: usize,
}

/// Tries to parse one request out of the front of `input`. Returns
/// `Ok(None)` when `input` doesn't yet contain a complete request (the
/// caller should read more and try again), `Err` for a genuinely
/// malformed request, and `Ok(Some(Parsed))` otherwise.
///
/// `max_body_len` bounds how large a `Content-Length` this connection
/// will honor before giving up -- without it, a malicious or buggy
/// client's declared length would make the loop buffer an unbounded
/// amount of memory before ever reporting incompleteness.
pub fn parse(input: &[u8], max_body_len: usize) -> Result<Option<Parsed>> {
    let Some(header_end) = find_header_terminator(input) else {
        return Ok(None);
    };
    let head = &input[..header_end];

    let (rest, (method, path, version)) =
        request_line(head).map_err(|_| HttpError::InvalidRequestLine)?;
    let (_, headers) = headers(rest).map_err(|_| HttpError::InvalidHeader)?;

    let body_len = match headers.get("content-length") {
        Some(value) => value.trim().parse::<usize>().map_err(|_| HttpError::InvalidContentLength)?,
        None => 0,
    };
    if body_len > max_body_len {
        return Err(HttpError::BodyTooLarge(max_body_len));
    }

    let body_start = header_end + 4; // past "\r\n\r\n"
    let body_end = body_start + body_len;
    if input.len() < body_end {
        return Ok(None);
    }

    Ok(Some(Parsed {
        request: Request {
            method,
            path,
            version,
            headers,
            body: input[body_start..body_end].to_vec(),
        },
        consumed: body_end,
    }))
}

/// Index of the start of the `\r\n\r\n` that ends the header block, if
/// one is present yet.
fn find_header_terminator(input: &[u8]) -> Option<usize> {
    input.windows(4).position(|w| w == b"\r\n\r\n")
}

fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}

fn method(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(is_token_char)(input)
}

fn request_target(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(|b: u8| b != b' ')(input)
}

fn http_version(input: &[u8]) -> IResult<&[u8], Version> {
    let (input, _) = tag("HTTP/1.")(input)?;
    let (input, minor) = nom::bytes::complete::take(1usize)(input)?;
    let version = match minor {
        b"1" => Version::Http11,
        b"0" => Version::Http10,
        _ => {
            return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )))
        }
    };
    Ok((input, version))
}

fn request_line(input: &[u8]) -> IResult<&[u8], (Method, String, Version)> {
    let (input, (raw_method, _, raw_target, _, version, _)) = tuple((
        method,
        char(' '),
        request_target,
        char(' '),
        http_version,
        tag("\r\n"),
    ))(input)?;
    Ok((
        input,
        (
            Method::parse(raw_method),
            String::from_utf8_lossy(raw_target).into_owned(),
            version,
        ),
    ))
}

/// Header field names are case-insensitive (RFC 7230 §3.2); normalizing to
/// lowercase here means every lookup downstream -- `Request::header`,
/// `Request::keep_alive`, and this module's own `Content-Length` check --
/// can compare against a plain lowercase literal instead of re-deriving
/// case-insensitivity at each call site.
fn header_line(input: &[u8]) -> IResult<&[u8], (String, String)> {
    let (input, name) = take_while1(|b: u8| b != b':' && b != b'\r' && b != b'\n')(input)?;
    let (input, _) = char(':')(input)?;
    let (input, _) = space0(input)?;
    let (input, value) = take_until("\r\n")(input)?;
    let (input, _) = tag("\r\n")(input)?;
    Ok((
        input,
        (
            String::from_utf8_lossy(name).to_lowercase(),
            String::from_utf8_lossy(value).into_owned(),
        ),
    ))
}

/// Parses header lines up to (and consuming) the blank-line terminator.
/// Assumes the caller already confirmed a `\r\n\r\n` exists somewhere
/// ahead, so running off the end of `input` here means a malformed
/// header, not incompleteness.
fn headers(mut input: &[u8]) -> IResult<&[u8], HashMap<String, String>> {
    let mut map = HashMap::new();
    loop {
        if let Some(rest) = input.strip_prefix(b"\r\n") {
            return Ok((rest, map));
        }
        let (rest, (name, value)) = header_line(input)?;
        map.insert(name, value);
        input = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_get_with_no_body() {
        let raw = b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let parsed = parse(raw, 1024).unwrap().expect("request should be complete");
        assert_eq!(parsed.request.method, Method::Get);
        assert_eq!(parsed.request.path, "/hello");
        assert_eq!(parsed.request.version, Version::Http11);
        assert_eq!(parsed.request.header("Host"), Some("localhost"));
        assert!(parsed.request.body.is_empty());
        assert_eq!(parsed.consumed, raw.len());
    }

    #[test]
    fn parses_a_post_with_content_length_body() {
        let raw = b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let parsed = parse(raw, 1024).unwrap().expect("request should be complete");
        assert_eq!(parsed.request.method, Method::Post);
        assert_eq!(parsed.request.body, b"hello");
        assert_eq!(parsed.consumed, raw.len());
    }

    #[test]
    fn incomplete_headers_report_none_not_an_error() {
        let raw = b"GET /hello HTTP/1.1\r\nHost: loc";
        assert!(parse(raw, 1024).unwrap().is_none());
    }

    #[test]
    fn body_not_fully_arrived_yet_reports_none() {
        let raw = b"POST /echo HTTP/1.1\r\nContent-Length: 10\r\n\r\nhel";
        assert!(parse(raw, 1024).unwrap().is_none());
    }

    #[test]
    fn a_second_request_can_start_right_after_the_first_consumed_bytes() {
        let raw = b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
        let first = parse(raw, 1024).unwrap().expect("first request");
        assert_eq!(first.request.path, "/a");
        let second = parse(&raw[first.consumed..], 1024).unwrap().expect("second request");
        assert_eq!(second.request.path, "/b");
    }

    #[test]
    fn body_larger_than_the_connection_limit_is_rejected() {
        let raw = b"POST /big HTTP/1.1\r\nContent-Length: 999999\r\n\r\n";
        match parse(raw, 1024) {
            Err(HttpError::BodyTooLarge(1024)) => {}
            other => panic!("expected BodyTooLarge(1024), got {other:?}"),
        }
    }

    #[test]
    fn malformed_request_line_is_rejected() {
        let raw = b"NOT A REQUEST LINE\r\n\r\n";
        assert!(matches!(parse(raw, 1024), Err(HttpError::InvalidRequestLine)));
    }

    #[test]
    fn header_names_are_normalized_to_lowercase() {
        let raw = b"GET /hello HTTP/1.1\r\nHOST: localhost\r\nContent-Length: 0\r\n\r\n";
        let parsed = parse(raw, 1024).unwrap().expect("request should be complete");
        assert_eq!(parsed.request.header("host"), Some("localhost"));
        assert_eq!(parsed.request.header("Host"), Some("localhost"));
        assert_eq!(parsed.request.header("HOST"), Some("localhost"));
    }
}
