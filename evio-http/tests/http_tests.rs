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

//! Drives [`evio_http::serve`] end to end over a real TCP loopback
//! connection: a plain blocking `std::net::TcpStream` on its own OS
//! thread plays the client (this crate's futures are `!Send`, confined to
//! the event loop's own thread, so the client can't be one of them), while
//! the event loop thread runs the server until a route handler stops it.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use evio_core::{EventLoop, EventLoopConfig};
use evio_http::{serve, Response, Router, ServerConfig};

#[test]
fn get_route_round_trips_a_response_over_real_tcp() {
    let event_loop = EventLoop::new(EventLoopConfig::default()).expect("event loop should start");
    let listener = event_loop
        .bind("127.0.0.1:0".parse().unwrap())
        .expect("bind to an ephemeral port should succeed");
    let addr = listener.local_addr().expect("bound socket has a local address");

    let stop_handle = event_loop.handle();
    let mut router = Router::new();
    router.route("GET", "/", |_req| Response::ok().with_body(Vec::from(&b"hello"[..])));
    router.route("GET", "/stop", move |_req| {
        stop_handle.stop();
        Response::ok()
    });

    let client = std::thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).expect("client should connect");
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        let text = String::from_utf8(response).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"), "unexpected response: {text}");
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("hello"));

        let mut stop_stream = TcpStream::connect(addr).expect("client should connect again");
        stop_stream
            .write_all(b"GET /stop HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut stop_response = Vec::new();
        stop_stream.read_to_end(&mut stop_response).unwrap();
        assert!(String::from_utf8(stop_response).unwrap().starts_with("HTTP/1.1 200 OK\r\n"));
    });

    serve(&event_loop, listener, router, ServerConfig::default());
    client.join().expect("client thread should not panic");
}

#[test]
fn unmatched_route_is_a_404_and_missing_content_length_closes_after_one_response() {
    let event_loop = EventLoop::new(EventLoopConfig::default()).expect("event loop should start");
    let listener = event_loop
        .bind("127.0.0.1:0".parse().unwrap())
        .expect("bind to an ephemeral port should succeed");
    let addr = listener.local_addr().expect("bound socket has a local address");

    let stop_handle = event_loop.handle();
    let mut router = Router::new();
    router.route("GET", "/stop", move |_req| {
        stop_handle.stop();
        Response::ok()
    });

    let client = std::thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).expect("client should connect");
        stream
            .write_all(b"GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        let text = String::from_utf8(response).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"), "unexpected response: {text}");

        let mut stop_stream = TcpStream::connect(addr).expect("client should connect again");
        stop_stream
            .write_all(b"GET /stop HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut stop_response = Vec::new();
        stop_stream.read_to_end(&mut stop_response).unwrap();
        assert!(String::from_utf8(stop_response).unwrap().starts_with("HTTP/1.1 200 OK\r\n"));
    });

    serve(&event_loop, listener, router, ServerConfig::default());
    client.join().expect("client thread should not panic");
}

#[test]
fn read_timeout_closes_an_idle_connection_without_a_response() {
    let event_loop = EventLoop::new(EventLoopConfig::default()).expect("event loop should start");
    let listener = event_loop
        .bind("127.0.0.1:0".parse().unwrap())
        .expect("bind to an ephemeral port should succeed");
    let addr = listener.local_addr().expect("bound socket has a local address");

    let stop_handle = event_loop.handle();
    let mut router = Router::new();
    router.route("GET", "/stop", move |_req| {
        stop_handle.stop();
        Response::ok()
    });

    let client = std::thread::spawn(move || {
        // Connect but never send a complete request line; the server's
        // read timeout should give up on us.
        let mut idle = TcpStream::connect(addr).expect("client should connect");
        idle.write_all(b"GET /never-finishes").unwrap();
        let mut buf = [0u8; 16];
        let n = idle.read(&mut buf).expect("read should observe a clean close, not an error");
        assert_eq!(n, 0, "server should close the idle connection without writing a response");

        let mut stop_stream = TcpStream::connect(addr).expect("client should connect again");
        stop_stream
            .write_all(b"GET /stop HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut stop_response = Vec::new();
        stop_stream.read_to_end(&mut stop_response).unwrap();
        assert!(String::from_utf8(stop_response).unwrap().starts_with("HTTP/1.1 200 OK\r\n"));
    });

    let config = ServerConfig {
        max_body_len: ServerConfig::default().max_body_len,
        read_timeout: Some(Duration::from_millis(50)),
    };
    serve(&event_loop, listener, router, config);
    client.join().expect("client thread should not panic");
}
