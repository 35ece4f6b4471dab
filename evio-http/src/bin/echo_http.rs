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

//! A minimal demo server: `GET /` says hello, `POST /echo` sends the
//! request body straight back, anything else is a 404.

use std::time::Duration;

use evio_core::{EventLoop, EventLoopConfig};
use evio_http::{serve, Response, Router, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_env("EVIO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().compact().with_target(true);
    tracing_subscriber::registry().with(filter).with(fmt_layer).init();

    let host = std::env::var("EVIO_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("EVIO_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = *evio_core::resolve(&host, port)
        .expect("address resolution failed")
        .first()
        .expect("resolver returned no candidate addresses");

    let event_loop = EventLoop::new(EventLoopConfig::default()).expect("failed to start the event loop");
    let listener = event_loop.bind(addr).expect("failed to bind listener");

    let mut router = Router::new();
    router.route("GET", "/", |_req| Response::ok().with_body(Vec::from(&b"hello from evio-http\n"[..])));
    router.route("POST", "/echo", |req| Response::ok().with_body(req.body.clone()));

    tracing::info!(%addr, "listening");
    let config = ServerConfig {
        max_body_len: 1024 * 1024,
        read_timeout: Some(Duration::from_secs(30)),
    };
    serve(&event_loop, listener, router, config);
}
