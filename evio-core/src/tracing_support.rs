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

//! Convenience `tracing` setup for applications embedding this crate. The
//! runtime itself never initializes a subscriber on its own -- a library
//! that called `tracing_subscriber::fmt().init()` from inside itself would
//! stomp on whatever the embedding binary configured. Call
//! [`init_tracing_for_tests`] from test code, or set up your own
//! `tracing_subscriber` registry in `main` and just let `tracing::*!` calls
//! inside this crate feed into it.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a compact `stdout` subscriber filtered by `EVIO_LOG`
/// (`RUST_LOG`-style), falling back to `warn`. Intended for examples and
/// integration tests; safe to call more than once (later calls are no-ops
/// once a global subscriber is set).
pub fn init_tracing_for_tests() {
    let filter = EnvFilter::try_from_env("EVIO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_target(true);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
