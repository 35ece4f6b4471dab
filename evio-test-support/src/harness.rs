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

//! A single-thread test harness: boots an [`evio_core::EventLoop`] with
//! settings tuned for fast, deterministic tests rather than production
//! throughput, runs a test body against it, and tears it down.

use std::time::Duration;

use evio_core::{EventLoop, EventLoopConfig, PollerKind};

/// Config a test should start from: a small `epoll_batch_size` (tests
/// rarely juggle more than a handful of fds at once, and a small batch
/// makes a wedged test's `strace` output easier to read) and the same
/// minimum timer granularity production uses, since several tests assert
/// on ordering that depends on it.
pub fn test_config() -> EventLoopConfig {
    EventLoopConfig {
        poller_kind: PollerKind::Epoll,
        epoll_batch_size: 16,
        default_backlog: 16,
        min_timer_interval: Duration::from_nanos(1),
    }
}

/// Boots an [`EventLoop`] with [`test_config`], hands it to `body`, and
/// returns whatever `body` returns. `body` is free to call
/// [`EventLoop::block_on`] any number of times on the loop it's handed.
pub fn with_event_loop<T>(body: impl FnOnce(&EventLoop) -> T) -> T {
    let event_loop = EventLoop::new(test_config()).expect("test_config() should always build a working EventLoop");
    body(&event_loop)
}
