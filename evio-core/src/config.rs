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

//! Construction-time configuration for [`crate::EventLoop`]. There is no
//! file or environment-variable layer here -- this is a library embedded
//! into someone else's process, not a deployable service, so the embedding
//! application is expected to build one of these however it likes (from
//! its own config file, from `clap`, from a hardcoded default) and pass it
//! to [`crate::EventLoop::new`].

use std::time::Duration;

/// Which [`crate::Poller`] backend an [`crate::EventLoop`] should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerKind {
    /// Edge-triggered `epoll(7)`, one-shot re-arm per operation.
    #[default]
    Epoll,
    /// Portable `select(2)` fd-set scan. Useful when `epoll` isn't
    /// available, or as a reference implementation in tests.
    Select,
}

/// Tuning knobs for an [`crate::EventLoop`].
#[derive(Debug, Clone)]
pub struct EventLoopConfig {
    pub poller_kind: PollerKind,
    /// Max number of events drained per `epoll_wait` call.
    pub epoll_batch_size: usize,
    /// Backlog passed to `listen(2)` by [`crate::net::AsyncFile::bind`]
    /// when the caller doesn't override it.
    pub default_backlog: i32,
    /// Smallest positive timer interval the kernel is armed with when a
    /// deadline has already passed by the time it's re-armed.
    pub min_timer_interval: Duration,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            poller_kind: PollerKind::default(),
            epoll_batch_size: 256,
            default_backlog: libc::SOMAXCONN,
            min_timer_interval: Duration::from_nanos(1),
        }
    }
}
