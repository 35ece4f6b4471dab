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

//! # evio-core
//!
//! A single-process, event-driven I/O runtime: a cooperative task scheduler
//! built directly on [`std::future::Future`], a readiness poller with an
//! edge-triggered `epoll` backend and a `select` fallback, a non-blocking
//! file/socket wrapper ([`net::AsyncFile`]), a `timerfd`-backed timer
//! service, `wait_any`/`wait_all` combinators, and an adaptive radix tree
//! used as an ordered string-keyed map.
//!
//! There is no dependency on `tokio` or any other async runtime here: this
//! crate *is* the runtime. The pieces are wired together by [`EventLoop`],
//! which owns a [`Poller`](reactor::Poller) and a
//! [`TimerService`](timer::TimerService) and drives `poll -> dispatch ->
//! poll` until asked to stop.

pub mod art;
pub mod byte_buffer;
pub mod config;
pub mod error;
pub mod net;
pub mod queue;
pub mod reactor;
pub mod task;
pub mod timer;
pub mod tracing_support;

pub use art::AdaptiveRadixTree;
pub use byte_buffer::ByteBuffer;
pub use config::{EventLoopConfig, PollerKind};
pub use error::{EvioError, Result, SyscallResult};
pub use net::{resolve, AsyncFile};
pub use reactor::{Direction, EventLoop, Handle, Poller};
pub use task::{
    wait_all2, wait_all3, wait_all4, wait_all_vec, wait_any2, wait_any3, wait_any4, wait_any_vec,
    Either2, Either3, Either4, Task,
};
pub use timer::{sleep, sleep_until, Sleep, TimerService};
