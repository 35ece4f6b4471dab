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

//! Test fixtures shared by `evio-core`'s own integration tests and by
//! `evio-http`: a single-thread harness for booting an `EventLoop`, an
//! in-process loopback pipe pair for exercising `AsyncFile` without a real
//! network interface, and a small fake-clock helper for tests that want a
//! deterministic `Instant` without racing the wall clock.
//!
//! Not published; `[dev-dependencies]` only.

mod error;
mod fake_clock;
mod harness;
mod loopback;

pub use error::TestSupportError;
pub use fake_clock::FakeClock;
pub use harness::{test_config, with_event_loop};
pub use loopback::loopback_pair;
