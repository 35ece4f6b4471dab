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

//! A manually-advanceable stand-in for [`std::time::Instant`].
//!
//! `evio_core::TimerService` talks to the kernel's real monotonic clock
//! through `timerfd`, not through an injectable `Clock` trait -- there is
//! no hook here for making a real sleep resolve early. What `FakeClock`
//! is for is tests that only care about *relative ordering* of deadlines
//! (e.g. "a sleep scheduled for `base + 5ms` fires before one scheduled
//! for `base + 10ms`, even though the second one was scheduled first"):
//! anchoring every deadline to one `FakeClock::now()` call up front keeps
//! those tests readable without sprinkling `Duration::from_millis(n)`
//! arithmetic across assertions.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// A fixed base instant that can be advanced by an explicit amount. Never
/// reads the wall clock itself beyond the one [`Instant::now`] call in
/// [`FakeClock::new`].
pub struct FakeClock {
    base: Instant,
    elapsed: Cell<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    /// The base instant plus however much this clock has been advanced.
    pub fn now(&self) -> Instant {
        self.base + self.elapsed.get()
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}
