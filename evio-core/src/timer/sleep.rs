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

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crate::timer::timer::{TimerId, TimerService};

/// Awaits a point in time. A deadline already in the past resolves on the
/// first poll without touching the timer heap at all.
///
/// Like [`crate::reactor::WaitForEvent`], dropping an unresolved `Sleep`
/// cancels the pending timer entry instead of leaving a dangling waker in
/// the heap.
pub struct Sleep<'t> {
    timers: &'t TimerService,
    deadline: Instant,
    scheduled: Cell<Option<TimerId>>,
}

impl<'t> Sleep<'t> {
    pub fn new(timers: &'t TimerService, deadline: Instant) -> Self {
        Self {
            timers,
            deadline,
            scheduled: Cell::new(None),
        }
    }
}

impl Future for Sleep<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if Instant::now() >= self.deadline {
            return Poll::Ready(());
        }
        if self.scheduled.get().is_none() {
            let id = self.timers.schedule(self.deadline, cx.waker().clone());
            self.scheduled.set(Some(id));
        }
        Poll::Pending
    }
}

impl Drop for Sleep<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.scheduled.get() {
            self.timers.cancel(id);
        }
    }
}

/// Suspends the calling task until `duration` has elapsed.
pub fn sleep(timers: &TimerService, duration: Duration) -> Sleep<'_> {
    Sleep::new(timers, Instant::now() + duration)
}

/// Suspends the calling task until `deadline`.
pub fn sleep_until(timers: &TimerService, deadline: Instant) -> Sleep<'_> {
    Sleep::new(timers, deadline)
}
