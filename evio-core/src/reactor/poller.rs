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

//! The readiness-poller contract, plus the awaiter adapter that plugs a
//! suspended coroutine into it ([`wait_for_event`]).

use std::cell::Cell;
use std::future::Future;
use std::os::unix::io::RawFd;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

/// Which half of a full-duplex fd a continuation is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

/// A readiness poller: maps `(fd, direction)` to a waiting continuation.
///
/// Invariant every implementation must uphold: for every `(fd, direction)`
/// pair, either a waker is installed *and* the kernel is being asked to
/// watch that direction, or neither. At most one pending waker per
/// `(fd, direction)`.
pub trait Poller {
    /// Starts watching `fd` with no interest yet.
    fn register(&self, fd: RawFd);

    /// Stops watching `fd` entirely. Idempotent. Any still-armed waker for
    /// `fd` is dropped without being woken -- callers only unregister once
    /// they've already resolved (or are abandoning) every pending op on
    /// that fd.
    fn unregister(&self, fd: RawFd);

    /// Sets the interest bit for `direction` on `fd` and installs `waker`
    /// as the continuation to wake when it becomes ready. Arming an
    /// already-armed direction is a contract violation; callers never do
    /// it, so implementations may assert.
    fn arm(&self, fd: RawFd, direction: Direction, waker: Waker);

    /// Clears the interest bit for `direction` on `fd` and drops any
    /// installed waker. Idempotent: disarming a direction that was never
    /// armed is a no-op, which is what lets a dropped awaiter call this
    /// unconditionally.
    fn disarm(&self, fd: RawFd, direction: Direction);

    /// Blocks until at least one watched fd is ready, or `timeout`
    /// elapses, waking every continuation whose direction fired. A signal
    /// interruption returns `Ok(())` without waking anything; the event
    /// loop simply calls `poll` again.
    fn poll(&self, timeout: Option<Duration>) -> std::io::Result<()>;
}

/// Awaits read- or write-readiness on `fd`. On first poll, arms the
/// direction with the current task's waker and suspends; the poller's
/// one-shot re-arm guarantees that when this future is polled again it's
/// because that exact readiness fired, so it resolves immediately.
///
/// If this future is dropped before it resolves (the awaiting task was
/// cancelled), [`Drop`] disarms the direction, restoring the poller's
/// invariant: a cancelled wait always un-arms whatever it was waiting on.
pub struct WaitForEvent<'p> {
    poller: &'p dyn Poller,
    fd: RawFd,
    direction: Direction,
    armed: Cell<bool>,
}

impl<'p> WaitForEvent<'p> {
    pub fn new(poller: &'p dyn Poller, fd: RawFd, direction: Direction) -> Self {
        Self {
            poller,
            fd,
            direction,
            armed: Cell::new(false),
        }
    }
}

impl Future for WaitForEvent<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.armed.get() {
            // We were polled again after being armed: the poller already
            // disarmed this direction as part of resuming us.
            return Poll::Ready(());
        }
        self.poller.arm(self.fd, self.direction, cx.waker().clone());
        self.armed.set(true);
        Poll::Pending
    }
}

impl Drop for WaitForEvent<'_> {
    fn drop(&mut self) {
        if self.armed.get() {
            self.poller.disarm(self.fd, self.direction);
        }
    }
}

pub fn wait_for_event<'p>(poller: &'p dyn Poller, fd: RawFd, direction: Direction) -> WaitForEvent<'p> {
    WaitForEvent::new(poller, fd, direction)
}
