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

//! `timerfd(2)`-backed timer heap. Every outstanding `sleep` registers a
//! `(deadline, id, waker)` entry in a min-heap keyed by deadline (ties
//! broken by insertion-order id, so two sleeps with identical deadlines
//! fire in the order they were scheduled); the earliest deadline is kept
//! in sync with a single kernel timer so the event loop's blocking poll
//! wakes up exactly when it needs to, alongside any fd readiness.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::os::unix::io::RawFd;
use std::task::Waker;
use std::time::{Duration, Instant};

use crate::error::{EvioError, Result};

struct TimerEntry {
    deadline: Instant,
    id: u64,
    waker: Waker,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}
impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the *earliest*
        // deadline first.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Opaque handle to a scheduled timer, used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(u64);

struct State {
    heap: BinaryHeap<TimerEntry>,
    cancelled: HashSet<u64>,
    armed_for: Option<Instant>,
}

/// Owns one `timerfd` and the heap of sleeps waiting on it.
pub struct TimerService {
    fd: RawFd,
    min_interval: Duration,
    next_id: Cell<u64>,
    state: RefCell<State>,
}

impl TimerService {
    pub fn new(min_interval: Duration) -> Result<Self> {
        let fd = unsafe { libc::timerfd_create(libc::CLOCK_MONOTONIC, libc::TFD_NONBLOCK | libc::TFD_CLOEXEC) };
        if fd < 0 {
            return Err(EvioError::setup("timerfd_create", std::io::Error::last_os_error()));
        }
        Ok(Self {
            fd,
            min_interval,
            next_id: Cell::new(0),
            state: RefCell::new(State {
                heap: BinaryHeap::new(),
                cancelled: HashSet::new(),
                armed_for: None,
            }),
        })
    }

    pub fn raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Schedules `waker` to be woken at `deadline`. Returns an id that can
    /// be passed to [`TimerService::cancel`].
    pub fn schedule(&self, deadline: Instant, waker: Waker) -> TimerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let mut state = self.state.borrow_mut();
        state.heap.push(TimerEntry { deadline, id, waker });
        self.rearm_if_needed(&mut state);
        TimerId(id)
    }

    /// Cancels a previously scheduled timer. Idempotent and safe to call
    /// after the timer has already fired (a no-op in that case), which is
    /// what lets [`super::Sleep::drop`] call it unconditionally.
    pub fn cancel(&self, id: TimerId) {
        self.state.borrow_mut().cancelled.insert(id.0);
    }

    /// How long until the next live (non-cancelled) deadline, or `None` if
    /// nothing is scheduled. Lazily drops cancelled entries off the top of
    /// the heap as it peeks.
    pub fn next_timeout(&self) -> Option<Duration> {
        let mut state = self.state.borrow_mut();
        self.drop_cancelled_from_top(&mut state);
        let deadline = state.heap.peek()?.deadline;
        let now = Instant::now();
        Some(deadline.saturating_duration_since(now))
    }

    /// Called once the `timerfd` reports readable: drains the kernel
    /// expiration counter, fires every entry whose deadline has passed,
    /// and re-arms the kernel timer to the new earliest deadline.
    pub fn fire_expired(&self) {
        let mut buf = [0u8; 8];
        unsafe {
            libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len());
        }
        let now = Instant::now();
        let mut due = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            while let Some(top) = state.heap.peek() {
                if top.deadline > now {
                    break;
                }
                let entry = state.heap.pop().unwrap();
                if !state.cancelled.remove(&entry.id) {
                    due.push(entry.waker);
                }
            }
            self.rearm_if_needed(&mut state);
        }
        for waker in due {
            waker.wake();
        }
    }

    fn drop_cancelled_from_top(&self, state: &mut State) {
        while let Some(top) = state.heap.peek() {
            if state.cancelled.contains(&top.id) {
                let entry = state.heap.pop().unwrap();
                state.cancelled.remove(&entry.id);
            } else {
                break;
            }
        }
    }

    fn rearm_if_needed(&self, state: &mut State) {
        self.drop_cancelled_from_top(state);
        let next_deadline = state.heap.peek().map(|e| e.deadline);
        if next_deadline == state.armed_for {
            return;
        }
        state.armed_for = next_deadline;
        let spec = match next_deadline {
            None => libc::itimerspec {
                it_interval: libc::timespec { tv_sec: 0, tv_nsec: 0 },
                it_value: libc::timespec { tv_sec: 0, tv_nsec: 0 },
            },
            Some(deadline) => {
                let remaining = deadline
                    .saturating_duration_since(Instant::now())
                    .max(self.min_interval);
                libc::itimerspec {
                    it_interval: libc::timespec { tv_sec: 0, tv_nsec: 0 },
                    it_value: libc::timespec {
                        tv_sec: remaining.as_secs() as libc::time_t,
                        tv_nsec: remaining.subsec_nanos() as libc::c_long,
                    },
                }
            }
        };
        unsafe {
            libc::timerfd_settime(self.fd, 0, &spec, std::ptr::null_mut());
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
