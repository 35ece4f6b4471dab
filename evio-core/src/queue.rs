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

//! A cross-thread MPSC queue that wakes a single event loop when an item
//! arrives. Everything else in this crate is `Rc`/`RefCell` and never
//! leaves its own thread; this is the one deliberate exception, for the
//! common case of a blocking worker thread (a thread pool doing CPU-bound
//! or blocking-syscall work) handing a result back to the loop that's
//! waiting on it.
//!
//! A `std::sync::Mutex`-guarded deque holds the items; an `eventfd(2)`
//! registered with the owning loop's poller provides the wakeup, since
//! there's no condition variable a single-threaded poll loop could block
//! on without giving up its ability to service other fds at the same
//! time.

use std::collections::VecDeque;
use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex};

use crate::error::{EvioError, Result};
use crate::reactor::Handle;

struct Shared<T> {
    queue: Mutex<VecDeque<T>>,
    eventfd: RawFd,
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.eventfd);
        }
    }
}

/// The producing half. `Send` whenever `T` is, so it can be handed to a
/// worker thread spawned with `std::thread::spawn`.
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Sender<T> {
    /// Pushes `value` and wakes the receiving loop. Never blocks.
    pub fn send(&self, value: T) {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(value);
        let one: u64 = 1;
        unsafe {
            libc::write(self.shared.eventfd, &one as *const u64 as *const libc::c_void, 8);
        }
    }
}

/// The consuming half, bound to one event loop. Not `Send`: only the task
/// that owns the loop's [`Handle`] should poll it.
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
    handle: Handle,
}

impl<T> Receiver<T> {
    /// Suspends until an item is available, then returns it. If several
    /// items arrived between wakeups, they're all already sitting in the
    /// queue and this simply dequeues the next one without waiting again.
    pub async fn recv(&self) -> T {
        loop {
            if let Some(value) = self
                .shared
                .queue
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front()
            {
                return value;
            }
            self.handle.wait_readable(self.shared.eventfd).await;
            drain_eventfd(self.shared.eventfd);
        }
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.handle.unregister(self.shared.eventfd);
    }
}

fn drain_eventfd(fd: RawFd) {
    let mut buf = [0u8; 8];
    unsafe {
        libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len());
    }
}

/// Creates a sender/receiver pair. The receiver wakes `handle`'s loop;
/// the sender may be cloned and moved to any number of other threads.
pub fn channel<T>(handle: Handle) -> Result<(Sender<T>, Receiver<T>)> {
    let eventfd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
    if eventfd < 0 {
        return Err(EvioError::setup("eventfd", std::io::Error::last_os_error()));
    }
    handle.register(eventfd);
    let shared = Arc::new(Shared {
        queue: Mutex::new(VecDeque::new()),
        eventfd,
    });
    Ok((
        Sender { shared: shared.clone() },
        Receiver { shared, handle },
    ))
}
