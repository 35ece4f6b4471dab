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

//! Edge-triggered `epoll(7)` backend, one-shot re-arm per operation. Once
//! `epoll_wait` reports any event for an fd, the kernel stops watching it
//! until the next `epoll_ctl(MOD)`, which gives us "each readiness
//! delivery belongs to exactly one continuation": it rules out a spurious
//! wakeup stealing a different waiter's readiness.

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::task::Waker;
use std::time::Duration;

use crate::error::{EvioError, Result};
use crate::reactor::poller::{Direction, Poller};

struct Entry {
    read: Option<Waker>,
    write: Option<Waker>,
    /// Whether `fd` has ever been added to the epoll instance. Until then
    /// arming must use `EPOLL_CTL_ADD`; afterwards, `EPOLL_CTL_MOD`.
    epoll_added: bool,
}

impl Entry {
    fn new() -> Self {
        Self {
            read: None,
            write: None,
            epoll_added: false,
        }
    }

    fn interest_bits(&self) -> u32 {
        let mut bits = 0u32;
        if self.read.is_some() {
            bits |= libc::EPOLLIN as u32;
        }
        if self.write.is_some() {
            bits |= libc::EPOLLOUT as u32;
        }
        bits
    }
}

/// Edge-triggered poller backed by a single `epoll` instance.
pub struct EpollPoller {
    epoll_fd: RawFd,
    table: RefCell<HashMap<RawFd, Entry>>,
    batch_size: usize,
}

impl EpollPoller {
    pub fn new(batch_size: usize) -> Result<Self> {
        let epoll_fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if epoll_fd < 0 {
            return Err(EvioError::setup("epoll_create1", std::io::Error::last_os_error()));
        }
        Ok(Self {
            epoll_fd,
            table: RefCell::new(HashMap::new()),
            batch_size,
        })
    }

    /// Re-submits `fd`'s current interest mask to the kernel. Called both
    /// when arming a new direction and when one direction fired while the
    /// other was still armed -- one-shot clears *both* at the kernel level
    /// on any event, so the survivor must be re-submitted.
    fn rearm_kernel(&self, fd: RawFd, entry: &mut Entry) -> std::io::Result<()> {
        let bits = entry.interest_bits();
        let mut event = libc::epoll_event {
            events: bits | libc::EPOLLONESHOT as u32 | libc::EPOLLET as u32,
            u64: fd as u64,
        };
        let op = if entry.epoll_added {
            libc::EPOLL_CTL_MOD
        } else {
            libc::EPOLL_CTL_ADD
        };
        let rc = unsafe { libc::epoll_ctl(self.epoll_fd, op, fd, &mut event as *mut _) };
        if rc < 0 {
            return Err(std::io::Error::last_os_error());
        }
        entry.epoll_added = true;
        Ok(())
    }
}

impl Poller for EpollPoller {
    fn register(&self, fd: RawFd) {
        self.table.borrow_mut().entry(fd).or_insert_with(Entry::new);
    }

    fn unregister(&self, fd: RawFd) {
        let mut table = self.table.borrow_mut();
        if let Some(entry) = table.remove(&fd) {
            if entry.epoll_added {
                unsafe {
                    libc::epoll_ctl(self.epoll_fd, libc::EPOLL_CTL_DEL, fd, std::ptr::null_mut());
                }
            }
        }
    }

    fn arm(&self, fd: RawFd, direction: Direction, waker: Waker) {
        let mut table = self.table.borrow_mut();
        let entry = table.get_mut(&fd).expect("arm() on an unregistered fd");
        match direction {
            Direction::Read => {
                debug_assert!(entry.read.is_none(), "arm() on an already-armed direction");
                entry.read = Some(waker);
            }
            Direction::Write => {
                debug_assert!(entry.write.is_none(), "arm() on an already-armed direction");
                entry.write = Some(waker);
            }
        }
        self.rearm_kernel(fd, entry)
            .expect("epoll_ctl failed while arming a direction");
    }

    fn disarm(&self, fd: RawFd, direction: Direction) {
        let mut table = self.table.borrow_mut();
        let Some(entry) = table.get_mut(&fd) else {
            return;
        };
        match direction {
            Direction::Read => entry.read = None,
            Direction::Write => entry.write = None,
        }
        // Re-submit the (possibly now-empty) interest mask so the kernel
        // state matches the table; if both directions are now empty this
        // just leaves the fd registered with no events, which is fine --
        // `unregister` will `EPOLL_CTL_DEL` it for real.
        if entry.epoll_added {
            let _ = self.rearm_kernel(fd, entry);
        }
    }

    fn poll(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        let timeout_ms: i32 = match timeout {
            None => -1,
            Some(d) => i32::try_from(d.as_millis()).unwrap_or(i32::MAX),
        };
        let mut events: Vec<libc::epoll_event> = vec![unsafe { std::mem::zeroed() }; self.batch_size];
        let n = unsafe {
            libc::epoll_wait(
                self.epoll_fd,
                events.as_mut_ptr(),
                events.len() as i32,
                timeout_ms,
            )
        };
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }
        for event in &events[..n as usize] {
            let fd = event.u64 as RawFd;
            let mut table = self.table.borrow_mut();
            let Some(entry) = table.get_mut(&fd) else {
                continue;
            };
            let hup_or_err = (event.events & (libc::EPOLLHUP as u32 | libc::EPOLLERR as u32)) != 0;
            let readable = hup_or_err || (event.events & libc::EPOLLIN as u32) != 0;
            let writable = hup_or_err || (event.events & libc::EPOLLOUT as u32) != 0;
            let read_waker = if readable { entry.read.take() } else { None };
            let write_waker = if writable { entry.write.take() } else { None };
            // One-shot disarmed the whole fd at the kernel level; if a
            // direction we didn't wake is still wanted, re-submit it.
            if entry.read.is_some() || entry.write.is_some() {
                let _ = self.rearm_kernel(fd, entry);
            }
            drop(table);
            if let Some(waker) = read_waker {
                waker.wake();
            }
            if let Some(waker) = write_waker {
                waker.wake();
            }
        }
        Ok(())
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.epoll_fd);
        }
    }
}
