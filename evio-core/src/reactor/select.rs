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

//! Portable `select(2)` fallback. Maintains two fd interest sets directly
//! (no kernel-side registration step); each `poll` call rebuilds fresh
//! `fd_set`s from the table and hands them to the kernel. Because the
//! table is re-scanned in full on every call this is level-triggered by
//! construction: a still-ready fd keeps showing up until its waker is
//! actually taken.

use std::cell::RefCell;
use std::collections::HashMap;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;
use std::task::Waker;
use std::time::Duration;

use crate::reactor::poller::{Direction, Poller};

#[derive(Default)]
struct Entry {
    read: Option<Waker>,
    write: Option<Waker>,
}

/// `select(2)`-backed poller, used where `epoll` isn't available or where
/// a small, easily-audited fallback is preferable to the edge-triggered
/// backend.
pub struct SelectPoller {
    table: RefCell<HashMap<RawFd, Entry>>,
}

impl SelectPoller {
    pub fn new() -> Self {
        Self {
            table: RefCell::new(HashMap::new()),
        }
    }
}

impl Default for SelectPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl Poller for SelectPoller {
    fn register(&self, fd: RawFd) {
        self.table.borrow_mut().entry(fd).or_default();
    }

    fn unregister(&self, fd: RawFd) {
        self.table.borrow_mut().remove(&fd);
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
    }

    fn poll(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        let mut read_fds = unsafe { MaybeUninit::<libc::fd_set>::zeroed().assume_init() };
        let mut write_fds = unsafe { MaybeUninit::<libc::fd_set>::zeroed().assume_init() };
        unsafe {
            libc::FD_ZERO(&mut read_fds);
            libc::FD_ZERO(&mut write_fds);
        }
        let mut max_fd: RawFd = -1;
        {
            let table = self.table.borrow();
            if table.is_empty() && timeout.is_none() {
                // Nothing to watch and no deadline: selecting would block
                // forever on an empty set. The caller (the event loop) only
                // reaches this when it also has no timers pending, which
                // means there is no other task that could ever wake us, so
                // treat it as an immediate no-op poll.
                return Ok(());
            }
            for (&fd, entry) in table.iter() {
                if entry.read.is_some() {
                    unsafe { libc::FD_SET(fd, &mut read_fds) };
                    max_fd = max_fd.max(fd);
                }
                if entry.write.is_some() {
                    unsafe { libc::FD_SET(fd, &mut write_fds) };
                    max_fd = max_fd.max(fd);
                }
            }
        }

        let mut timeval = timeout.map(|d| libc::timeval {
            tv_sec: d.as_secs() as libc::time_t,
            tv_usec: d.subsec_micros() as libc::suseconds_t,
        });
        let timeout_ptr = timeval
            .as_mut()
            .map(|t| t as *mut libc::timeval)
            .unwrap_or(std::ptr::null_mut());

        let rc = unsafe {
            libc::select(
                max_fd + 1,
                &mut read_fds,
                &mut write_fds,
                std::ptr::null_mut(),
                timeout_ptr,
            )
        };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }
        if rc == 0 {
            return Ok(());
        }

        let mut ready: Vec<Waker> = Vec::new();
        {
            let mut table = self.table.borrow_mut();
            for (&fd, entry) in table.iter_mut() {
                if entry.read.is_some() && unsafe { libc::FD_ISSET(fd, &read_fds) } {
                    ready.extend(entry.read.take());
                }
                if entry.write.is_some() && unsafe { libc::FD_ISSET(fd, &write_fds) } {
                    ready.extend(entry.write.take());
                }
            }
        }
        for waker in ready {
            waker.wake();
        }
        Ok(())
    }
}
