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

//! Ties the run queue, a [`Poller`], and a [`TimerService`] into a single
//! `poll -> dispatch -> poll` loop. Everything here is `Rc`-shared: inside
//! one loop there is exactly one thread touching any of it, so there is no
//! locking anywhere in this module.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::net::SocketAddr;
use std::rc::Rc;

use crate::config::{EventLoopConfig, PollerKind};
use crate::error::Result;
use crate::net::AsyncFile;
use crate::reactor::epoll::EpollPoller;
use crate::reactor::poller::{wait_for_event, Direction, Poller};
use crate::reactor::select::SelectPoller;
use crate::task::executor::Executor;
use crate::task::Task;
use crate::timer::{Sleep, TimerService};

pub(crate) struct Inner {
    pub(crate) poller: Box<dyn Poller>,
    pub(crate) timers: TimerService,
    pub(crate) default_backlog: i32,
    executor: Executor,
    stop_requested: Cell<bool>,
}

/// A cheaply-cloneable reference to a running [`EventLoop`]'s reactor
/// state. Anything that needs to arm a readiness wait or schedule a sleep
/// after the call that created it has returned -- [`AsyncFile`], an
/// accept loop, a user's own background task -- holds one of these rather
/// than a borrowed `&EventLoop`.
#[derive(Clone)]
pub struct Handle(pub(crate) Rc<Inner>);

impl Handle {
    pub(crate) fn poller(&self) -> &dyn Poller {
        self.0.poller.as_ref()
    }

    pub(crate) fn timers(&self) -> &TimerService {
        &self.0.timers
    }

    /// Registers `fd` with this loop's poller. Every [`AsyncFile`] does
    /// this once, at construction.
    pub(crate) fn register(&self, fd: std::os::unix::io::RawFd) {
        self.0.poller.register(fd);
    }

    pub(crate) fn unregister(&self, fd: std::os::unix::io::RawFd) {
        self.0.poller.unregister(fd);
    }

    pub(crate) async fn wait_readable(&self, fd: std::os::unix::io::RawFd) {
        wait_for_event(self.poller(), fd, Direction::Read).await
    }

    pub(crate) async fn wait_writable(&self, fd: std::os::unix::io::RawFd) {
        wait_for_event(self.poller(), fd, Direction::Write).await
    }

    /// Schedules a detached, fire-and-forget future onto this loop. Safe
    /// to call from inside another task running on the same loop, or
    /// before the loop has started draining its run queue.
    pub fn spawn(&self, fut: impl Future<Output = ()> + 'static) {
        self.0.executor.spawn_detached(fut);
    }

    /// Suspends the calling task for `duration`, driven by this loop's
    /// timer heap. Compose with [`crate::wait_any2`] against some other
    /// operation for the usual "whichever happens first" timeout idiom.
    pub fn sleep(&self, duration: std::time::Duration) -> Sleep<'_> {
        crate::timer::sleep(self.timers(), duration)
    }

    /// Suspends the calling task until `deadline`.
    pub fn sleep_until(&self, deadline: std::time::Instant) -> Sleep<'_> {
        crate::timer::sleep_until(self.timers(), deadline)
    }

    /// Requests that the loop's [`EventLoop::run`] stop once the current
    /// round of ready tasks finishes. Has no effect on [`EventLoop::block_on`],
    /// which only ever stops when its own future resolves.
    pub fn stop(&self) {
        self.0.stop_requested.set(true);
    }
}

/// Owns one reactor: a run queue, a readiness poller, and a timer heap.
/// Bring one up with [`EventLoop::new`], then either [`EventLoop::block_on`]
/// a single future to completion, or [`EventLoop::run`] a long-lived
/// server task until something calls [`Handle::stop`].
pub struct EventLoop {
    handle: Handle,
}

impl EventLoop {
    pub fn new(config: EventLoopConfig) -> Result<Self> {
        let poller: Box<dyn Poller> = match config.poller_kind {
            PollerKind::Epoll => Box::new(EpollPoller::new(config.epoll_batch_size)?),
            PollerKind::Select => Box::new(SelectPoller::new()),
        };
        let timers = TimerService::new(config.min_timer_interval)?;
        let inner = Rc::new(Inner {
            poller,
            timers,
            default_backlog: config.default_backlog,
            executor: Executor::new(),
            stop_requested: Cell::new(false),
        });
        let handle = Handle(inner);
        handle.register(handle.timers().raw_fd());
        handle.spawn(drive_timer_fd(handle.clone()));
        Ok(Self { handle })
    }

    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    pub fn spawn(&self, fut: impl Future<Output = ()> + 'static) {
        self.handle.spawn(fut);
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Binds a non-blocking listening socket on this loop.
    pub fn bind(&self, addr: SocketAddr) -> Result<AsyncFile> {
        AsyncFile::bind(self.handle(), addr, self.handle.0.default_backlog)
    }

    /// Drives the loop until `fut` resolves, returning its output. Any
    /// other task spawned on this loop (directly or transitively) keeps
    /// running alongside it, but is abandoned -- dropped, not polled to
    /// completion -- once `fut` resolves and `block_on` returns.
    pub fn block_on<T: 'static>(&self, fut: impl Future<Output = T> + 'static) -> T {
        let result: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
        let result_slot = result.clone();
        self.handle.spawn(async move {
            let value = fut.await;
            *result_slot.borrow_mut() = Some(value);
        });
        self.drive(|| result.borrow().is_some());
        Rc::try_unwrap(result)
            .unwrap_or_else(|_| panic!("block_on's result cell is still shared after its future resolved"))
            .into_inner()
            .expect("block_on's future resolved without filling the result cell")
    }

    /// Spawns `task` as a fire-and-forget background task and drives the
    /// loop until [`Handle::stop`] is called. Useful for a long-running
    /// accept loop that has no natural "done" value.
    pub fn run(&self, task: Task<()>) {
        self.handle.spawn(async move {
            task.await;
        });
        self.drive(|| self.handle.0.stop_requested.get());
    }

    fn drive(&self, mut should_stop: impl FnMut() -> bool) {
        loop {
            if should_stop() {
                break;
            }
            let made_progress = self.handle.0.executor.run_ready();
            if should_stop() {
                break;
            }
            if !made_progress {
                let timeout = self.handle.timers().next_timeout();
                if let Err(err) = self.handle.0.poller.poll(timeout) {
                    tracing::warn!(error = %err, "poller.poll returned an error");
                }
            }
        }
    }
}

/// Lives for the whole lifetime of the loop: parks on the loop's
/// `timerfd` and, each time it fires, asks the timer heap to wake
/// whichever sleeps are now due.
async fn drive_timer_fd(handle: Handle) {
    loop {
        handle.wait_readable(handle.timers().raw_fd()).await;
        handle.timers().fire_expired();
    }
}
