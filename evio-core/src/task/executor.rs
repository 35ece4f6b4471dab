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

//! The run queue that backs every `Task` handed to [`crate::run`]. Single
//! threaded by design -- inside one loop, no locking is required on the
//! poller, timer heap, or router, so everything here is `Rc`/`RefCell`,
//! never `Arc`/`Mutex`.
//!
//! Wakers are hand-rolled [`RawWaker`]s over an `Rc<TaskCell>` rather than
//! built from [`std::task::Wake`], because `Wake` requires `Arc<Self>` with
//! `Self: Send + Sync` -- a needless cross-thread-safety tax for a reactor
//! that never leaves its own thread.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

type BoxedFuture = Pin<Box<dyn Future<Output = ()>>>;

struct TaskCell {
    future: RefCell<Option<BoxedFuture>>,
    queue: Weak<RefCell<VecDeque<Rc<TaskCell>>>>,
}

/// Single-threaded run queue. Created once per [`crate::reactor::EventLoop`].
pub(crate) struct Executor {
    ready: Rc<RefCell<VecDeque<Rc<TaskCell>>>>,
}

impl Executor {
    pub(crate) fn new() -> Self {
        Self {
            ready: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Registers a detached, fire-and-forget future. An unhandled panic
    /// inside `fut` is caught and turned into a process abort, matching
    /// "an unhandled exception inside a fire-and-forget task terminates
    /// the process.
    pub(crate) fn spawn_detached(&self, fut: impl Future<Output = ()> + 'static) {
        let cell = Rc::new(TaskCell {
            future: RefCell::new(Some(Box::pin(guard_against_panic(fut)))),
            queue: Rc::downgrade(&self.ready),
        });
        self.ready.borrow_mut().push_back(cell);
    }

    /// Runs every task that is currently ready, returning `true` if any
    /// progress was made. Tasks that re-wake themselves while being polled
    /// this round are picked up on the *next* round, so this always
    /// returns control to the caller (the event loop's poll step) instead
    /// of spinning forever on a self-waking task.
    pub(crate) fn run_ready(&self) -> bool {
        let pending_this_round = self.ready.borrow().len();
        if pending_this_round == 0 {
            return false;
        }
        for _ in 0..pending_this_round {
            let Some(cell) = self.ready.borrow_mut().pop_front() else {
                break;
            };
            poll_cell(cell);
        }
        true
    }

    pub(crate) fn has_pending_work(&self) -> bool {
        !self.ready.borrow().is_empty()
    }
}

async fn guard_against_panic(fut: impl Future<Output = ()>) {
    let result = CatchUnwind { inner: fut }.await;
    if result.is_err() {
        eprintln!("evio-core: unhandled panic in a fire-and-forget task, aborting");
        std::process::abort();
    }
}

/// Polls a wrapped future while converting a panic into an `Err`, without
/// pulling in a crate like `futures` just for `FutureExt::catch_unwind`.
struct CatchUnwind<F> {
    inner: F,
}

impl<F: Future> Future for CatchUnwind<F> {
    type Output = Result<F::Output, ()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // SAFETY: we never move `inner` out; this is a standard pin
        // projection through a single-field wrapper.
        let inner = unsafe { self.map_unchecked_mut(|s| &mut s.inner) };
        match panic::catch_unwind(AssertUnwindSafe(|| inner.poll(cx))) {
            Ok(Poll::Ready(v)) => Poll::Ready(Ok(v)),
            Ok(Poll::Pending) => Poll::Pending,
            Err(_) => Poll::Ready(Err(())),
        }
    }
}

fn poll_cell(cell: Rc<TaskCell>) {
    let mut slot = cell.future.borrow_mut();
    let Some(fut) = slot.as_mut() else {
        return;
    };
    let waker = waker_for(cell.clone());
    let mut cx = Context::from_waker(&waker);
    match fut.as_mut().poll(&mut cx) {
        Poll::Ready(()) => *slot = None,
        Poll::Pending => {}
    }
}

fn schedule(cell: Rc<TaskCell>) {
    if let Some(queue) = cell.queue.upgrade() {
        queue.borrow_mut().push_back(cell);
    }
}

fn waker_for(cell: Rc<TaskCell>) -> Waker {
    let ptr = Rc::into_raw(cell) as *const ();
    unsafe { Waker::from_raw(RawWaker::new(ptr, &VTABLE)) }
}

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

unsafe fn clone_raw(ptr: *const ()) -> RawWaker {
    let cell = Rc::from_raw(ptr as *const TaskCell);
    let cloned = Rc::clone(&cell);
    std::mem::forget(cell);
    RawWaker::new(Rc::into_raw(cloned) as *const (), &VTABLE)
}

unsafe fn wake_raw(ptr: *const ()) {
    let cell = Rc::from_raw(ptr as *const TaskCell);
    schedule(cell);
}

unsafe fn wake_by_ref_raw(ptr: *const ()) {
    let cell = Rc::from_raw(ptr as *const TaskCell);
    let cloned = Rc::clone(&cell);
    std::mem::forget(cell);
    schedule(cloned);
}

unsafe fn drop_raw(ptr: *const ()) {
    drop(Rc::from_raw(ptr as *const TaskCell));
}
