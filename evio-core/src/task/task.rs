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

//! [`Task<T>`] is a suspendable, single-result computation realized
//! directly on top of [`std::future::Future`]. There's no separate
//! "promise" struct: a `Future`'s own state machine already carries the
//! uninitialized-value slot every `async fn` body needs, and Rust's
//! `await` desugaring already gives "single continuation, symmetric
//! transfer" for free -- awaiting a `Task` polls its inner future
//! directly from the awaiting coroutine's own `poll`, with no extra stack
//! frame per await.
//!
//! Construction is lazy: nothing runs until the task is polled, which is
//! true of every Rust `Future` already, so [`Task::new`] just boxes and
//! pins it. Running one fire-and-forget, via
//! [`crate::reactor::EventLoop::spawn`] or
//! [`crate::reactor::EventLoop::run`], wraps it with a sentinel
//! continuation that aborts the process on an unhandled panic instead of
//! silently dropping it.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A suspendable computation with a single result of type `T`.
///
/// Move-only (by construction: `Task` owns a `Pin<Box<dyn Future>>>`, which
/// is not `Copy` and this type does not implement `Clone`). Dropping an
/// un-awaited, un-[`run`](crate::run)'d `Task` drops its boxed future,
/// which recursively drops anything it was suspended on -- the same
/// "destroying a frame disarms what it was waiting on" discipline every
/// awaiter in this crate follows.
pub struct Task<T> {
    inner: Pin<Box<dyn Future<Output = T>>>,
    completed: Cell<bool>,
}

impl<T> Task<T> {
    /// Wraps a future as a suspended task. The body does not run until the
    /// task is polled (via `.await`) or handed to [`crate::run`].
    pub fn new(fut: impl Future<Output = T> + 'static) -> Self {
        Self {
            inner: Box::pin(fut),
            completed: Cell::new(false),
        }
    }
}

impl<T> Future for Task<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        debug_assert!(
            !self.completed.get(),
            "Task polled again after returning Ready -- re-awaiting a task is undefined"
        );
        // Project the pin: `inner` is itself already `Pin<Box<...>>`, and
        // `Task` has no other field that needs structural pinning.
        let this = self.get_mut();
        match this.inner.as_mut().poll(cx) {
            Poll::Ready(v) => {
                this.completed.set(true);
                Poll::Ready(v)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
