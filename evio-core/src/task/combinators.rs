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

//! `wait_any` / `wait_all` over a small, fixed arity of heterogeneous
//! futures, plus homogeneous vector forms.
//!
//! Every combinator here polls its children with the *same* waker the
//! combinator itself was polled with, the same trick `futures::join!` and
//! `tokio::select!` use: there is no need to tell which child woke the
//! combinator up, because waking just means "re-poll, and re-polling an
//! already-ready child is cheap and short-circuits immediately". This gives
//! wrapper futures concurrent progress and a first/last-to-complete resume
//! without spawning anything onto the executor -- the combinator is driven
//! entirely by its caller's own poll chain, preserving the symmetric-transfer
//! property.
//!
//! Declaration-order resume: children are polled in field order on every
//! wake, so "the first N-1 are resumed inline; the Nth is the symmetric
//! transfer target" falls out of plain sequential polling.
//!
//! These combinators are only ever awaited inline by their caller, never
//! detached onto the executor, so the boxed children here carry whatever
//! lifetime the caller's own futures have (`'a` below) instead of forcing
//! `'static`. That's what lets `handle.sleep(d)` -- which borrows the
//! loop's timer heap -- compose with `wait_any`/`wait_all` for the usual
//! "whichever happens first" timeout idiom.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The result of [`wait_any2`]/[`wait_any3`]/[`wait_any4`]: which input
/// finished first, carrying its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either2<A, B> {
    First(A),
    Second(B),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either3<A, B, C> {
    First(A),
    Second(B),
    Third(C),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either4<A, B, C, D> {
    First(A),
    Second(B),
    Third(C),
    Fourth(D),
}

/// `wait_all` over two heterogeneous futures.
pub fn wait_all2<'a, A: Future + 'a, B: Future + 'a>(
    a: A,
    b: B,
) -> impl Future<Output = (A::Output, B::Output)> + 'a {
    WaitAll2 {
        a: MaybeDone::Polling(Box::pin(a)),
        b: MaybeDone::Polling(Box::pin(b)),
    }
}

/// `wait_all` over three heterogeneous futures.
pub fn wait_all3<'a, A: Future + 'a, B: Future + 'a, C: Future + 'a>(
    a: A,
    b: B,
    c: C,
) -> impl Future<Output = (A::Output, B::Output, C::Output)> + 'a {
    WaitAll3 {
        a: MaybeDone::Polling(Box::pin(a)),
        b: MaybeDone::Polling(Box::pin(b)),
        c: MaybeDone::Polling(Box::pin(c)),
    }
}

/// `wait_all` over four heterogeneous futures.
pub fn wait_all4<'a, A: Future + 'a, B: Future + 'a, C: Future + 'a, D: Future + 'a>(
    a: A,
    b: B,
    c: C,
    d: D,
) -> impl Future<Output = (A::Output, B::Output, C::Output, D::Output)> + 'a {
    WaitAll4 {
        a: MaybeDone::Polling(Box::pin(a)),
        b: MaybeDone::Polling(Box::pin(b)),
        c: MaybeDone::Polling(Box::pin(c)),
        d: MaybeDone::Polling(Box::pin(d)),
    }
}

enum MaybeDone<'a, T> {
    Polling(Pin<Box<dyn Future<Output = T> + 'a>>),
    Done(Option<T>),
}

impl<'a, T> MaybeDone<'a, T> {
    fn poll_advance(&mut self, cx: &mut Context<'_>) -> bool {
        if let MaybeDone::Polling(fut) = self {
            if let Poll::Ready(v) = fut.as_mut().poll(cx) {
                *self = MaybeDone::Done(Some(v));
            }
        }
        matches!(self, MaybeDone::Done(_))
    }

    fn take(&mut self) -> T {
        match self {
            MaybeDone::Done(v) => v.take().expect("MaybeDone polled again after take"),
            MaybeDone::Polling(_) => unreachable!("take() before completion"),
        }
    }
}

struct WaitAll2<'a, A, B> {
    a: MaybeDone<'a, A>,
    b: MaybeDone<'a, B>,
}

impl<'a, A, B> Future for WaitAll2<'a, A, B> {
    type Output = (A, B);
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let a_done = this.a.poll_advance(cx);
        let b_done = this.b.poll_advance(cx);
        if a_done && b_done {
            Poll::Ready((this.a.take(), this.b.take()))
        } else {
            Poll::Pending
        }
    }
}

struct WaitAll3<'a, A, B, C> {
    a: MaybeDone<'a, A>,
    b: MaybeDone<'a, B>,
    c: MaybeDone<'a, C>,
}

impl<'a, A, B, C> Future for WaitAll3<'a, A, B, C> {
    type Output = (A, B, C);
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let a_done = this.a.poll_advance(cx);
        let b_done = this.b.poll_advance(cx);
        let c_done = this.c.poll_advance(cx);
        if a_done && b_done && c_done {
            Poll::Ready((this.a.take(), this.b.take(), this.c.take()))
        } else {
            Poll::Pending
        }
    }
}

struct WaitAll4<'a, A, B, C, D> {
    a: MaybeDone<'a, A>,
    b: MaybeDone<'a, B>,
    c: MaybeDone<'a, C>,
    d: MaybeDone<'a, D>,
}

impl<'a, A, B, C, D> Future for WaitAll4<'a, A, B, C, D> {
    type Output = (A, B, C, D);
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let a_done = this.a.poll_advance(cx);
        let b_done = this.b.poll_advance(cx);
        let c_done = this.c.poll_advance(cx);
        let d_done = this.d.poll_advance(cx);
        if a_done && b_done && c_done && d_done {
            Poll::Ready((this.a.take(), this.b.take(), this.c.take(), this.d.take()))
        } else {
            Poll::Pending
        }
    }
}

/// `wait_any` over two heterogeneous futures. Resumes as soon as either
/// completes; the other is dropped, cancelling whatever it was suspended
/// on.
pub fn wait_any2<'a, A: Future + 'a, B: Future + 'a>(
    a: A,
    b: B,
) -> impl Future<Output = Either2<A::Output, B::Output>> + 'a {
    WaitAny2 {
        a: Some(Box::pin(a)),
        b: Some(Box::pin(b)),
    }
}

pub fn wait_any3<'a, A: Future + 'a, B: Future + 'a, C: Future + 'a>(
    a: A,
    b: B,
    c: C,
) -> impl Future<Output = Either3<A::Output, B::Output, C::Output>> + 'a {
    WaitAny3 {
        a: Some(Box::pin(a)),
        b: Some(Box::pin(b)),
        c: Some(Box::pin(c)),
    }
}

pub fn wait_any4<'a, A: Future + 'a, B: Future + 'a, C: Future + 'a, D: Future + 'a>(
    a: A,
    b: B,
    c: C,
    d: D,
) -> impl Future<Output = Either4<A::Output, B::Output, C::Output, D::Output>> + 'a {
    WaitAny4 {
        a: Some(Box::pin(a)),
        b: Some(Box::pin(b)),
        c: Some(Box::pin(c)),
        d: Some(Box::pin(d)),
    }
}

struct WaitAny2<'a, A, B> {
    a: Option<Pin<Box<dyn Future<Output = A> + 'a>>>,
    b: Option<Pin<Box<dyn Future<Output = B> + 'a>>>,
}

impl<'a, A, B> Future for WaitAny2<'a, A, B> {
    type Output = Either2<A, B>;
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(fut) = this.a.as_mut() {
            if let Poll::Ready(v) = fut.as_mut().poll(cx) {
                this.a = None;
                this.b = None; // drop the loser, cancelling its suspension
                return Poll::Ready(Either2::First(v));
            }
        }
        if let Some(fut) = this.b.as_mut() {
            if let Poll::Ready(v) = fut.as_mut().poll(cx) {
                this.a = None;
                this.b = None;
                return Poll::Ready(Either2::Second(v));
            }
        }
        Poll::Pending
    }
}

struct WaitAny3<'a, A, B, C> {
    a: Option<Pin<Box<dyn Future<Output = A> + 'a>>>,
    b: Option<Pin<Box<dyn Future<Output = B> + 'a>>>,
    c: Option<Pin<Box<dyn Future<Output = C> + 'a>>>,
}

impl<'a, A, B, C> Future for WaitAny3<'a, A, B, C> {
    type Output = Either3<A, B, C>;
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(fut) = this.a.as_mut() {
            if let Poll::Ready(v) = fut.as_mut().poll(cx) {
                this.a = None;
                this.b = None;
                this.c = None;
                return Poll::Ready(Either3::First(v));
            }
        }
        if let Some(fut) = this.b.as_mut() {
            if let Poll::Ready(v) = fut.as_mut().poll(cx) {
                this.a = None;
                this.b = None;
                this.c = None;
                return Poll::Ready(Either3::Second(v));
            }
        }
        if let Some(fut) = this.c.as_mut() {
            if let Poll::Ready(v) = fut.as_mut().poll(cx) {
                this.a = None;
                this.b = None;
                this.c = None;
                return Poll::Ready(Either3::Third(v));
            }
        }
        Poll::Pending
    }
}

struct WaitAny4<'a, A, B, C, D> {
    a: Option<Pin<Box<dyn Future<Output = A> + 'a>>>,
    b: Option<Pin<Box<dyn Future<Output = B> + 'a>>>,
    c: Option<Pin<Box<dyn Future<Output = C> + 'a>>>,
    d: Option<Pin<Box<dyn Future<Output = D> + 'a>>>,
}

impl<'a, A, B, C, D> Future for WaitAny4<'a, A, B, C, D> {
    type Output = Either4<A, B, C, D>;
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        macro_rules! try_one {
            ($field:ident, $variant:ident) => {
                if let Some(fut) = this.$field.as_mut() {
                    if let Poll::Ready(v) = fut.as_mut().poll(cx) {
                        this.a = None;
                        this.b = None;
                        this.c = None;
                        this.d = None;
                        return Poll::Ready(Either4::$variant(v));
                    }
                }
            };
        }
        try_one!(a, First);
        try_one!(b, Second);
        try_one!(c, Third);
        try_one!(d, Fourth);
        Poll::Pending
    }
}

/// Homogeneous `wait_any` over a vector of same-typed futures. Returns the
/// winning index alongside its value; the rest are dropped.
pub fn wait_any_vec<'a, T>(
    futures: Vec<Pin<Box<dyn Future<Output = T> + 'a>>>,
) -> impl Future<Output = (usize, T)> + 'a {
    WaitAnyVec {
        futures: futures.into_iter().map(Some).collect(),
    }
}

struct WaitAnyVec<'a, T> {
    futures: Vec<Option<Pin<Box<dyn Future<Output = T> + 'a>>>>,
}

impl<'a, T> Future for WaitAnyVec<'a, T> {
    type Output = (usize, T);
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        for (idx, slot) in this.futures.iter_mut().enumerate() {
            if let Some(fut) = slot.as_mut() {
                if let Poll::Ready(v) = fut.as_mut().poll(cx) {
                    this.futures.clear(); // drop every other in-flight future
                    return Poll::Ready((idx, v));
                }
            }
        }
        Poll::Pending
    }
}

/// Homogeneous `wait_all` over a vector of same-typed futures.
pub fn wait_all_vec<'a, T>(
    futures: Vec<Pin<Box<dyn Future<Output = T> + 'a>>>,
) -> impl Future<Output = Vec<T>> + 'a {
    WaitAllVec {
        slots: futures.into_iter().map(MaybeDone::Polling).collect(),
    }
}

struct WaitAllVec<'a, T> {
    slots: Vec<MaybeDone<'a, T>>,
}

impl<'a, T> Future for WaitAllVec<'a, T> {
    type Output = Vec<T>;
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut all_done = true;
        for slot in this.slots.iter_mut() {
            if !slot.poll_advance(cx) {
                all_done = false;
            }
        }
        if all_done {
            Poll::Ready(this.slots.iter_mut().map(MaybeDone::take).collect())
        } else {
            Poll::Pending
        }
    }
}
