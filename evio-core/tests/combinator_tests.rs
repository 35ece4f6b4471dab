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
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use evio_core::{
    wait_all2, wait_all3, wait_all4, wait_all_vec, wait_any2, wait_any3, wait_any4, wait_any_vec,
    Either2, Either3, Either4,
};
use evio_test_support::with_event_loop;

/// A future that never completes on its own, and flips a shared flag when
/// dropped. Stands in for "some operation still in flight" when a test
/// only cares about whether `wait_any*` actually cancels its losers.
struct PendsForever {
    dropped: Rc<Cell<bool>>,
}

impl Future for PendsForever {
    type Output = ();
    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        Poll::Pending
    }
}

impl Drop for PendsForever {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}

fn pends_forever() -> (PendsForever, Rc<Cell<bool>>) {
    let dropped = Rc::new(Cell::new(false));
    (
        PendsForever {
            dropped: dropped.clone(),
        },
        dropped,
    )
}

#[test]
fn wait_all2_collects_both_outputs() {
    with_event_loop(|event_loop| {
        let result = event_loop.block_on(wait_all2(async { 1 }, async { "a" }));
        assert_eq!(result, (1, "a"));
    });
}

#[test]
fn wait_all3_and_wait_all4_collect_in_declaration_order() {
    with_event_loop(|event_loop| {
        let result3 = event_loop.block_on(wait_all3(async { 1 }, async { 2 }, async { 3 }));
        assert_eq!(result3, (1, 2, 3));

        let result4 = event_loop.block_on(wait_all4(async { 1 }, async { 2 }, async { 3 }, async { 4 }));
        assert_eq!(result4, (1, 2, 3, 4));
    });
}

#[test]
fn wait_any2_resumes_on_first_completion_and_drops_the_loser() {
    with_event_loop(|event_loop| {
        let (loser, loser_dropped) = pends_forever();
        let result = event_loop.block_on(wait_any2(async { 7 }, loser));
        assert!(matches!(result, Either2::First(7)));
        assert!(loser_dropped.get(), "the still-pending side must be dropped once the other side wins");
    });
}

#[test]
fn wait_any3_and_wait_any4_report_which_input_won() {
    with_event_loop(|event_loop| {
        let (b_loser, _b_dropped) = pends_forever();
        let (c_loser, _c_dropped) = pends_forever();
        let result = event_loop.block_on(wait_any3(async { "won" }, b_loser, c_loser));
        assert!(matches!(result, Either3::First("won")));

        let (a_loser, _a_dropped) = pends_forever();
        let (c_loser, _c_dropped) = pends_forever();
        let (d_loser, _d_dropped) = pends_forever();
        let result = event_loop.block_on(wait_any4(a_loser, async { 99 }, c_loser, d_loser));
        assert!(matches!(result, Either4::Second(99)));
    });
}

#[test]
fn wait_any_vec_reports_the_winning_index() {
    with_event_loop(|event_loop| {
        let (loser_0, _d0) = pends_forever();
        let (loser_2, _d2) = pends_forever();
        let futures: Vec<Pin<Box<dyn Future<Output = i32>>>> =
            vec![Box::pin(loser_0), Box::pin(async { 42 }), Box::pin(loser_2)];
        let (winning_index, value) = event_loop.block_on(wait_any_vec(futures));
        assert_eq!(winning_index, 1);
        assert_eq!(value, 42);
    });
}

#[test]
fn wait_all_vec_preserves_input_order_regardless_of_completion_order() {
    with_event_loop(|event_loop| {
        let handle = event_loop.handle();
        let handle_slow = handle.clone();
        let futures: Vec<Pin<Box<dyn Future<Output = &'static str>>>> = vec![
            Box::pin(async move {
                handle_slow.sleep(Duration::from_millis(20)).await;
                "slow"
            }),
            Box::pin(async { "fast" }),
        ];
        let results = event_loop.block_on(wait_all_vec(futures));
        assert_eq!(results, vec!["slow", "fast"]);
    });
}

#[test]
fn wait_any_races_a_sleep_against_an_operation_for_a_timeout_idiom() {
    with_event_loop(|event_loop| {
        let handle = event_loop.handle();
        let (never_ready, never_dropped) = pends_forever();
        let result = event_loop.block_on(async move {
            wait_any2(never_ready, handle.sleep(Duration::from_millis(5))).await
        });
        assert!(matches!(result, Either2::Second(())), "the timeout should win a race against an operation that never completes");
        assert!(never_dropped.get());
    });
}
