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

use std::thread;
use std::time::Duration;

use evio_core::queue;
use evio_test_support::with_event_loop;

#[test]
fn a_worker_thread_can_send_values_the_event_loop_thread_receives() {
    with_event_loop(|event_loop| {
        let handle = event_loop.handle();
        let (tx, rx) = queue::channel::<u32>(handle).expect("eventfd setup should not fail in a test sandbox");

        // Sleeping before the first send gives the event loop's `recv` a
        // chance to actually suspend on the eventfd before anything is
        // queued, so this exercises the wakeup path rather than just
        // finding a value already sitting in the deque.
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            for i in 0..3u32 {
                tx.send(i);
            }
        });

        event_loop.block_on(async move {
            let mut received = Vec::new();
            for _ in 0..3 {
                received.push(rx.recv().await);
            }
            assert_eq!(received, vec![0, 1, 2]);
        });

        worker.join().expect("worker thread should not panic");
    });
}

#[test]
fn cloned_senders_on_separate_threads_both_reach_the_same_receiver() {
    with_event_loop(|event_loop| {
        let handle = event_loop.handle();
        let (tx, rx) = queue::channel::<&'static str>(handle).expect("eventfd setup should not fail in a test sandbox");
        let tx2 = tx.clone();

        let worker_a = thread::spawn(move || tx.send("from a"));
        let worker_b = thread::spawn(move || tx2.send("from b"));

        event_loop.block_on(async move {
            let mut received = vec![rx.recv().await, rx.recv().await];
            received.sort_unstable();
            assert_eq!(received, vec!["from a", "from b"]);
        });

        worker_a.join().expect("worker thread should not panic");
        worker_b.join().expect("worker thread should not panic");
    });
}
