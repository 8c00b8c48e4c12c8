// Copyright (c) 2025 Trung Tran <tqtrungse@gmail.com>
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use std::thread;

use sequin::{
    queue::spsc,
    verify::{produce, report, run_interleaved, run_with, validate, Verdict},
};

#[test]
fn short_stream_in_order() {
    let (tx, rx) = spsc::bounded(8);
    produce(&tx, 5).unwrap();

    let verdict = validate(&rx, 5).unwrap();
    assert_eq!(verdict, Verdict::InOrder { last: 4 });

    let mut out = Vec::new();
    report(&verdict, &mut out).unwrap();
    assert_eq!(out, b"done\n");
}

#[test]
fn broken_stream_reports_first_break() {
    let (tx, rx) = spsc::bounded(8);
    for value in [0i64, 1, 3, 2, 4] {
        tx.send(value).unwrap();
    }

    let verdict = validate(&rx, 5).unwrap();
    assert_eq!(verdict, Verdict::OutOfOrder { previous: 1, value: 3 });

    let mut out = Vec::new();
    report(&verdict, &mut out).unwrap();
    assert_eq!(out, b"Fail at: 1 3\ndone\n");

    // Validation stops at the break; the tail stays queued.
    assert_eq!(rx.recv(), Ok(2));
    assert_eq!(rx.recv(), Ok(4));
}

#[test]
fn first_item_out_of_order() {
    let (tx, rx) = spsc::bounded(4);
    tx.send(7i64).unwrap();

    let verdict = validate(&rx, 1).unwrap();
    assert_eq!(verdict, Verdict::OutOfOrder { previous: -1, value: 7 });

    let mut out = Vec::new();
    report(&verdict, &mut out).unwrap();
    assert_eq!(out, b"Fail at: -1 7\ndone\n");
}

#[test]
fn empty_stream() {
    let (_tx, rx) = spsc::bounded::<i64>(1);
    assert_eq!(validate(&rx, 0), Ok(Verdict::InOrder { last: -1 }));

    let mut out = Vec::new();
    report(&Verdict::InOrder { last: -1 }, &mut out).unwrap();
    assert_eq!(out, b"done\n");
}

#[test]
fn end_to_end_unbounded() {
    let count = 100_000;
    let mut out = Vec::new();
    let verdict = run_with(count, &mut out).unwrap();

    assert_eq!(verdict, Verdict::InOrder { last: count as i64 - 1 });
    assert_eq!(out, b"done\n");
}

#[test]
fn done_prints_once_per_run() {
    let mut out = Vec::new();
    run_with(1000, &mut out).unwrap();
    run_with(1000, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("done").count(), 2);
    assert!(!text.contains("Fail at"));
}

#[test]
fn end_to_end_bounded_backpressure() {
    let count = 50_000u64;
    let (tx, rx) = spsc::bounded(8);

    let producer = thread::spawn(move || produce(&tx, count));
    let verdict = validate(&rx, count).unwrap();
    producer.join().unwrap().unwrap();

    assert_eq!(verdict, Verdict::InOrder { last: count as i64 - 1 });
}

#[test]
fn closed_queue_surfaces_as_error() {
    let (tx, rx) = spsc::unbounded::<i64>();
    tx.close();

    assert!(validate(&rx, 5).is_err());
}

#[test]
fn interleaved_producers() {
    let verdict = run_interleaved(4, 40_000).unwrap();
    assert_eq!(verdict, Verdict::InOrder { last: 39_999 });
}

#[test]
fn interleaved_single_producer() {
    let verdict = run_interleaved(1, 10_000).unwrap();
    assert_eq!(verdict, Verdict::InOrder { last: 9_999 });
}
