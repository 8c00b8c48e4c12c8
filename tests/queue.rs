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

use std::{
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
    thread,
};

use sequin::queue::{
    error::{RecvError, TryRecvError, TrySendError},
    mpmc, spsc,
};

#[test]
fn spsc_bounded_try_ops() {
    let (tx, rx) = spsc::bounded(1);

    assert_eq!(rx.try_recv(), Err(TryRecvError));
    assert_eq!(tx.try_send(1), Ok(()));
    assert_eq!(tx.try_send(2), Err(TrySendError::Full(2)));
    assert_eq!(rx.try_recv(), Ok(1));
    assert_eq!(rx.try_recv(), Err(TryRecvError));
}

#[test]
fn spsc_bounded_length() {
    let (tx, rx) = spsc::bounded(4);
    assert_eq!(tx.length(), 0);

    tx.send(1).unwrap();
    tx.send(2).unwrap();
    assert_eq!(tx.length(), 2);
    assert_eq!(rx.length(), 2);

    rx.recv().unwrap();
    assert_eq!(rx.length(), 1);
}

#[test]
fn spsc_bounded_pingpong() {
    let amount = 100_000u64;
    let (tx, rx) = spsc::bounded(64);

    let producer = thread::spawn(move || {
        for i in 0..amount {
            tx.send(i).unwrap();
        }
    });

    for i in 0..amount {
        assert_eq!(rx.recv(), Ok(i));
    }
    producer.join().unwrap();
}

#[test]
fn spsc_close_drains_then_errors() {
    let (tx, rx) = spsc::bounded(4);

    tx.send(1).unwrap();
    tx.send(2).unwrap();
    tx.close();

    assert!(tx.send(3).is_err());
    assert_eq!(rx.recv(), Ok(1));
    assert_eq!(rx.recv(), Ok(2));
    assert_eq!(rx.recv(), Err(RecvError));
}

#[test]
fn spsc_unbounded_burst() {
    let amount = 200_000u64;
    let (tx, rx) = spsc::unbounded();

    // The whole burst fits before the receiver starts, crossing many
    // segment boundaries.
    for i in 0..amount {
        tx.send(i).unwrap();
    }
    for i in 0..amount {
        assert_eq!(rx.recv(), Ok(i));
    }
}

#[test]
fn spsc_unbounded_close_wakes_receiver() {
    let (tx, rx) = spsc::unbounded::<u64>();

    let receiver = thread::spawn(move || {
        assert_eq!(rx.recv(), Err(RecvError));
    });
    tx.close();
    receiver.join().unwrap();
}

#[test]
fn mpsc_bounded() {
    let amount = 20_000u64;
    let threads = num_cpus::get().max(2) as u64;
    let (tx, rx) = mpmc::bounded(64);

    let mut producers = Vec::new();
    for _ in 0..threads {
        let tx = tx.clone();
        producers.push(thread::spawn(move || {
            for i in 0..amount {
                tx.send(i).unwrap();
            }
        }));
    }

    let mut sum = 0u64;
    for _ in 0..threads * amount {
        sum += rx.recv().unwrap();
    }
    assert_eq!(sum, threads * (amount * (amount - 1) / 2));

    for producer in producers {
        producer.join().unwrap();
    }
}

#[test]
fn mpmc_bounded() {
    let amount = 20_000u64;
    let threads = (num_cpus::get().max(2) / 2).max(1) as u64;
    let (tx, rx) = mpmc::bounded(64);
    let total = Arc::new(AtomicU64::new(0));

    let mut workers = Vec::new();
    for _ in 0..threads {
        let tx = tx.clone();
        workers.push(thread::spawn(move || {
            for i in 0..amount {
                tx.send(i).unwrap();
            }
        }));
    }
    for _ in 0..threads {
        let rx = rx.clone();
        let total = total.clone();
        workers.push(thread::spawn(move || {
            let mut sum = 0u64;
            for _ in 0..amount {
                sum += rx.recv().unwrap();
            }
            total.fetch_add(sum, Ordering::Relaxed);
        }));
    }

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(
        total.load(Ordering::Relaxed),
        threads * (amount * (amount - 1) / 2),
    );
}

#[test]
fn mpmc_unbounded() {
    let amount = 20_000u64;
    let threads = num_cpus::get().max(2) as u64;
    let (tx, rx) = mpmc::unbounded();
    let total = Arc::new(AtomicU64::new(0));

    let mut workers = Vec::new();
    for _ in 0..threads {
        let tx = tx.clone();
        workers.push(thread::spawn(move || {
            for i in 0..amount {
                tx.send(i).unwrap();
            }
        }));
    }
    for _ in 0..threads {
        let rx = rx.clone();
        let total = total.clone();
        workers.push(thread::spawn(move || {
            let mut sum = 0u64;
            for _ in 0..amount {
                sum += rx.recv().unwrap();
            }
            total.fetch_add(sum, Ordering::Relaxed);
        }));
    }

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(
        total.load(Ordering::Relaxed),
        threads * (amount * (amount - 1) / 2),
    );
}

#[test]
fn mpmc_unbounded_segment_churn() {
    // Far more values than one segment holds, so producers keep linking
    // fresh segments while receivers advance past drained ones. Every
    // successor a receiver observes must stay valid until the head moves.
    let amount = 50_000u64;
    let producers = 4u64;
    let consumers = 4u64;
    let (tx, rx) = mpmc::unbounded();
    let total = Arc::new(AtomicU64::new(0));

    let mut workers = Vec::new();
    for _ in 0..producers {
        let tx = tx.clone();
        workers.push(thread::spawn(move || {
            for i in 0..amount {
                tx.send(i).unwrap();
            }
        }));
    }
    for _ in 0..consumers {
        let rx = rx.clone();
        let total = total.clone();
        workers.push(thread::spawn(move || {
            let mut sum = 0u64;
            for _ in 0..producers * amount / consumers {
                sum += rx.recv().unwrap();
            }
            total.fetch_add(sum, Ordering::Relaxed);
        }));
    }

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(
        total.load(Ordering::Relaxed),
        producers * (amount * (amount - 1) / 2),
    );
}

#[test]
fn mpmc_close_unblocks_all_receivers() {
    let (tx, rx) = mpmc::bounded::<u64>(4);

    let mut receivers = Vec::new();
    for _ in 0..4 {
        let rx = rx.clone();
        receivers.push(thread::spawn(move || {
            // Either a buffered value or the closed error; never a hang.
            let _ = rx.recv();
        }));
    }

    tx.send(1).unwrap();
    tx.close();
    for receiver in receivers {
        receiver.join().unwrap();
    }
}

#[test]
fn zero_capacity_still_carries() {
    let (tx, rx) = spsc::bounded(0);

    let producer = thread::spawn(move || {
        for i in 0..1000u64 {
            tx.send(i).unwrap();
        }
    });
    for i in 0..1000u64 {
        assert_eq!(rx.recv(), Ok(i));
    }
    producer.join().unwrap();
}

#[test]
fn drops_buffered_values() {
    let (tx, _rx) = spsc::bounded(8);
    tx.send(String::from("left behind")).unwrap();
    tx.send(String::from("also left")).unwrap();
    // Dropping both endpoints must free the buffered strings.
}
