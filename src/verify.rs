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

//! End-to-end FIFO verification.
//!
//! A producer streams the integers `0..count` through a queue and a
//! consumer checks that they arrive strictly ascending, one step at a
//! time. The consumer's conclusion is a [`Verdict`]; [`report`] renders
//! it in the classic two-line form, ending with `done`.
//!
//! The harness runs over any endpoint pair through the [`Enqueue`] and
//! [`Dequeue`] traits, so the same checks cover every queue flavor.

use std::{io, io::Write, sync::Arc, thread};

use crate::{
    queue::{
        error::{RecvError, SendError},
        mpmc, spsc,
    },
    wg::WaitGroup,
};

/// A producer-side queue handle.
pub trait Enqueue<T>: Send {
    /// Hands `value` to the queue, blocking if it must.
    fn enqueue(&self, value: T) -> Result<(), SendError<T>>;
}

/// A consumer-side queue handle.
pub trait Dequeue<T>: Send {
    /// Takes the next value, blocking while the queue is empty.
    fn dequeue(&self) -> Result<T, RecvError>;
}

impl<T: Send> Enqueue<T> for spsc::BSender<T> {
    #[inline]
    fn enqueue(&self, value: T) -> Result<(), SendError<T>> {
        self.send(value)
    }
}

impl<T: Send> Enqueue<T> for spsc::USender<T> {
    #[inline]
    fn enqueue(&self, value: T) -> Result<(), SendError<T>> {
        self.send(value)
    }
}

impl<T: Send> Enqueue<T> for mpmc::BSender<T> {
    #[inline]
    fn enqueue(&self, value: T) -> Result<(), SendError<T>> {
        self.send(value)
    }
}

impl<T: Send> Enqueue<T> for mpmc::USender<T> {
    #[inline]
    fn enqueue(&self, value: T) -> Result<(), SendError<T>> {
        self.send(value)
    }
}

impl<T: Send> Dequeue<T> for spsc::BReceiver<T> {
    #[inline]
    fn dequeue(&self) -> Result<T, RecvError> {
        self.recv()
    }
}

impl<T: Send> Dequeue<T> for spsc::UReceiver<T> {
    #[inline]
    fn dequeue(&self) -> Result<T, RecvError> {
        self.recv()
    }
}

impl<T: Send> Dequeue<T> for mpmc::BReceiver<T> {
    #[inline]
    fn dequeue(&self) -> Result<T, RecvError> {
        self.recv()
    }
}

impl<T: Send> Dequeue<T> for mpmc::UReceiver<T> {
    #[inline]
    fn dequeue(&self) -> Result<T, RecvError> {
        self.recv()
    }
}

/// The consumer's conclusion about a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every value arrived in order; `last` is the final one seen,
    /// or -1 for an empty stream.
    InOrder { last: i64 },
    /// The first value that broke the sequence, together with the one
    /// accepted just before it.
    OutOfOrder { previous: i64, value: i64 },
}

impl Verdict {
    #[inline]
    pub fn is_in_order(&self) -> bool {
        matches!(self, Verdict::InOrder { .. })
    }
}

/// Streams `0..count` into the queue.
pub fn produce(tx: &impl Enqueue<i64>, count: u64) -> Result<(), SendError<i64>> {
    for value in 0..count {
        tx.enqueue(value as i64)?;
    }
    Ok(())
}

/// Consumes `count` values, checking each is exactly one past the last.
///
/// Starts from -1 so the stream must open with 0. Stops at the first
/// value out of step, leaving the rest of the stream in the queue.
///
/// # Examples
///
/// ```
/// use sequin::queue::spsc::bounded;
/// use sequin::verify::{validate, Verdict};
///
/// let (tx, rx) = bounded(8);
/// for value in [0, 1, 3] {
///     tx.send(value).unwrap();
/// }
///
/// assert_eq!(
///     validate(&rx, 3),
///     Ok(Verdict::OutOfOrder { previous: 1, value: 3 }),
/// );
/// ```
pub fn validate(rx: &impl Dequeue<i64>, count: u64) -> Result<Verdict, RecvError> {
    let mut previous: i64 = -1;
    for _ in 0..count {
        let value = rx.dequeue()?;
        if value != previous + 1 {
            return Ok(Verdict::OutOfOrder { previous, value });
        }
        previous = value;
    }
    Ok(Verdict::InOrder { last: previous })
}

/// Renders a verdict: a `Fail at:` line for a broken stream, then
/// `done` either way.
pub fn report<W: Write>(verdict: &Verdict, out: &mut W) -> io::Result<()> {
    if let Verdict::OutOfOrder { previous, value } = verdict {
        writeln!(out, "Fail at: {} {}", previous, value)?;
    }
    writeln!(out, "done")
}

/// Runs one producer against one consumer, reporting to stdout.
#[inline]
pub fn run(count: u64) -> io::Result<Verdict> {
    run_with(count, io::stdout())
}

/// Runs one producer against one consumer, reporting to `out`.
///
/// The producer gets its own thread; the calling thread consumes.
///
/// # Examples
///
/// ```
/// use sequin::verify::{run_with, Verdict};
///
/// let verdict = run_with(1000, std::io::sink()).unwrap();
/// assert_eq!(verdict, Verdict::InOrder { last: 999 });
/// ```
pub fn run_with<W: Write>(count: u64, mut out: W) -> io::Result<Verdict> {
    let (tx, rx) = spsc::unbounded();
    let producer = thread::spawn(move || produce(&tx, count));

    let outcome = validate(&rx, count);
    if producer.join().is_err() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "producer thread panicked",
        ));
    }
    let verdict = outcome.map_err(|e| io::Error::new(io::ErrorKind::UnexpectedEof, e))?;

    report(&verdict, &mut out)?;
    Ok(verdict)
}

/// Streams `offset, offset + stride, ...` below `count` into the queue.
///
/// Together, strided producers at offsets `0..stride` cover `0..count`
/// exactly once.
pub fn produce_strided(
    tx: &impl Enqueue<i64>,
    offset: u64,
    stride: u64,
    count: u64,
) -> Result<(), SendError<i64>> {
    let mut value = offset;
    while value < count {
        tx.enqueue(value as i64)?;
        value += stride;
    }
    Ok(())
}

/// Consumes `count` values produced by `streams` strided producers,
/// checking that each stream arrives in its own ascending order.
///
/// A value belongs to the stream given by its remainder modulo
/// `streams`; within a stream, consecutive values differ by exactly
/// `streams`. Interleaving across streams is free.
pub fn validate_interleaved(
    rx: &impl Dequeue<i64>,
    streams: u64,
    count: u64,
) -> Result<Verdict, RecvError> {
    let streams = streams.max(1);
    let stride = streams as i64;
    let mut previous: Vec<i64> = (0..stride).map(|s| s - stride).collect();

    for _ in 0..count {
        let value = rx.dequeue()?;
        let stream = (value.rem_euclid(stride)) as usize;
        if value != previous[stream] + stride {
            return Ok(Verdict::OutOfOrder {
                previous: previous[stream],
                value,
            });
        }
        previous[stream] = value;
    }
    Ok(Verdict::InOrder {
        last: count as i64 - 1,
    })
}

/// Runs `producers` strided producers against one consumer.
///
/// Producers share an unbounded queue and a [`WaitGroup`]; the call
/// returns once every producer has finished and the consumer has seen
/// all `count` values.
pub fn run_interleaved(producers: u64, count: u64) -> Result<Verdict, RecvError> {
    let producers = producers.max(1);
    let (tx, rx) = mpmc::unbounded();
    let wg = Arc::new(WaitGroup::new(producers as u32));

    let mut threads = Vec::new();
    for offset in 0..producers {
        let tx = tx.clone();
        let wg = wg.clone();
        threads.push(thread::spawn(move || {
            let result = produce_strided(&tx, offset, producers, count);
            wg.done();
            result
        }));
    }

    let verdict = validate_interleaved(&rx, producers, count)?;
    wg.wait();
    for thread in threads {
        if thread.join().is_err() {
            return Err(RecvError);
        }
    }
    Ok(verdict)
}

#[cfg(test)]
mod test {
    use super::{report, validate, Verdict};
    use crate::queue::spsc::bounded;

    #[test]
    fn empty_stream_is_in_order() {
        let (_tx, rx) = bounded::<i64>(1);
        assert_eq!(validate(&rx, 0), Ok(Verdict::InOrder { last: -1 }));
    }

    #[test]
    fn report_in_order() {
        let mut out = Vec::new();
        report(&Verdict::InOrder { last: 41 }, &mut out).unwrap();
        assert_eq!(out, b"done\n");
    }

    #[test]
    fn report_out_of_order() {
        let mut out = Vec::new();
        report(&Verdict::OutOfOrder { previous: 1, value: 3 }, &mut out).unwrap();
        assert_eq!(out, b"Fail at: 1 3\ndone\n");
    }

    #[test]
    fn stops_at_first_break() {
        let (tx, rx) = bounded(8);
        for value in [0i64, 1, 3, 2, 4] {
            tx.send(value).unwrap();
        }

        assert_eq!(
            validate(&rx, 5),
            Ok(Verdict::OutOfOrder { previous: 1, value: 3 }),
        );
        // The tail of the stream stays in the queue.
        assert_eq!(rx.recv(), Ok(2));
        assert_eq!(rx.recv(), Ok(4));
    }
}
