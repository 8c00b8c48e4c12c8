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

//! Multi-producer multi-consumer queues.
//!
//! Endpoints are cheap to clone; every clone talks to the same queue.

use std::{cell::UnsafeCell, sync::Arc};

use crate::queue::{
    bounded::{MpmcRing, Ring},
    error::{RecvError, SendError, TryRecvError, TrySendError},
    unbounded::MpmcChain,
    waker::Checker,
};

/// Creates a queue with a fixed capacity.
///
/// The capacity is rounded up to the next power of two; a capacity of 0
/// is backed by a single slot.
///
/// # Examples
///
/// ```
/// use std::thread;
///
/// use sequin::queue::mpmc::bounded;
///
/// let (tx, rx) = bounded(4);
/// let tx2 = tx.clone();
///
/// let a = thread::spawn(move || tx.send(1).unwrap());
/// let b = thread::spawn(move || tx2.send(1).unwrap());
///
/// assert_eq!(rx.recv(), Ok(1));
/// assert_eq!(rx.recv(), Ok(1));
/// a.join().unwrap();
/// b.join().unwrap();
/// ```
#[inline]
pub fn bounded<T: Send>(cap: u32) -> (BSender<T>, BReceiver<T>) {
    let queue = Arc::new(UnsafeCell::new(MpmcRing::new(cap)));
    (BSender::new(queue.clone()), BReceiver::new(queue))
}

/// The sending side of a bounded queue.
pub struct BSender<T> {
    inner: Arc<UnsafeCell<MpmcRing<T>>>,
}

unsafe impl<T: Send> Send for BSender<T> {}

unsafe impl<T: Send> Sync for BSender<T> {}

impl<T: Send> Clone for BSender<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send> BSender<T> {
    #[inline]
    fn new(inner: Arc<UnsafeCell<MpmcRing<T>>>) -> Self {
        Self { inner }
    }

    /// Attempts to send a message without blocking.
    ///
    /// Fails with `Full` if the buffer has no free slot and with
    /// `Disconnected` if the queue was closed. The error carries the
    /// message back.
    #[inline]
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        unsafe { (*self.inner.get()).try_send(value) }
    }

    /// Sends a message, blocking while the queue is full.
    ///
    /// Wakes up with an error if the queue closes while waiting; the
    /// error carries the message back.
    #[inline]
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        unsafe { (*self.inner.get()).send(value, (*self.inner.get()).checker()) }
    }

    /// Messages currently buffered.
    #[inline]
    pub fn length(&self) -> u32 {
        unsafe { (*self.inner.get()).length() }
    }

    /// Closes the queue.
    ///
    /// Later sends fail; buffered messages stay receivable.
    ///
    /// # Examples
    ///
    /// ```
    /// use sequin::queue::mpmc::bounded;
    /// use sequin::queue::error::RecvError;
    ///
    /// let (tx, rx) = bounded(2);
    ///
    /// tx.send(1).unwrap();
    /// tx.close();
    ///
    /// assert!(tx.send(2).is_err());
    /// assert_eq!(rx.recv(), Ok(1));
    /// assert_eq!(rx.recv(), Err(RecvError));
    /// ```
    #[inline]
    pub fn close(&self) {
        unsafe { (*self.inner.get()).close() }
    }

    /// Whether the queue was closed.
    #[inline]
    pub fn is_close(&self) -> bool {
        unsafe { (*self.inner.get()).is_close() }
    }
}

/// The receiving side of a bounded queue.
pub struct BReceiver<T> {
    inner: Arc<UnsafeCell<MpmcRing<T>>>,
}

unsafe impl<T: Send> Send for BReceiver<T> {}

unsafe impl<T: Send> Sync for BReceiver<T> {}

impl<T: Send> Clone for BReceiver<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send> BReceiver<T> {
    #[inline]
    fn new(inner: Arc<UnsafeCell<MpmcRing<T>>>) -> Self {
        Self { inner }
    }

    /// Attempts to receive a message without blocking.
    #[inline]
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        unsafe { (*self.inner.get()).try_recv() }
    }

    /// Receives a message, blocking while the queue is empty.
    ///
    /// A closed queue still drains; the error only surfaces once it is
    /// both closed and empty.
    #[inline]
    pub fn recv(&self) -> Result<T, RecvError> {
        unsafe { (*self.inner.get()).recv((*self.inner.get()).checker()) }
    }

    /// Messages currently buffered.
    #[inline]
    pub fn length(&self) -> u32 {
        unsafe { (*self.inner.get()).length() }
    }

    /// Closes the queue.
    ///
    /// Later sends fail; buffered messages stay receivable.
    #[inline]
    pub fn close(&self) {
        unsafe { (*self.inner.get()).close() }
    }

    /// Whether the queue was closed.
    #[inline]
    pub fn is_close(&self) -> bool {
        unsafe { (*self.inner.get()).is_close() }
    }
}

//======================
//      UNBOUNDED
//======================

/// Creates a queue of unbounded capacity.
///
/// Sends never block; memory is the only limit.
///
/// # Examples
///
/// ```
/// use std::thread;
///
/// use sequin::queue::mpmc::unbounded;
///
/// let (tx, rx) = unbounded();
/// let tx2 = tx.clone();
///
/// let thread = thread::spawn(move || {
///     for i in 0..1000 {
///         tx2.send(i).unwrap();
///     }
/// });
///
/// for i in 0..1000 {
///     tx.send(i).unwrap();
/// }
/// for _ in 0..2000 {
///     rx.recv().unwrap();
/// }
/// thread.join().unwrap();
/// ```
#[inline]
pub fn unbounded<T: Send>() -> (USender<T>, UReceiver<T>) {
    let queue = Arc::new(UnsafeCell::new(MpmcChain::default()));
    (USender::new(queue.clone()), UReceiver::new(queue))
}

/// The sending side of an unbounded queue.
pub struct USender<T> {
    inner: Arc<UnsafeCell<MpmcChain<T>>>,
}

unsafe impl<T: Send> Send for USender<T> {}

unsafe impl<T: Send> Sync for USender<T> {}

impl<T: Send> Clone for USender<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send> USender<T> {
    #[inline]
    fn new(inner: Arc<UnsafeCell<MpmcChain<T>>>) -> Self {
        Self { inner }
    }

    /// Sends a message. Only a closed queue refuses.
    #[inline]
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        unsafe { (*self.inner.get()).send(value) }
    }

    /// Closes the queue.
    ///
    /// Later sends fail; buffered messages stay receivable.
    #[inline]
    pub fn close(&self) {
        unsafe { (*self.inner.get()).close() }
    }
}

/// The receiving side of an unbounded queue.
pub struct UReceiver<T> {
    inner: Arc<UnsafeCell<MpmcChain<T>>>,
}

unsafe impl<T: Send> Send for UReceiver<T> {}

unsafe impl<T: Send> Sync for UReceiver<T> {}

impl<T: Send> Clone for UReceiver<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send> UReceiver<T> {
    #[inline]
    fn new(inner: Arc<UnsafeCell<MpmcChain<T>>>) -> Self {
        Self { inner }
    }

    /// Receives a message, blocking while the queue is empty.
    ///
    /// When the queue closes, waiters wake up, drain what is left and
    /// then get an error.
    #[inline]
    pub fn recv(&self) -> Result<T, RecvError> {
        unsafe { (*self.inner.get()).recv() }
    }

    /// Closes the queue.
    ///
    /// Later sends fail; buffered messages stay receivable.
    #[inline]
    pub fn close(&self) {
        unsafe { (*self.inner.get()).close() }
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::{bounded, unbounded, BReceiver, BSender, UReceiver, USender};

    fn is_send<T: Send>() {}

    #[test]
    fn endpoints_are_send() {
        is_send::<BSender<i32>>();
        is_send::<BReceiver<i32>>();
        is_send::<USender<i32>>();
        is_send::<UReceiver<i32>>();
    }

    #[test]
    fn send_shared_recv() {
        let (tx1, rx) = bounded(4);
        let tx2 = tx1.clone();

        tx1.send(1).unwrap();
        assert_eq!(rx.recv().unwrap(), 1);

        tx2.send(2).unwrap();
        assert_eq!(rx.recv().unwrap(), 2);
    }

    #[test]
    fn blocked_receiver_wakes_on_close() {
        let (tx, rx) = bounded::<i32>(1);
        let thread = thread::spawn(move || {
            assert!(rx.recv().is_err());
        });
        tx.close();
        thread.join().unwrap();
    }

    #[test]
    fn unbounded_many_producers() {
        let amount = 5_000;
        let producers = 4;
        let (tx, rx) = unbounded();

        let mut threads = Vec::new();
        for _ in 0..producers {
            let tx = tx.clone();
            threads.push(thread::spawn(move || {
                for i in 0..amount {
                    tx.send(i).unwrap();
                }
            }));
        }

        for _ in 0..producers * amount {
            rx.recv().unwrap();
        }
        for thread in threads {
            thread.join().unwrap();
        }
    }
}
