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

//! Single-producer single-consumer queues.

use std::{cell::UnsafeCell, sync::Arc};

use crate::queue::{
    bounded::{Ring, SpscRing},
    error::{RecvError, SendError, TryRecvError, TrySendError},
    unbounded::SpscChain,
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
/// use sequin::queue::spsc::bounded;
///
/// let (tx, rx) = bounded(2);
///
/// let thread = thread::spawn(move || {
///     tx.send(1).unwrap();
///     tx.send(2).unwrap();
/// });
///
/// assert_eq!(rx.recv(), Ok(1));
/// assert_eq!(rx.recv(), Ok(2));
/// thread.join().unwrap();
/// ```
#[inline]
pub fn bounded<T: Send>(cap: u32) -> (BSender<T>, BReceiver<T>) {
    let queue = Arc::new(UnsafeCell::new(SpscRing::new(cap)));
    (BSender::new(queue.clone()), BReceiver::new(queue))
}

/// The sending side of a bounded queue.
pub struct BSender<T> {
    inner: Arc<UnsafeCell<SpscRing<T>>>,
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
    fn new(inner: Arc<UnsafeCell<SpscRing<T>>>) -> Self {
        Self { inner }
    }

    /// Attempts to send a message without blocking.
    ///
    /// Fails with `Full` if the buffer has no free slot and with
    /// `Disconnected` if the queue was closed. The error carries the
    /// message back.
    ///
    /// # Examples
    ///
    /// ```
    /// use sequin::queue::spsc::bounded;
    /// use sequin::queue::error::TrySendError;
    ///
    /// let (tx, rx) = bounded(1);
    ///
    /// assert_eq!(tx.try_send(1), Ok(()));
    /// assert_eq!(tx.try_send(2), Err(TrySendError::Full(2)));
    ///
    /// rx.close();
    /// assert_eq!(tx.try_send(3), Err(TrySendError::Disconnected(3)));
    /// ```
    #[inline]
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        unsafe { (*self.inner.get()).try_send(value) }
    }

    /// Sends a message, blocking while the queue is full.
    ///
    /// Wakes up with an error if the queue closes while waiting; the
    /// error carries the message back.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::thread;
    ///
    /// use sequin::queue::spsc::bounded;
    ///
    /// let (tx, rx) = bounded(1);
    ///
    /// let thread = thread::spawn(move || {
    ///     // The second send blocks until the first message is drained.
    ///     tx.send(1).unwrap();
    ///     tx.send(2).unwrap();
    /// });
    ///
    /// assert_eq!(rx.recv(), Ok(1));
    /// assert_eq!(rx.recv(), Ok(2));
    /// thread.join().unwrap();
    /// ```
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
    inner: Arc<UnsafeCell<SpscRing<T>>>,
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
    fn new(inner: Arc<UnsafeCell<SpscRing<T>>>) -> Self {
        Self { inner }
    }

    /// Attempts to receive a message without blocking.
    ///
    /// # Examples
    ///
    /// ```
    /// use sequin::queue::spsc::bounded;
    /// use sequin::queue::error::TryRecvError;
    ///
    /// let (tx, rx) = bounded(1);
    /// assert_eq!(rx.try_recv(), Err(TryRecvError));
    ///
    /// tx.send(5).unwrap();
    /// assert_eq!(rx.try_recv(), Ok(5));
    /// ```
    #[inline]
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        unsafe { (*self.inner.get()).try_recv() }
    }

    /// Receives a message, blocking while the queue is empty.
    ///
    /// A closed queue still drains; the error only surfaces once it is
    /// both closed and empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::thread;
    ///
    /// use sequin::queue::spsc::bounded;
    /// use sequin::queue::error::RecvError;
    ///
    /// let (tx, rx) = bounded(2);
    ///
    /// let thread = thread::spawn(move || {
    ///     tx.send(5).unwrap();
    ///     tx.close();
    /// });
    ///
    /// assert_eq!(rx.recv(), Ok(5));
    /// assert_eq!(rx.recv(), Err(RecvError));
    /// thread.join().unwrap();
    /// ```
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
/// use sequin::queue::spsc::unbounded;
///
/// let (tx, rx) = unbounded();
///
/// for i in 0..10_000 {
///     tx.send(i).unwrap();
/// }
/// for i in 0..10_000 {
///     assert_eq!(rx.recv(), Ok(i));
/// }
/// ```
#[inline]
pub fn unbounded<T: Send>() -> (USender<T>, UReceiver<T>) {
    let queue = Arc::new(UnsafeCell::new(SpscChain::default()));
    (USender::new(queue.clone()), UReceiver::new(queue))
}

/// The sending side of an unbounded queue.
pub struct USender<T> {
    inner: Arc<UnsafeCell<SpscChain<T>>>,
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
    fn new(inner: Arc<UnsafeCell<SpscChain<T>>>) -> Self {
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
    inner: Arc<UnsafeCell<SpscChain<T>>>,
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
    fn new(inner: Arc<UnsafeCell<SpscChain<T>>>) -> Self {
        Self { inner }
    }

    /// Receives a message, blocking while the queue is empty.
    ///
    /// When the queue closes, waiters wake up, drain what is left and
    /// then get an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::thread;
    ///
    /// use sequin::queue::spsc::unbounded;
    /// use sequin::queue::error::RecvError;
    ///
    /// let (tx, rx) = unbounded();
    ///
    /// let thread = thread::spawn(move || {
    ///     tx.send(5).unwrap();
    ///     tx.close();
    /// });
    ///
    /// assert_eq!(rx.recv(), Ok(5));
    /// assert_eq!(rx.recv(), Err(RecvError));
    /// thread.join().unwrap();
    /// ```
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
    fn send_recv() {
        let (tx_b, rx_b) = bounded(3);
        tx_b.try_send(1).unwrap();
        assert_eq!(rx_b.try_recv().unwrap(), 1);

        let (tx_u, rx_u) = unbounded();
        tx_u.send(1).unwrap();
        assert_eq!(rx_u.recv().unwrap(), 1);
    }

    #[test]
    fn send_recv_threads() {
        let (tx_b, rx_b) = bounded(4);
        let thread = thread::spawn(move || {
            tx_b.send(1).unwrap();
        });
        assert_eq!(rx_b.recv().unwrap(), 1);
        thread.join().unwrap();

        let (tx_u, rx_u) = unbounded();
        let thread = thread::spawn(move || {
            tx_u.send(1).unwrap();
        });
        assert_eq!(rx_u.recv().unwrap(), 1);
        thread.join().unwrap();
    }

    #[test]
    fn blocked_receiver_wakes_on_close() {
        let (tx_b, rx_b) = bounded::<i32>(1);
        let thread = thread::spawn(move || {
            assert!(rx_b.recv().is_err());
        });
        tx_b.close();
        thread.join().unwrap();

        let (tx_u, rx_u) = unbounded::<i32>();
        let thread = thread::spawn(move || {
            assert!(rx_u.recv().is_err());
        });
        tx_u.close();
        thread.join().unwrap();
    }

    #[test]
    fn single_slot_backpressure() {
        let amount = 30_000;
        let (tx, rx) = bounded(0);

        let thread = thread::spawn(move || {
            for i in 0..amount {
                assert_eq!(tx.send(i), Ok(()));
            }
        });

        for i in 0..amount {
            assert_eq!(rx.recv(), Ok(i));
        }
        thread.join().unwrap();
    }

    #[test]
    fn unbounded_crosses_segments() {
        // Larger than one segment so the chain has to grow and the
        // receiver has to follow it.
        let amount = 10_000i64;
        let (tx, rx) = unbounded();

        for i in 0..amount {
            tx.send(i).unwrap();
        }
        for i in 0..amount {
            assert_eq!(rx.recv(), Ok(i));
        }
    }
}
