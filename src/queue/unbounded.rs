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

//! Unbounded queues as chains of bounded segments.
//!
//! A send that finds the tail segment full seals it and links a fresh
//! one, so sends never block. A sealed segment drains normally; the
//! receiver advances past it once it is empty and frees it. Closing the
//! whole queue links a closed sentinel after the tail so that the chain
//! always ends in a segment that reports closed.

use std::{
    ptr::null_mut,
    sync::atomic::{AtomicBool, AtomicPtr, Ordering},
};

use omango_util::{
    backoff::Backoff,
    cache_padded::CachePadded,
    hint::likely,
};

use crate::queue::{
    bounded::{MpmcRing, Ring, SpscRing},
    error::{RecvError, SendError, TrySendError},
};

const SEGMENT_CAP: u32 = 1024;

struct Segment<T> {
    ring: SpscRing<T>,
    next: AtomicPtr<Segment<T>>,
}

impl<T> Segment<T> {
    #[inline]
    fn boxed(cap: u32) -> *mut Self {
        Box::into_raw(Box::new(Self {
            ring: SpscRing::new(cap),
            next: AtomicPtr::new(null_mut()),
        }))
    }
}

pub(crate) struct SpscChain<T> {
    head: CachePadded<*mut Segment<T>>,
    tail: CachePadded<AtomicPtr<Segment<T>>>,

    closed: CachePadded<AtomicBool>,
}

impl<T> Default for SpscChain<T> {
    #[inline]
    fn default() -> Self {
        let first = Segment::boxed(SEGMENT_CAP);
        Self {
            head: CachePadded::new(first),
            tail: CachePadded::new(AtomicPtr::new(first)),
            closed: CachePadded::new(AtomicBool::new(false)),
        }
    }
}

impl<T> SpscChain<T> {
    /// Sends without ever blocking; only a closed queue refuses.
    pub(crate) fn send(&mut self, value: T) -> Result<(), SendError<T>> {
        let tail = self.tail.load(Ordering::Relaxed);
        match unsafe { (*tail).ring.try_send(value) } {
            Ok(()) => Ok(()),
            Err(TrySendError::Disconnected(value)) => Err(SendError(value)),
            Err(TrySendError::Full(value)) => {
                // Seal the full segment so the receiver knows it may
                // advance once drained, then link a fresh one.
                unsafe { (*tail).ring.close() }

                let next = Segment::boxed(SEGMENT_CAP);
                match unsafe {
                    (*tail).next.compare_exchange(
                        null_mut(),
                        next,
                        Ordering::AcqRel,
                        Ordering::Relaxed,
                    )
                } {
                    Ok(_) => {
                        let _ = unsafe { (*next).ring.try_send(value) };
                        self.tail.store(next, Ordering::Relaxed);
                        Ok(())
                    }
                    Err(sentinel) => {
                        // Lost the link to close(): the queue shut down
                        // under us.
                        let _ = unsafe { Box::from_raw(next) };
                        self.tail.store(sentinel, Ordering::Relaxed);
                        Err(SendError(value))
                    }
                }
            }
        }
    }

    /// Receives, blocking while the whole chain is empty.
    pub(crate) fn recv(&mut self) -> Result<T, RecvError> {
        loop {
            let head = *self.head;
            let result = unsafe { (*head).ring.recv((*head).ring.checker()) };
            if likely(result.is_ok()) {
                return result;
            }

            // The head segment is closed and drained. Either it was
            // sealed by a send and a successor exists (or is about to),
            // or the queue is closed and the chain ends in the sentinel.
            let mut next = unsafe { (*head).next.load(Ordering::Relaxed) };
            if self.closed.load(Ordering::Relaxed) && next.is_null() {
                return Err(RecvError);
            }

            let backoff = Backoff::default();
            while next.is_null() {
                backoff.spin();
                next = unsafe { (*head).next.load(Ordering::Relaxed) };
            }

            *self.head = next;
            let _ = unsafe { Box::from_raw(head) };
        }
    }

    /// Closes the queue: links a closed sentinel after the tail, then
    /// closes every live segment so parked threads wake up.
    pub(crate) fn close(&self) {
        let sentinel = Segment::boxed(1);
        unsafe { (*sentinel).ring.close() }

        loop {
            let tail = self.tail.load(Ordering::Relaxed);
            if unsafe {
                (*tail)
                    .next
                    .compare_exchange(null_mut(), sentinel, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
            } {
                break;
            }
            // The producer is mid-append; retry against the new tail.
        }
        self.closed.store(true, Ordering::Relaxed);

        // Sealed segments are closed already; the walk catches the live
        // tail and anything linked since.
        unsafe {
            let mut segment = *self.head;
            while !segment.is_null() {
                (*segment).ring.close();
                segment = (*segment).next.load(Ordering::Relaxed);
            }
        }
    }
}

impl<T> Drop for SpscChain<T> {
    fn drop(&mut self) {
        let mut segment = *self.head;
        while !segment.is_null() {
            let next = unsafe { (*segment).next.load(Ordering::Relaxed) };
            let _ = unsafe { Box::from_raw(segment) };
            segment = next;
        }
    }
}

//=================
//      MPMC
//=================

struct SharedSegment<T> {
    ring: MpmcRing<T>,
    next: AtomicPtr<SharedSegment<T>>,
}

impl<T> SharedSegment<T> {
    #[inline]
    fn boxed(cap: u32) -> *mut Self {
        Box::into_raw(Box::new(Self {
            ring: MpmcRing::new(cap),
            next: AtomicPtr::new(null_mut()),
        }))
    }
}

pub(crate) struct MpmcChain<T> {
    head: CachePadded<AtomicPtr<SharedSegment<T>>>,
    tail: CachePadded<AtomicPtr<SharedSegment<T>>>,

    closed: CachePadded<AtomicBool>,
}

impl<T> Default for MpmcChain<T> {
    #[inline]
    fn default() -> Self {
        let first = SharedSegment::boxed(SEGMENT_CAP);
        Self {
            head: CachePadded::new(AtomicPtr::new(first)),
            tail: CachePadded::new(AtomicPtr::new(first)),
            closed: CachePadded::new(AtomicBool::new(false)),
        }
    }
}

impl<T> MpmcChain<T> {
    /// Sends without blocking; producers race to extend the chain.
    pub(crate) fn send(&mut self, value: T) -> Result<(), SendError<T>> {
        let mut value = value;
        let backoff = Backoff::default();

        loop {
            let tail = self.tail.load(Ordering::Relaxed);
            match unsafe { (*tail).ring.try_send(value) } {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(v)) => {
                    if self.closed.load(Ordering::Relaxed) {
                        return Err(SendError(v));
                    }
                    // Another producer sealed this segment; chase the
                    // new tail.
                    backoff.spin();
                    value = v;
                }
                Err(TrySendError::Full(v)) => {
                    // The link CAS is the reservation: exactly one
                    // producer installs the real successor, and the node
                    // stays linked until the receiver side frees it, so
                    // no receiver can ever hold a dangling successor.
                    let next = SharedSegment::boxed(SEGMENT_CAP);
                    match unsafe {
                        (*tail).next.compare_exchange(
                            null_mut(),
                            next,
                            Ordering::AcqRel,
                            Ordering::Relaxed,
                        )
                    } {
                        Ok(_) => {
                            unsafe {
                                (*tail).ring.close();
                                let _ = (*next).ring.try_send(v);
                            }
                            self.tail.store(next, Ordering::Release);
                            return Ok(());
                        }
                        Err(_) => {
                            let _ = unsafe { Box::from_raw(next) };
                            backoff.spin();
                            value = v;
                        }
                    }
                }
            }
        }
    }

    /// Receives, blocking while the whole chain is empty.
    pub(crate) fn recv(&mut self) -> Result<T, RecvError> {
        loop {
            let head = self.head.load(Ordering::Relaxed);
            let result = unsafe { (*head).ring.recv((*head).ring.checker()) };
            if likely(result.is_ok()) {
                return result;
            }

            // The head segment is closed and drained; move to its
            // successor, which the sealing producer may still be about
            // to link.
            let backoff = Backoff::default();
            loop {
                let next = unsafe { (*head).next.load(Ordering::Acquire) };
                if !next.is_null() {
                    if self
                        .head
                        .compare_exchange(head, next, Ordering::AcqRel, Ordering::Relaxed)
                        .is_ok()
                    {
                        let _ = unsafe { Box::from_raw(head) };
                    }
                    break;
                }
                if self.closed.load(Ordering::Relaxed) {
                    return Err(RecvError);
                }
                backoff.spin();
            }
        }
    }

    /// Closes the queue; see [`SpscChain::close`].
    pub(crate) fn close(&self) {
        let sentinel = SharedSegment::boxed(1);
        unsafe { (*sentinel).ring.close() }

        loop {
            let tail = self.tail.load(Ordering::Relaxed);
            if unsafe {
                (*tail)
                    .next
                    .compare_exchange(null_mut(), sentinel, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
            } {
                break;
            }
        }
        self.closed.store(true, Ordering::Relaxed);

        unsafe {
            let mut segment = self.head.load(Ordering::Relaxed);
            while !segment.is_null() {
                (*segment).ring.close();
                segment = (*segment).next.load(Ordering::Relaxed);
            }
        }
    }
}

impl<T> Drop for MpmcChain<T> {
    fn drop(&mut self) {
        let mut segment = self.head.load(Ordering::Relaxed);
        while !segment.is_null() {
            let next = unsafe { (*segment).next.load(Ordering::Relaxed) };
            let _ = unsafe { Box::from_raw(segment) };
            segment = next;
        }
    }
}
