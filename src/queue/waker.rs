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
    collections::vec_deque::VecDeque,
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
};

use omango_futex::{wait, wake_one};
use omango_util::{
    backoff::Backoff,
    hint::{likely, unlikely},
};

use crate::queue::state::State;

const PARKED: u32 = 1;
const UNPARKED: u32 = 2;

/// Lets a blocked thread observe queue shutdown.
pub(crate) trait Checker {
    fn is_close(&self) -> bool;
}

/// Blocking state of one thread stuck on one slot.
///
/// The thread is waiting for the slot's stamp to move away from
/// `expected`, which happens when the other side finishes with the slot.
pub(crate) struct Waiter {
    stamp: *const AtomicU32,
    expected: u32,
    parked: AtomicU32,
}

impl Waiter {
    #[inline]
    pub(crate) fn new(stamp: *const AtomicU32, expected: u32) -> Self {
        Self {
            stamp,
            expected,
            parked: AtomicU32::new(UNPARKED),
        }
    }

    /// Spins a few rounds rechecking the slot before giving up.
    ///
    /// Going to sleep on the futex is expensive under load, so the retry
    /// usually resolves the wait without parking.
    pub(crate) fn retry(&self, checker: &dyn Checker, rounds: u8) -> State {
        let backoff = Backoff::default();
        let stamp = unsafe { &*self.stamp };
        for _ in 0..rounds {
            loop {
                if unlikely(checker.is_close()) {
                    return State::Closed;
                }
                if stamp.load(Ordering::Acquire) != self.expected {
                    return State::Ready;
                }
                if backoff.snooze_completed() {
                    break;
                }
            }
            backoff.reset();
        }
        State::Stalled
    }

    /// Parks the current thread until the slot advances or the queue closes.
    pub(crate) fn sleep(&self, checker: &dyn Checker) -> State {
        let stamp = unsafe { &*self.stamp };
        loop {
            if unlikely(checker.is_close()) {
                self.parked.store(UNPARKED, Ordering::Release);
                return State::Closed;
            }
            if stamp.load(Ordering::Acquire) != self.expected {
                self.parked.store(UNPARKED, Ordering::Release);
                return State::Ready;
            }
            self.parked.store(PARKED, Ordering::Relaxed);
            wait(&self.parked, PARKED);
        }
    }
}

struct WaitList {
    waiters: VecDeque<*const Waiter>,
    nudged: usize,
    closed: bool,
}

impl WaitList {
    #[inline]
    fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
            nudged: 0,
            closed: false,
        }
    }

    #[inline]
    fn register(&mut self, waiter: &Waiter) {
        self.waiters.push_back(waiter as *const Waiter);
    }

    #[inline]
    fn unregister(&mut self, waiter: &Waiter) {
        if let Some((i, _)) = self
            .waiters
            .iter()
            .enumerate()
            .find(|&(_, item)| (*item) == (waiter as *const Waiter))
        {
            self.waiters.remove(i);
            if self.nudged > 0 {
                self.nudged -= 1;
            }
        }
    }

    /// Wakes one more waiter, re-waking the earlier ones as well.
    ///
    /// Waiters stay in the list until they unregister themselves, so a
    /// wakeup that lands between a waiter's recheck and its park is not
    /// lost.
    #[inline]
    fn notify(&mut self) {
        if likely(self.nudged < self.waiters.len()) {
            self.nudged += 1;
        }
        for idx in 0..self.nudged {
            if let Some(waiter) = self.waiters.get(idx) {
                unsafe {
                    if (*(*waiter)).parked.load(Ordering::Acquire) == PARKED {
                        wake_one(&(*(*waiter)).parked);
                    }
                }
            }
        }
    }

    /// Wakes every waiter without removing any.
    #[inline]
    fn close(&mut self) {
        self.closed = true;
        for waiter in self.waiters.iter() {
            unsafe {
                wake_one(&(*(*waiter)).parked);
            }
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

/// Tracks threads blocked on one side of a queue.
pub(crate) struct Waker {
    guard: parking_lot::Mutex<WaitList>,
    empty: AtomicBool,
}

impl Default for Waker {
    #[inline]
    fn default() -> Self {
        Self {
            guard: parking_lot::Mutex::new(WaitList::new()),
            empty: AtomicBool::new(true),
        }
    }
}

impl Waker {
    /// Registers a waiter.
    ///
    /// The slot and the closed flag are rechecked under the lock, so a
    /// wakeup cannot slip in between the caller's last check and the
    /// registration.
    ///
    /// Returns `false` if the slot already advanced or the queue closed.
    #[inline]
    pub(crate) fn register(&self, waiter: &Waiter) -> bool {
        let mut inner = self.guard.lock();
        if inner.closed {
            return false;
        }
        unsafe {
            if (*waiter.stamp).load(Ordering::Acquire) != waiter.expected {
                return false;
            }
        }
        inner.register(waiter);
        self.empty.store(false, Ordering::SeqCst);
        true
    }

    /// Unregisters a waiter.
    ///
    /// Must be called by the blocking thread itself once it stops waiting.
    #[inline]
    pub(crate) fn unregister(&self, waiter: &Waiter) {
        let mut inner = self.guard.lock();
        inner.unregister(waiter);
        self.empty.store(inner.is_empty(), Ordering::SeqCst);
    }

    /// Wakes one waiter if any thread is blocked.
    #[inline]
    pub(crate) fn wake(&self) {
        if unlikely(!self.empty.load(Ordering::SeqCst)) {
            self.guard.lock().notify();
        }
    }

    /// Wakes all waiters until the list drains.
    pub(crate) fn close(&self) {
        loop {
            let mut inner = self.guard.lock();
            if inner.is_empty() {
                self.empty.store(true, Ordering::SeqCst);
                return;
            }
            inner.close();
        }
    }
}
