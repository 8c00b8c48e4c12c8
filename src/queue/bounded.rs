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

//! Bounded rings stamped per slot, based on the design of Dmitry Vyukov.
//!
//! Source: '<https://www.1024cores.net/home/lock-free-algorithms/queues/bounded-mpmc-queue>'
//!
//! A cursor packs a lap in its high 32 bits and a slot index in its low
//! 32 bits. Laps advance by two per revolution of the ring: slots carry
//! even stamps while writable and odd stamps while readable, so a cursor
//! can tell an old value from a fresh one even after the index wraps.
//! Ring sizes are rounded up to a power of two.

use std::{
    mem,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use omango_util::{
    backoff::Backoff,
    cache_padded::CachePadded,
    hint::{likely, unlikely},
};

use crate::queue::{
    error::{RecvError, SendError, TryRecvError, TrySendError},
    slot::Slot,
    state::State,
    waker::{Checker, Waiter, Waker},
};

/// Spin-retry rounds before a blocked thread parks on the futex.
const SPIN_ROUNDS: u8 = 2;

/// High bit of the lap half of a cursor, reserved as the closed flag.
const CLOSED_LAP: u32 = 1 << 31;
const CLOSED_BIT: u64 = 1 << 63;

const MAX_CAP: u32 = 1 << 30;

#[inline]
fn round_cap(cap: u32) -> u32 {
    assert!(cap <= MAX_CAP);
    cap.max(1).next_power_of_two()
}

/// Items a ring currently holds, from its two cursor snapshots.
///
/// Reads start one lap ahead of writes, so the write side has completed
/// `(lap / 2) * cap + idx` operations and the read side
/// `((lap - 1) / 2) * cap + idx`.
#[inline]
fn occupied(write: u64, read: u64, cap: u32) -> u32 {
    let write_lap = ((write >> 32) as u32 & !CLOSED_LAP) as u64;
    let read_lap = (read >> 32) as u32 as u64;
    let filled = (write_lap >> 1) * cap as u64 + write as u32 as u64;
    let drained = (read_lap.wrapping_sub(1) >> 1) * cap as u64 + read as u32 as u64;
    filled.wrapping_sub(drained) as u32
}

/// Common send/recv machinery over a stamped ring.
///
/// The fast paths claim a slot and move the value; the blocking paths
/// retry briefly, then register with the side's waker and park.
pub(crate) trait Ring<T> {
    /// Sends a message without blocking.
    ///
    /// Returns `Full` or `Disconnected` on failure.
    #[inline]
    fn try_send(&mut self, value: T) -> Result<(), TrySendError<T>> {
        let (slot, lap, state) = self.claim_write();

        if likely(state == State::Ready) {
            slot.fill(lap.wrapping_add(1), value);
            self.wake_receiver();
            Ok(())
        } else if unlikely(state == State::Closed) {
            Err(TrySendError::Disconnected(value))
        } else {
            Err(TrySendError::Full(value))
        }
    }

    /// Receives a message without blocking.
    #[inline]
    fn try_recv(&mut self) -> Result<T, TryRecvError> {
        let (slot, lap, claimed) = self.claim_read();
        if unlikely(!claimed) {
            return Err(TryRecvError);
        }
        let value = slot.take(lap.wrapping_add(1));
        self.wake_sender();
        Ok(value)
    }

    /// Sends a message, blocking while the ring is full.
    fn send(&mut self, value: T, checker: &dyn Checker) -> Result<(), SendError<T>> {
        loop {
            let (slot, lap, state) = self.claim_write();

            if likely(state == State::Ready) {
                slot.fill(lap.wrapping_add(1), value);
                self.wake_receiver();
                return Ok(());
            } else if unlikely(state == State::Closed) {
                return Err(SendError(value));
            }

            let waiter = &Waiter::new(slot.stamp_ref(), lap);
            let mut state = waiter.retry(checker, SPIN_ROUNDS);

            if likely(state == State::Ready) {
                continue;
            }
            if unlikely(state == State::Closed) {
                return Err(SendError(value));
            }

            if likely(self.register_sender(waiter)) {
                state = waiter.sleep(checker);
                self.unregister_sender(waiter);
                if unlikely(state == State::Closed) {
                    return Err(SendError(value));
                }
            }
        }
    }

    /// Receives a message, blocking while the ring is empty.
    ///
    /// A closed ring still drains: the error only surfaces once the ring
    /// is both closed and empty.
    fn recv(&mut self, checker: &dyn Checker) -> Result<T, RecvError> {
        let mut state = State::Ready;
        loop {
            let (slot, lap, claimed) = self.claim_read();
            if likely(claimed) {
                let value = slot.take(lap.wrapping_add(1));
                self.wake_sender();
                return Ok(value);
            } else if unlikely(state == State::Closed) {
                return Err(RecvError);
            }

            let waiter = &Waiter::new(slot.stamp_ref(), lap);
            state = waiter.retry(checker, SPIN_ROUNDS);

            if likely(state == State::Ready) {
                continue;
            }
            if unlikely(state == State::Closed) {
                // Re-claim once more to drain anything left behind.
                continue;
            }

            if likely(self.register_receiver(waiter)) {
                state = waiter.sleep(checker);
                self.unregister_receiver(waiter);
            }
        }
    }

    /// Closes the ring and wakes everyone parked on it.
    fn close(&self);

    /// Messages currently buffered.
    fn length(&self) -> u32;

    /// Claims the next slot for writing and advances the write cursor.
    fn claim_write(&mut self) -> (&Slot<T>, u32, State);

    /// Claims the next slot for reading and advances the read cursor.
    fn claim_read(&mut self) -> (&Slot<T>, u32, bool);

    fn register_sender(&self, waiter: &Waiter) -> bool;

    fn register_receiver(&self, waiter: &Waiter) -> bool;

    fn unregister_sender(&self, waiter: &Waiter);

    fn unregister_receiver(&self, waiter: &Waiter);

    fn wake_sender(&self);

    fn wake_receiver(&self);

    fn checker(&self) -> &dyn Checker;
}

struct WriteSide {
    cursor: u64,
    closed: AtomicBool,
}

/// Single-producer single-consumer ring.
///
/// Each cursor has exactly one owning thread, so both are plain integers;
/// only the slot stamps are shared.
pub(crate) struct SpscRing<T> {
    read: CachePadded<u64>,
    write: CachePadded<WriteSide>,

    send_waker: CachePadded<Waker>,
    recv_waker: CachePadded<Waker>,

    buffer: Box<[Slot<T>]>,
    capacity: u32,
}

impl<T> SpscRing<T> {
    #[inline]
    pub(crate) fn new(cap: u32) -> Self {
        let raw_cap = round_cap(cap);
        let buffer: Box<[Slot<T>]> = (0..raw_cap).map(|_| Slot::default()).collect();

        Self {
            read: CachePadded::new(1 << 32),
            write: CachePadded::new(WriteSide {
                cursor: 0,
                closed: AtomicBool::new(false),
            }),
            send_waker: CachePadded::new(Waker::default()),
            recv_waker: CachePadded::new(Waker::default()),
            buffer,
            capacity: raw_cap,
        }
    }
}

impl<T> Ring<T> for SpscRing<T> {
    #[inline(always)]
    fn close(&self) {
        self.write.closed.store(true, Ordering::Relaxed);
        self.send_waker.close();
        self.recv_waker.close();
    }

    #[inline(always)]
    fn length(&self) -> u32 {
        occupied(self.write.cursor, *self.read, self.capacity)
    }

    fn claim_write(&mut self) -> (&Slot<T>, u32, State) {
        let cursor = self.write.cursor;
        let idx = cursor as u32;
        let lap = (cursor >> 32) as u32;
        let backoff = Backoff::default();

        loop {
            let slot = unsafe { self.buffer.get_unchecked(idx as usize) };

            if unlikely(self.write.closed.load(Ordering::Relaxed)) {
                return (slot, 0, State::Closed);
            }

            let stamp = slot.stamp();
            match lap.cmp(&stamp) {
                std::cmp::Ordering::Equal => {
                    // The slot is writable on this lap; claim it.
                    if likely(idx + 1 < self.capacity) {
                        self.write.cursor += 1;
                    } else {
                        self.write.cursor = (lap.wrapping_add(2) as u64) << 32;
                    }
                    return (slot, stamp, State::Ready);
                }
                std::cmp::Ordering::Greater => {
                    // Still unread from the previous lap: the ring is full.
                    if lap > slot.stamp() {
                        return (slot, stamp, State::Stalled);
                    }
                    backoff.spin();
                }
                std::cmp::Ordering::Less => {
                    // The reader is mid-release; wait for the stamp.
                    backoff.snooze();
                }
            }
        }
    }

    fn claim_read(&mut self) -> (&Slot<T>, u32, bool) {
        let cursor = *self.read;
        let idx = cursor as u32;
        let lap = (cursor >> 32) as u32;
        let slot = unsafe { self.buffer.get_unchecked(idx as usize) };
        let backoff = Backoff::default();

        loop {
            let stamp = slot.stamp();
            match lap.cmp(&stamp) {
                std::cmp::Ordering::Equal => {
                    // The slot is readable on this lap; claim it.
                    if likely(idx + 1 < self.capacity) {
                        *self.read += 1;
                    } else {
                        *self.read = (lap.wrapping_add(2) as u64) << 32;
                    }
                    return (slot, stamp, true);
                }
                std::cmp::Ordering::Greater => {
                    // Not yet written on this lap: the ring is empty.
                    if lap > slot.stamp() {
                        return (slot, stamp, false);
                    }
                    backoff.spin();
                }
                std::cmp::Ordering::Less => {
                    // The writer is mid-publish; wait for the stamp.
                    backoff.snooze();
                }
            }
        }
    }

    #[inline(always)]
    fn register_sender(&self, waiter: &Waiter) -> bool {
        self.send_waker.register(waiter)
    }

    #[inline(always)]
    fn register_receiver(&self, waiter: &Waiter) -> bool {
        self.recv_waker.register(waiter)
    }

    #[inline(always)]
    fn unregister_sender(&self, waiter: &Waiter) {
        self.send_waker.unregister(waiter);
    }

    #[inline(always)]
    fn unregister_receiver(&self, waiter: &Waiter) {
        self.recv_waker.unregister(waiter);
    }

    #[inline(always)]
    fn wake_sender(&self) {
        self.send_waker.wake();
    }

    #[inline(always)]
    fn wake_receiver(&self) {
        self.recv_waker.wake();
    }

    #[inline(always)]
    fn checker(&self) -> &dyn Checker {
        self
    }
}

impl<T> Checker for SpscRing<T> {
    #[inline(always)]
    fn is_close(&self) -> bool {
        self.write.closed.load(Ordering::Relaxed)
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }
        let mut idx = *self.read as u32;
        let mut remaining = self.length();
        while remaining > 0 {
            unsafe { self.buffer.get_unchecked(idx as usize).drop_value() }
            idx += 1;
            if idx == self.capacity {
                idx = 0;
            }
            remaining -= 1;
        }
    }
}

/// Multi-producer multi-consumer ring.
///
/// Cursors are shared and advanced by CAS; the closed flag lives in the
/// reserved high bit of the write cursor so closing needs no extra word.
pub(crate) struct MpmcRing<T> {
    read: CachePadded<AtomicU64>,
    write: CachePadded<AtomicU64>,

    send_waker: CachePadded<Waker>,
    recv_waker: CachePadded<Waker>,

    buffer: Box<[Slot<T>]>,
    capacity: u32,
}

impl<T> MpmcRing<T> {
    #[inline]
    pub(crate) fn new(cap: u32) -> Self {
        let raw_cap = round_cap(cap);
        let buffer: Box<[Slot<T>]> = (0..raw_cap).map(|_| Slot::default()).collect();

        Self {
            read: CachePadded::new(AtomicU64::new(1 << 32)),
            write: CachePadded::new(AtomicU64::new(0)),
            send_waker: CachePadded::new(Waker::default()),
            recv_waker: CachePadded::new(Waker::default()),
            buffer,
            capacity: raw_cap,
        }
    }
}

impl<T> Ring<T> for MpmcRing<T> {
    fn close(&self) {
        let mut cursor = self.write.load(Ordering::Acquire);
        let backoff = Backoff::default();

        while (cursor & CLOSED_BIT) == 0 {
            match self.write.compare_exchange_weak(
                cursor,
                cursor | CLOSED_BIT,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(v) => {
                    cursor = v;
                    backoff.spin();
                }
            }
        }

        self.send_waker.close();
        self.recv_waker.close();
    }

    #[inline(always)]
    fn length(&self) -> u32 {
        occupied(
            self.write.load(Ordering::Relaxed),
            self.read.load(Ordering::Relaxed),
            self.capacity,
        )
    }

    fn claim_write(&mut self) -> (&Slot<T>, u32, State) {
        let mut cursor = self.write.load(Ordering::Relaxed);
        let backoff = Backoff::default();

        loop {
            let idx = cursor as u32;
            let lap = (cursor >> 32) as u32;
            let slot = unsafe { self.buffer.get_unchecked(idx as usize) };

            if unlikely(lap >= CLOSED_LAP) {
                return (slot, 0, State::Closed);
            }

            let stamp = slot.stamp();
            match lap.cmp(&stamp) {
                std::cmp::Ordering::Equal => {
                    // The slot is writable on this lap; race to claim it.
                    let next = if likely(idx + 1 < self.capacity) {
                        cursor + 1
                    } else {
                        (lap.wrapping_add(2) as u64) << 32
                    };

                    match self.write.compare_exchange_weak(
                        cursor,
                        next,
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => return (slot, stamp, State::Ready),
                        Err(v) => {
                            cursor = v;
                            backoff.spin();
                        }
                    }
                }
                std::cmp::Ordering::Greater => {
                    // Still unread from the previous lap: the ring is full.
                    if lap > slot.stamp() {
                        return (slot, stamp, State::Stalled);
                    }
                    backoff.spin();
                    cursor = self.write.load(Ordering::Relaxed);
                }
                std::cmp::Ordering::Less => {
                    // Another producer claimed this slot and is mid-publish.
                    backoff.snooze();
                    cursor = self.write.load(Ordering::Relaxed);
                }
            }
        }
    }

    fn claim_read(&mut self) -> (&Slot<T>, u32, bool) {
        let mut cursor = self.read.load(Ordering::Relaxed);
        let backoff = Backoff::default();

        loop {
            let idx = cursor as u32;
            let lap = (cursor >> 32) as u32;
            let slot = unsafe { self.buffer.get_unchecked(idx as usize) };
            let stamp = slot.stamp();

            match lap.cmp(&stamp) {
                std::cmp::Ordering::Equal => {
                    // The slot is readable on this lap; race to claim it.
                    let next = if likely(idx + 1 < self.capacity) {
                        cursor + 1
                    } else {
                        (lap.wrapping_add(2) as u64) << 32
                    };

                    match self.read.compare_exchange_weak(
                        cursor,
                        next,
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => return (slot, stamp, true),
                        Err(v) => {
                            cursor = v;
                            backoff.spin();
                        }
                    }
                }
                std::cmp::Ordering::Greater => {
                    // Not yet written on this lap: the ring is empty.
                    if lap > slot.stamp() {
                        return (slot, stamp, false);
                    }
                    backoff.spin();
                    cursor = self.read.load(Ordering::Relaxed);
                }
                std::cmp::Ordering::Less => {
                    // Another consumer claimed this slot and is mid-release.
                    backoff.snooze();
                    cursor = self.read.load(Ordering::Relaxed);
                }
            }
        }
    }

    #[inline(always)]
    fn register_sender(&self, waiter: &Waiter) -> bool {
        self.send_waker.register(waiter)
    }

    #[inline(always)]
    fn register_receiver(&self, waiter: &Waiter) -> bool {
        self.recv_waker.register(waiter)
    }

    #[inline(always)]
    fn unregister_sender(&self, waiter: &Waiter) {
        self.send_waker.unregister(waiter);
    }

    #[inline(always)]
    fn unregister_receiver(&self, waiter: &Waiter) {
        self.recv_waker.unregister(waiter);
    }

    #[inline(always)]
    fn wake_sender(&self) {
        self.send_waker.wake();
    }

    #[inline(always)]
    fn wake_receiver(&self) {
        self.recv_waker.wake();
    }

    #[inline(always)]
    fn checker(&self) -> &dyn Checker {
        self
    }
}

impl<T> Checker for MpmcRing<T> {
    #[inline(always)]
    fn is_close(&self) -> bool {
        (self.write.load(Ordering::Relaxed) & CLOSED_BIT) != 0
    }
}

impl<T> Drop for MpmcRing<T> {
    fn drop(&mut self) {
        if !mem::needs_drop::<T>() {
            return;
        }
        let mut idx = self.read.load(Ordering::Relaxed) as u32;
        let mut remaining = self.length();
        while remaining > 0 {
            unsafe { self.buffer.get_unchecked(idx as usize).drop_value() }
            idx += 1;
            if idx == self.capacity {
                idx = 0;
            }
            remaining -= 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::{occupied, round_cap};

    #[test]
    fn capacity_rounding() {
        assert_eq!(round_cap(0), 1);
        assert_eq!(round_cap(1), 1);
        assert_eq!(round_cap(3), 4);
        assert_eq!(round_cap(1024), 1024);
        assert_eq!(round_cap(1025), 2048);
    }

    #[test]
    fn occupancy_across_laps() {
        let cap = 4u32;
        // Fresh ring.
        assert_eq!(occupied(0, 1 << 32, cap), 0);
        // One write, no reads.
        assert_eq!(occupied(1, 1 << 32, cap), 1);
        // Full ring: write cursor wrapped to lap 2, index 0.
        assert_eq!(occupied(2u64 << 32, 1 << 32, cap), 4);
        // Drained after a full lap: read cursor wrapped to lap 3.
        assert_eq!(occupied(2u64 << 32, 3u64 << 32, cap), 0);
    }
}
