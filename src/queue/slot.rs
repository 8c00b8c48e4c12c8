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
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicU32, Ordering},
};

/// One cell of a bounded ring.
///
/// The stamp records the lap on which the cell was last touched. Writers
/// claim the cell when the stamp equals their lap, readers when it equals
/// theirs, so ownership alternates between the two sides without a lock.
pub(crate) struct Slot<T> {
    stamp: AtomicU32,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Default for Slot<T> {
    #[inline]
    fn default() -> Self {
        Self {
            stamp: AtomicU32::new(0),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

impl<T> Slot<T> {
    #[inline]
    pub(crate) fn stamp(&self) -> u32 {
        self.stamp.load(Ordering::Acquire)
    }

    /// Stores a value and hands the cell to readers.
    #[inline]
    pub(crate) fn fill(&self, stamp: u32, value: T) {
        unsafe { self.value.get().write(MaybeUninit::new(value)) }
        self.stamp.store(stamp, Ordering::Release);
    }

    /// Moves the value out and hands the cell back to writers.
    ///
    /// The caller must have claimed the cell.
    #[inline]
    pub(crate) fn take(&self, stamp: u32) -> T {
        let value = unsafe { self.value.get().read().assume_init() };
        self.stamp.store(stamp, Ordering::Release);
        value
    }

    /// Drops the value in place without releasing the cell.
    ///
    /// Only for teardown of a ring that still holds unread values.
    #[inline]
    pub(crate) unsafe fn drop_value(&self) {
        (*self.value.get()).assume_init_drop();
    }

    #[inline]
    pub(crate) fn stamp_ref(&self) -> *const AtomicU32 {
        &self.stamp
    }
}
