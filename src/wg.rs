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

use std::sync::atomic::{AtomicU32, Ordering};

/// A [`WaitGroup`] waits for a collection of threads to finish.
///
/// The owning thread calls [`add`] with the number of threads to wait
/// for, each worker calls [`done`] when it finishes, and [`wait`]
/// blocks until the counter reaches zero.
///
/// A call to [`done`] synchronizes before the return of any [`wait`]
/// call it unblocks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use sequin::wg::WaitGroup;
///
/// let wg = Arc::new(WaitGroup::new(2));
///
/// for _ in 0..2 {
///     let wg = wg.clone();
///     std::thread::spawn(move || {
///         // ... work ...
///         wg.done();
///     });
/// }
/// wg.wait();
/// ```
///
/// [`add`]: WaitGroup::add
/// [`done`]: WaitGroup::done
/// [`wait`]: WaitGroup::wait
pub struct WaitGroup {
    remaining: AtomicU32,
    release: AtomicU32,
}

impl Default for WaitGroup {
    #[inline(always)]
    fn default() -> Self {
        Self::new(0)
    }
}

impl WaitGroup {
    /// Creates a group expecting `n` members.
    #[inline(always)]
    pub fn new(n: u32) -> Self {
        Self {
            remaining: AtomicU32::new(n),
            release: AtomicU32::new(0),
        }
    }

    /// Raises the counter by `n`.
    ///
    /// Calls that raise the counter from zero must happen before the
    /// [`wait`] they gate, so call [`add`] before spawning the worker.
    ///
    /// [`add`]: WaitGroup::add
    /// [`wait`]: WaitGroup::wait
    #[inline(always)]
    pub fn add(&self, n: u32) {
        self.remaining.fetch_add(n, Ordering::SeqCst);
    }

    /// Drops the counter by one, waking waiters when it reaches zero.
    ///
    /// Panics if the counter was already zero.
    #[inline(always)]
    pub fn done(&self) {
        match self.remaining.fetch_sub(1, Ordering::SeqCst) {
            0 => panic!("done on a group with no remaining members"),
            1 => {
                // Last member out; open the gate for every waiter.
                self.release.store(1, Ordering::Relaxed);
                omango_futex::wake_all(&self.release);
            }
            _ => {}
        }
    }

    /// Blocks until the counter reaches zero.
    pub fn wait(&self) {
        while self.remaining.load(Ordering::SeqCst) > 0 {
            omango_futex::wait(&self.release, 0);
        }
        self.release.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };
    use std::thread;

    use super::WaitGroup;

    #[test]
    fn wait_for_workers() {
        let wg = Arc::new(WaitGroup::new(4));
        let count = Arc::new(AtomicU32::new(0));

        let mut threads = Vec::new();
        for _ in 0..4 {
            let wg = wg.clone();
            let count = count.clone();
            threads.push(thread::spawn(move || {
                count.fetch_add(1, Ordering::Relaxed);
                wg.done();
            }));
        }

        wg.wait();
        assert_eq!(count.load(Ordering::Relaxed), 4);
        for thread in threads {
            thread.join().unwrap();
        }
    }

    #[test]
    fn add_before_spawn() {
        let wg = Arc::new(WaitGroup::default());
        wg.add(1);

        let wg2 = wg.clone();
        let thread = thread::spawn(move || wg2.done());

        wg.wait();
        thread.join().unwrap();
    }

    #[test]
    fn done_on_empty_group_panics() {
        let result = std::panic::catch_unwind(|| {
            let wg = WaitGroup::default();
            wg.done();
        });
        assert!(result.is_err());
    }
}
