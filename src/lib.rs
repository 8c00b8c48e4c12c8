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

//! Thread-safe FIFO queues and a harness that proves in-order delivery
//! through them.
//!
//! The [`queue`] module provides blocking SPSC and MPMC queues, bounded
//! (lap-stamped circular buffer) and unbounded (linked segments of bounded
//! rings). The [`verify`] module drives a producer of sequential integers
//! against a consumer that checks every received value is exactly one
//! greater than the previous one, and reports the first violation as a
//! typed verdict.
//!
//! # Examples
//!
//! ```
//! let verdict = sequin::verify::run_with(10_000, std::io::sink()).unwrap();
//! assert_eq!(verdict, sequin::verify::Verdict::InOrder { last: 9_999 });
//! ```

pub mod queue;
pub mod verify;
pub mod wg;
