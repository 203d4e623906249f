// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Publish Sequence Numbers
//!
//! Every published message carries a per-client sequence number. Allocation
//! is linearizable across threads; peeking never advances the counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Supplies per-client sequence numbers.
pub trait SequenceSource: Send + Sync {
    /// Returns the next sequence number and advances the counter.
    fn allocate(&self) -> u64;

    /// Returns the value the next [`SequenceSource::allocate`] call would
    /// produce, without advancing the counter.
    fn peek(&self) -> u64;
}

/// Lock-free sequence counter.
///
/// The first allocated value is `1`.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    last: AtomicU64,
}

impl SequenceCounter {
    /// Creates a counter whose first allocation returns `1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter that resumes after a previously allocated value.
    pub fn starting_after(last: u64) -> Self {
        SequenceCounter {
            last: AtomicU64::new(last),
        }
    }

    /// Returns the most recently allocated value (`0` if none yet).
    pub fn last_allocated(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}

impl SequenceSource for SequenceCounter {
    fn allocate(&self) -> u64 {
        self.last.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    fn peek(&self) -> u64 {
        self.last.load(Ordering::Acquire).wrapping_add(1)
    }
}
