//! Round-robin selection over secondaries.

use std::sync::atomic::{AtomicU64, Ordering};

/// Round-robin selector.
/// Stores an internal counter to rotate through the secondaries.
#[derive(Debug, Default)]
pub struct SecondarySelector {
    counter: AtomicU64,
}

impl SecondarySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the backend index for the next read among `len` backends.
    ///
    /// Index 0 is the primary. With a single backend it serves reads too and
    /// the counter is left untouched; otherwise each call draws one counter
    /// value and maps it onto `1..len`.
    pub fn next_index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let slot = self.counter.fetch_add(1, Ordering::Relaxed);
        1 + (slot % (len as u64 - 1)) as usize
    }

    /// Number of counter values drawn so far (modulo 2^64).
    pub fn draws(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}
