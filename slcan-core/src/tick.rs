//! Millisecond timebase shared between the tick source and the poll loop

use portable_atomic::{AtomicU32, Ordering};

/// Free-running millisecond counter
///
/// Incremented from a 1 ms periodic source, read by the poll loop. Wraps
/// after about 49 days; consumers compare with `wrapping_sub`.
pub struct MonotonicTick {
    ms: AtomicU32,
}

impl Default for MonotonicTick {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicTick {
    /// Counter starting at zero, usable in a `static`
    pub const fn new() -> Self {
        Self {
            ms: AtomicU32::new(0),
        }
    }

    /// Advance by one millisecond
    pub fn increment(&self) {
        self.ms.fetch_add(1, Ordering::Relaxed);
    }

    /// Milliseconds since start, modulo 2^32
    pub fn now_ms(&self) -> u32 {
        self.ms.load(Ordering::Relaxed)
    }
}
