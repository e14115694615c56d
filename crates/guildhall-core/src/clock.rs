//! Host monotonic time.
//!
//! Every suspension point in the core (turn deadlines, the auction window,
//! installation durations, periodic scans) is a deadline in milliseconds
//! compared against a [`MonotonicClock`]. The core never sleeps and never
//! reads wall-clock time for game logic.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of monotonic milliseconds since an arbitrary origin.
pub trait MonotonicClock: core::fmt::Debug {
    /// Milliseconds elapsed since the clock's origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Real time, measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock for tests and replays.
///
/// Clones share the same time, so a test can keep a handle while the
/// orchestrator owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Start a clock at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Move time forward by `delta_ms`, saturating at `u64::MAX`.
    pub fn advance(&self, delta_ms: u64) -> u64 {
        let next = self.now_ms().saturating_add(delta_ms);
        self.now.store(next, Ordering::SeqCst);
        next
    }

    /// Jump to `at_ms`. Earlier values are ignored to keep time monotonic.
    pub fn set(&self, at_ms: u64) {
        self.now.fetch_max(at_ms, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_and_monotonic() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(50);
        assert_eq!(clock.now_ms(), 150);

        clock.set(120);
        assert_eq!(handle.now_ms(), 150);
        clock.set(1_000);
        assert_eq!(handle.now_ms(), 1_000);
    }

    #[test]
    fn system_clock_starts_near_zero() {
        let clock = SystemClock::new();
        let first = clock.now_ms();
        assert!(first < 1_000);
        assert!(clock.now_ms() >= first);
    }
}
