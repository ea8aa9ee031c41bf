//! The game clock the engine reads "now" from.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic game clock in milliseconds.
///
/// Injected into the engine instead of read from a global, so the host
/// decides what time means (a Tokio instant, a replay log, a test dial).
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since an arbitrary, fixed origin. Never decreases.
    fn now_millis(&self) -> u64;
}

/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one handle and give
/// the other to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock reading `start` milliseconds.
    pub fn new(start: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute reading. Ignored if it would go backwards.
    pub fn set(&self, millis: u64) {
        self.millis.fetch_max(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_reading() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now_millis(), 150);
    }

    #[test]
    fn test_set_never_goes_backwards() {
        let clock = ManualClock::new(1_000);
        clock.set(500);
        assert_eq!(clock.now_millis(), 1_000);
        clock.set(2_000);
        assert_eq!(clock.now_millis(), 2_000);
    }
}
