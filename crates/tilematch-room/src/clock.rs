//! Engine clock backed by Tokio's time source.

use tilematch_engine::Clock;
use tokio::time::Instant;

/// Milliseconds since the clock was created, read from
/// `tokio::time::Instant`.
///
/// Under a paused test runtime this moves only with
/// `tokio::time::advance`, which makes room timing deterministic.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
