//! Fixed-rate update scheduler for Tilematch rooms.
//!
//! The round engine has no timers of its own: countdowns resolve when the
//! host calls its tick and the clock has passed the deadline. This crate
//! decides *when* the host calls it. A rate of 10 Hz is plenty for
//! second-granularity countdowns to look smooth.
//!
//! The scheduler is meant to sit in a room actor's `tokio::select!` loop
//! next to the command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* join, leave, act */ }
//!         _ = scheduler.wait_for_tick() => {
//!             let events = engine.tick(&mut state);
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! Ticks carry no delta time. The engine reads its own clock, so a late
//! or skipped tick only delays a countdown display, it never changes an
//! outcome.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the loop wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one a full period
    /// from now.
    #[default]
    Skip,
    /// Keep the original cadence: the next tick is due one period after
    /// the one that was missed, so a late loop fires back-to-back until
    /// it has caught up.
    Drop,
}

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Updates per second, `1..=MAX_TICK_RATE_HZ`.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the period (0.0–1.0) a single update may use before a
    /// warning is logged.
    pub budget_warn_threshold: f64,
    /// Upper bound in µs of a random delay before the first tick, so rooms
    /// created together don't tick in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 10,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.8,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Fastest supported rate.
    pub const MAX_TICK_RATE_HZ: u32 = 60;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                rate = self.tick_rate_hz,
                clamped, "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    /// Time between ticks.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// What [`TickScheduler::wait_for_tick`] hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// The loop woke up more than a tenth of a period late.
    pub overrun: bool,
    /// Whole periods skipped because of that lateness (`Skip` policy only).
    pub ticks_skipped: u64,
}

/// Fires at a fixed rate for one room.
pub struct TickScheduler {
    config: TickConfig,
    period: Duration,
    next_tick: Instant,
    tick_count: u64,
    tick_start: Option<Instant>,
    paused: bool,
    total_overruns: u64,
    total_skipped: u64,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let period = config.period();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };

        debug!(
            rate_hz = config.tick_rate_hz,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            next_tick: Instant::now() + period + jitter,
            config,
            period,
            tick_count: 0,
            tick_start: None,
            paused: false,
            total_overruns: 0,
            total_skipped: 0,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Resolves when the next tick is due. While paused this never
    /// resolves; `select!` keeps serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            return std::future::pending().await;
        }

        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.tick_start = Some(now);

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > self.period / 10;
        let mut ticks_skipped = 0;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = (late_by.as_nanos() / self.period.as_nanos()) as u64;
                }
                now + self.period
            }
            TickPolicy::Drop => due + self.period,
        };

        if overrun {
            self.total_overruns += 1;
            self.total_skipped += ticks_skipped;
            warn!(
                tick = self.tick_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                skipped = ticks_skipped,
                "tick fired late"
            );
        }
        trace!(tick = self.tick_count, "tick");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Call once the room has finished handling the tick, to check the
    /// work stayed inside its budget. A no-op without a preceding tick.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.period.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick approaching budget"
            );
        }
    }

    /// Stop ticking. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Start ticking again, one full period from now.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = Instant::now() + self.period;
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks that fired late.
    pub fn total_overruns(&self) -> u64 {
        self.total_overruns
    }

    /// Periods skipped under [`TickPolicy::Skip`].
    pub fn total_skipped(&self) -> u64 {
        self.total_skipped
    }
}
