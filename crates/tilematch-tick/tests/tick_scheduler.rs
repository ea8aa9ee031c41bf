//! Integration tests for the tick scheduler.
//!
//! Tokio time is paused, so sleeps resolve as soon as the runtime is idle
//! and `advance` moves the clock deterministically.

use std::time::Duration;

use tilematch_tick::{TickConfig, TickPolicy, TickScheduler};

fn config_10hz() -> TickConfig {
    TickConfig {
        initial_jitter_us: 0,
        ..TickConfig::with_rate(10)
    }
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.tick_rate_hz, 10);
    assert_eq!(cfg.policy, TickPolicy::Skip);
    assert_eq!(cfg.period(), Duration::from_millis(100));
}

#[test]
fn test_validated_clamps_rate() {
    assert_eq!(TickConfig::with_rate(0).validated().tick_rate_hz, 1);
    assert_eq!(
        TickConfig::with_rate(500).validated().tick_rate_hz,
        TickConfig::MAX_TICK_RATE_HZ
    );
    assert_eq!(TickConfig::with_rate(20).validated().tick_rate_hz, 20);
}

#[test]
fn test_validated_clamps_threshold() {
    let cfg = TickConfig {
        budget_warn_threshold: 3.0,
        ..TickConfig::default()
    }
    .validated();
    assert_eq!(cfg.budget_warn_threshold, 1.0);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_initial_state() {
    let s = TickScheduler::new(config_10hz());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.tick_rate_hz(), 10);
    assert_eq!(s.period(), Duration::from_millis(100));
    assert!(!s.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_ticks_are_numbered_from_one() {
    let mut s = TickScheduler::new(config_10hz());
    for expected in 1..=4 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        assert!(!info.overrun);
    }
    assert_eq!(s.tick_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_waits_one_period() {
    let mut s = TickScheduler::new(config_10hz());
    let early = tokio::time::timeout(Duration::from_millis(99), s.wait_for_tick()).await;
    assert!(early.is_err());
    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
}

// =========================================================================
// Overruns
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reports_skipped_periods() {
    let mut s = TickScheduler::new(config_10hz());
    s.wait_for_tick().await;

    // Stall the loop for 3.5 periods.
    tokio::time::advance(Duration::from_millis(450)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 3);
    assert_eq!(s.total_overruns(), 1);
    assert_eq!(s.total_skipped(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_fires_back_to_back_after_stall() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::Drop,
        ..config_10hz()
    });
    s.wait_for_tick().await;
    tokio::time::advance(Duration::from_millis(350)).await;

    let late = s.wait_for_tick().await;
    assert!(late.overrun);
    assert_eq!(late.ticks_skipped, 0);

    // Still behind the original cadence: due immediately.
    let next = tokio::time::timeout(Duration::from_millis(1), s.wait_for_tick()).await;
    assert!(next.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_tick_is_noop() {
    let mut s = TickScheduler::new(config_10hz());
    s.record_tick_end();
    assert_eq!(s.tick_count(), 0);
}

// =========================================================================
// Pause / resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_paused_scheduler_never_fires() {
    let mut s = TickScheduler::new(config_10hz());
    s.wait_for_tick().await;
    s.pause();
    assert!(s.is_paused());

    let result = tokio::time::timeout(Duration::from_secs(10), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
    assert_eq!(s.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_continues_numbering() {
    let mut s = TickScheduler::new(config_10hz());
    s.wait_for_tick().await;
    s.pause();
    s.pause();
    s.resume();
    s.resume();
    assert!(!s.is_paused());

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 2);
    assert!(!info.overrun);
}

// =========================================================================
// select! loop, as a room uses it
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut s = TickScheduler::new(config_10hz());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        tx.send("stop").await.ok();
    });

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            info = s.wait_for_tick() => {
                ticks += 1;
                s.record_tick_end();
                assert_eq!(info.tick, ticks);
            }
        }
    }
    assert_eq!(ticks, 3);
}
