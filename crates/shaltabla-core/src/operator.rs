//! Operator control state for the running leaderboard.
//!
//! Shared between the runner task and the HTTP operator handlers. Control
//! fields are atomics so the runner can read them between cycles without
//! taking a lock. Two [`Notify`] handles wake the runner: one when it is
//! paused, one while it sleeps between cycles.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::config::MIN_TICK_INTERVAL_MS;

/// Why the runner stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// An operator called the stop endpoint.
    OperatorStop,
    /// The process is shutting down (e.g. Ctrl-C).
    Shutdown,
}

/// Shared runner control state.
#[derive(Debug)]
pub struct OperatorState {
    paused: AtomicBool,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    stop_notify: Notify,
    tick_interval_ms: AtomicU64,
    ticks_completed: AtomicU64,
    started_at: DateTime<Utc>,
    stop_reason: OnceLock<StopReason>,
}

impl OperatorState {
    /// Create control state with the configured tick interval.
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            ticks_completed: AtomicU64::new(0),
            started_at: Utc::now(),
            stop_reason: OnceLock::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the runner is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause after the current cycle.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume and wake the runner.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until resumed or stopped. Returns immediately when running.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. The first reason recorded wins.
    ///
    /// No cycle starts after this returns; a sleeping or paused runner is
    /// woken immediately.
    pub fn request_stop(&self, reason: StopReason) {
        let _ = self.stop_reason.set(reason);
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
        self.resume_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Reason recorded with the stop request, if any.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason.get().copied()
    }

    /// Sleep for `ms` milliseconds, returning early if a stop is requested.
    pub async fn sleep_unless_stopped(&self, ms: u64) {
        if self.is_stop_requested() {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(tokio::time::Duration::from_millis(ms)) => {}
            () = self.stop_notify.notified() => {}
        }
    }

    // -----------------------------------------------------------------------
    // Tick speed and progress
    // -----------------------------------------------------------------------

    /// Current interval between cycles in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the interval between cycles.
    ///
    /// Returns the previous interval, or `None` if `ms` is below
    /// [`MIN_TICK_INTERVAL_MS`] and was rejected.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Record a completed cycle.
    pub fn record_tick(&self) {
        self.ticks_completed.fetch_add(1, Ordering::AcqRel);
    }

    /// Cycles completed by the runner.
    pub fn ticks_completed(&self) -> u64 {
        self.ticks_completed.load(Ordering::Acquire)
    }

    /// When this control state was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds since [`started_at`](Self::started_at).
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Snapshot of the control state for the status endpoint.
    pub fn status(&self) -> RunnerStatus {
        RunnerStatus {
            ticks: self.ticks_completed(),
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            stop_reason: self.stop_reason(),
            tick_interval_ms: self.tick_interval_ms(),
            elapsed_seconds: self.elapsed_seconds(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// JSON status of the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerStatus {
    /// Cycles completed.
    pub ticks: u64,
    /// Whether the runner is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Why the runner stopped, once it has.
    pub stop_reason: Option<StopReason>,
    /// Interval between cycles in milliseconds.
    pub tick_interval_ms: u64,
    /// Seconds since start.
    pub elapsed_seconds: u64,
    /// RFC 3339 start timestamp.
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn starts_running() {
        let state = OperatorState::new(5000);
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert_eq!(state.ticks_completed(), 0);
    }

    #[test]
    fn pause_and_resume() {
        let state = OperatorState::new(5000);
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn interval_changes() {
        let state = OperatorState::new(5000);
        assert_eq!(state.set_tick_interval_ms(250), Some(5000));
        assert_eq!(state.tick_interval_ms(), 250);
    }

    #[test]
    fn sub_minimum_interval_is_rejected() {
        let state = OperatorState::new(5000);
        assert_eq!(state.set_tick_interval_ms(99), None);
        assert_eq!(state.tick_interval_ms(), 5000);
    }

    #[test]
    fn first_stop_reason_wins() {
        let state = OperatorState::new(5000);
        state.request_stop(StopReason::OperatorStop);
        state.request_stop(StopReason::Shutdown);
        assert!(state.is_stop_requested());
        assert_eq!(state.stop_reason(), Some(StopReason::OperatorStop));
    }

    #[tokio::test]
    async fn stop_interrupts_sleep() {
        let state = Arc::new(OperatorState::new(5000));
        let sleeper = Arc::clone(&state);
        let handle = tokio::spawn(async move { sleeper.sleep_unless_stopped(60_000).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        state.request_stop(StopReason::Shutdown);
        let finished = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(finished.is_ok());
    }

    #[tokio::test]
    async fn stop_releases_paused_runner() {
        let state = Arc::new(OperatorState::new(5000));
        state.pause();
        let waiter = Arc::clone(&state);
        let handle = tokio::spawn(async move { waiter.wait_if_paused().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        state.request_stop(StopReason::OperatorStop);
        let finished = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(finished.is_ok());
    }

    #[test]
    fn status_reflects_state() {
        let state = OperatorState::new(1000);
        state.record_tick();
        state.record_tick();
        state.pause();
        let status = state.status();
        assert_eq!(status.ticks, 2);
        assert!(status.paused);
        assert!(!status.stop_requested);
        assert_eq!(status.tick_interval_ms, 1000);
        assert_eq!(status.stop_reason, None);
    }
}
