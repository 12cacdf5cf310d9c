//! The periodic cycle loop with operator controls.
//!
//! [`run_leaderboard`] owns the timer. Each iteration it sleeps for the
//! current interval, honors pause and stop requests, runs one engine cycle
//! under the engine lock and hands the summary to a [`TickCallback`]. The
//! first cycle runs one interval after start. A stop request interrupts the
//! sleep, and the stop flag is checked again once the lock is held, so no
//! cycle starts after a stop even if the lock was contended.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::engine::{LeaderboardEngine, TickSummary};
use crate::operator::{OperatorState, StopReason};

/// Receives every cycle's summary.
///
/// Called after the engine lock is released. Implementations must not
/// block: forward to channels or caches and return.
pub trait TickCallback: Send {
    /// Called after a cycle completes.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// A callback that ignores every cycle.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// How a run ended.
#[derive(Debug)]
pub struct RunResult {
    /// Why the loop exited.
    pub stop_reason: StopReason,
    /// Cycles executed by this run.
    pub total_ticks: u64,
    /// The last cycle's summary, if any cycle ran.
    pub final_summary: Option<TickSummary>,
}

/// Run cycles until the operator requests a stop.
pub async fn run_leaderboard<R: Rng + Send>(
    engine: &Arc<Mutex<LeaderboardEngine<R>>>,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> RunResult {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        tick_interval_ms = operator.tick_interval_ms(),
        "Leaderboard starting"
    );

    loop {
        operator
            .sleep_unless_stopped(operator.tick_interval_ms())
            .await;

        if operator.is_paused() {
            info!("Leaderboard paused, waiting for resume...");
            operator.wait_if_paused().await;
            if !operator.is_stop_requested() {
                info!("Leaderboard resumed");
            }
        }

        if operator.is_stop_requested() {
            return stopped(operator, total_ticks, last_summary);
        }

        let summary = {
            let mut engine = engine.lock().await;
            // A stop may have landed while another task held the lock.
            if operator.is_stop_requested() {
                None
            } else {
                Some(engine.tick(Utc::now()))
            }
        };
        let Some(summary) = summary else {
            return stopped(operator, total_ticks, last_summary);
        };
        total_ticks = total_ticks.saturating_add(1);
        operator.record_tick();

        callback.on_tick(&summary);
        last_summary = Some(summary);
    }
}

fn stopped(
    operator: &OperatorState,
    total_ticks: u64,
    final_summary: Option<TickSummary>,
) -> RunResult {
    let stop_reason = operator.stop_reason().unwrap_or(StopReason::OperatorStop);
    info!(reason = ?stop_reason, "Stop requested");
    RunResult {
        stop_reason,
        total_ticks,
        final_summary,
    }
}

/// Log how a run ended.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.stop_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Leaderboard stopped"
    );

    if let Some(ref summary) = result.final_summary {
        if let Some(leader) = summary.view.friends.first() {
            info!(
                tick = summary.tick,
                leader = %leader.name,
                points = leader.points,
                "Final standings"
            );
        }
    } else {
        warn!("Leaderboard stopped with no cycles executed");
    }
}
