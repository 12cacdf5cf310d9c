//! Per-friend score history: the sparkline buffer and the snapshot log.
//!
//! Both buffers are bounded FIFOs. The snapshot log also answers baseline
//! queries for the selected [`Timeframe`].

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use shaltabla_types::{PointSnapshot, Timeframe};

use crate::config::HistoryConfig;

/// Rolling sparkline buffer plus timestamped snapshot log for one friend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendHistory {
    rolling: VecDeque<u32>,
    snapshots: VecDeque<PointSnapshot>,
    rolling_capacity: usize,
    snapshot_capacity: usize,
}

impl FriendHistory {
    /// Empty history with the configured capacities.
    pub fn new(config: HistoryConfig) -> Self {
        let rolling_capacity = config.rolling_capacity.max(1);
        let snapshot_capacity = config.snapshot_capacity.max(1);
        Self {
            rolling: VecDeque::with_capacity(rolling_capacity),
            snapshots: VecDeque::with_capacity(snapshot_capacity),
            rolling_capacity,
            snapshot_capacity,
        }
    }

    /// History for a friend observed for the first time.
    ///
    /// The snapshot log is restored from `persisted` (newest entries kept).
    /// The sparkline is seeded from the tail of that log and always ends with
    /// `points`. With no persisted log a single `(points, now)` snapshot is
    /// recorded.
    pub fn restore(
        config: HistoryConfig,
        points: u32,
        persisted: &[PointSnapshot],
        now: DateTime<Utc>,
    ) -> Self {
        let mut history = Self::new(config);
        if persisted.is_empty() {
            history.record(points, now);
            return history;
        }

        for snapshot in persisted {
            history.push_snapshot(*snapshot);
            history.push_rolling(snapshot.points);
        }
        if history.rolling.back() != Some(&points) {
            history.push_rolling(points);
        }
        history
    }

    /// Append a score to both buffers, dropping the oldest entries past capacity.
    pub fn record(&mut self, points: u32, timestamp: DateTime<Utc>) {
        self.push_rolling(points);
        self.push_snapshot(PointSnapshot::new(points, timestamp));
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.rolling.clear();
        self.snapshots.clear();
    }

    /// Sparkline values, oldest first.
    pub fn rolling(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        self.rolling.iter().copied()
    }

    /// Snapshot log, oldest first.
    pub fn snapshots(&self) -> impl ExactSizeIterator<Item = &PointSnapshot> {
        self.snapshots.iter()
    }

    /// The newest `limit` snapshots, oldest first.
    pub fn recent_snapshots(&self, limit: usize) -> Vec<PointSnapshot> {
        let skip = self.snapshots.len().saturating_sub(limit);
        self.snapshots.iter().skip(skip).copied().collect()
    }

    /// Number of entries in the snapshot log.
    pub fn snapshot_len(&self) -> usize {
        self.snapshots.len()
    }

    /// Baseline score for `timeframe` as seen at `now`.
    ///
    /// `All` (or an empty log) uses the earliest snapshot, falling back to
    /// `current` when there are no snapshots. Other timeframes pick the
    /// snapshot nearest to `now - duration`; on an exact tie the one at or
    /// before the target wins.
    pub fn baseline(&self, timeframe: Timeframe, now: DateTime<Utc>, current: u32) -> u32 {
        let earliest = self.snapshots.front().map_or(current, |s| s.points);
        let Some(window_ms) = timeframe.duration_ms() else {
            return earliest;
        };
        let target = now
            .checked_sub_signed(Duration::milliseconds(window_ms))
            .unwrap_or(now);

        self.snapshots
            .iter()
            .rev()
            .min_by_key(|s| {
                let distance = s.timestamp.signed_duration_since(target).abs();
                (distance, s.timestamp > target)
            })
            .map_or(earliest, |s| s.points)
    }

    fn push_rolling(&mut self, points: u32) {
        self.rolling.push_back(points);
        while self.rolling.len() > self.rolling_capacity {
            self.rolling.pop_front();
        }
    }

    fn push_snapshot(&mut self, snapshot: PointSnapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.snapshot_capacity {
            self.snapshots.pop_front();
        }
    }
}

/// Percentage change of `points` relative to `baseline`.
///
/// A zero baseline reads as +100% when the score is positive and 0% otherwise.
pub fn percentage_change(baseline: u32, points: u32) -> f64 {
    if baseline > 0 {
        let base = f64::from(baseline);
        (f64::from(points) - base) / base * 100.0
    } else if points > 0 {
        100.0
    } else {
        0.0
    }
}
