//! Core data structures for the Shaltabla leaderboard.
//!
//! [`Friend`] is the record exchanged with the store. The `*View` and
//! [`FriendDetail`] types are read projections of the engine's state for
//! the API and any renderer. [`ScoreUpdate`] is the persistence payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{RankMovement, Timeframe, Tone};
use crate::ids::FriendId;

/// Lowest score a friend can hold.
pub const MIN_POINTS: u32 = 0;

/// Highest score a friend can hold.
pub const MAX_POINTS: u32 = 10_000;

/// One timestamped entry in a friend's snapshot log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PointSnapshot {
    /// Score at the time of the snapshot.
    pub points: u32,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
}

impl PointSnapshot {
    /// Create a snapshot.
    pub const fn new(points: u32, timestamp: DateTime<Utc>) -> Self {
        Self { points, timestamp }
    }
}

/// A friend as stored in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Friend {
    /// Stable identifier.
    pub id: FriendId,
    /// Display name.
    pub name: String,
    /// Current score.
    pub points: u32,
    /// Persisted snapshot log, oldest first (at most 100 entries).
    #[serde(default)]
    pub point_history: Vec<PointSnapshot>,
}

impl Friend {
    /// A brand-new friend with zero points and no history.
    pub fn new(id: FriendId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            points: MIN_POINTS,
            point_history: Vec::new(),
        }
    }
}

/// Persistence payload for one friend after a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScoreUpdate {
    /// Friend being updated.
    pub id: FriendId,
    /// New score.
    pub points: u32,
    /// Snapshot log truncated to the newest 100 entries.
    pub point_history: Vec<PointSnapshot>,
}

/// Scores to persist after a cycle or a reset, handed from the engine to the
/// storage writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PersistBatch {
    /// Cycle that produced the batch.
    pub tick: u64,
    /// One update per friend.
    pub updates: Vec<ScoreUpdate>,
}

/// Leaderboard row as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FriendView {
    /// Stable identifier.
    pub id: FriendId,
    /// Display name.
    pub name: String,
    /// Current score.
    pub points: u32,
    /// 1-based rank.
    pub rank: u32,
    /// Rank before the last ranking pass.
    pub previous_rank: Option<u32>,
    /// Direction of the last rank change.
    pub movement: RankMovement,
    /// Score the percentage change is measured against.
    pub baseline: u32,
    /// Percentage change relative to `baseline`.
    pub percentage_change: f64,
    /// Rolling sparkline history, oldest first.
    pub point_history: Vec<u32>,
}

/// The whole leaderboard in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardView {
    /// Number of completed cycles.
    pub tick: u64,
    /// Timeframe the percentages are measured over.
    pub timeframe: Timeframe,
    /// Rows sorted by rank.
    pub friends: Vec<FriendView>,
    /// Most recent ticker messages, oldest first.
    pub ticker: Vec<String>,
}

/// A single score movement between two consecutive snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChangeRecord {
    /// Signed size of the change.
    pub value: i64,
    /// Score before.
    pub from: u32,
    /// Score after.
    pub to: u32,
}

/// Summary statistics over a snapshot log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FriendStats {
    /// All-time high within the log.
    pub highest: u32,
    /// All-time low within the log.
    pub lowest: u32,
    /// Mean score.
    pub average: f64,
    /// Population standard deviation of the score.
    pub volatility: f64,
    /// Number of transitions between snapshots.
    pub total_changes: u32,
    /// Largest single increase.
    pub best_change: ChangeRecord,
    /// Largest single decrease.
    pub worst_change: ChangeRecord,
}

/// Everything the detail view needs for one friend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FriendDetail {
    /// The leaderboard row.
    pub friend: FriendView,
    /// Full snapshot log, oldest first.
    pub snapshots: Vec<PointSnapshot>,
    /// Statistics over `snapshots`.
    pub stats: FriendStats,
}

/// A narrator message produced during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickerMessage {
    /// Friend the message is about.
    pub friend_id: FriendId,
    /// Tone of the message.
    pub tone: Tone,
    /// Rendered text.
    pub text: String,
}
