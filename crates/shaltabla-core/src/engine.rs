//! The leaderboard engine: owns every friend's state and runs one cycle per
//! call to [`LeaderboardEngine::tick`].
//!
//! A cycle has five steps:
//!
//! 1. **Shuffle** -- randomize presentation order.
//! 2. **Mutate** -- move every score, narrate notable swings, record history
//!    and compute percentage change from the stored baseline.
//! 3. **Rank** -- capture previous ranks, sort by score, assign `1..N`.
//! 4. **Rebaseline** -- refresh every baseline for the selected timeframe.
//! 5. **Report** -- return a [`TickSummary`] with messages, the ranked view
//!    and a [`PersistBatch`] for the storage writer.
//!
//! The engine performs no I/O and reads no clock. Callers pass `now` and
//! forward the summary wherever it needs to go.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shaltabla_types::{
    Friend, FriendDetail, FriendId, FriendView, LeaderboardView, PersistBatch, RankMovement,
    ScoreUpdate, TickerMessage, Timeframe,
};
use tracing::{debug, warn};

use crate::config::{HistoryConfig, LeaderboardConfig, MutatorConfig, NarratorConfig, TieBreak};
use crate::history::{FriendHistory, percentage_change};
use crate::mutator;
use crate::narrator::{self, Ticker};
use crate::ranker::{self, Rankable};
use crate::stats::compute_stats;

/// Snapshots carried in each persistence update.
pub const PERSISTED_SNAPSHOTS: usize = 100;

/// Errors returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// No friend with this id is tracked.
    #[error("unknown friend: {id}")]
    UnknownFriend {
        /// The id that was looked up.
        id: FriendId,
    },

    /// A friend with this id is already tracked.
    #[error("friend already tracked: {id}")]
    DuplicateFriend {
        /// The id that was added twice.
        id: FriendId,
    },
}

/// Everything a cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// Cycle number (1-based).
    pub tick: u64,
    /// Timestamp recorded in every snapshot of this cycle.
    pub timestamp: DateTime<Utc>,
    /// Narrator output, in presentation order.
    pub messages: Vec<TickerMessage>,
    /// Ranked leaderboard after the cycle.
    pub view: LeaderboardView,
    /// Persistence request for the storage writer.
    pub persist: PersistBatch,
}

/// Engine-owned state of one friend.
#[derive(Debug, Clone)]
pub struct FriendState {
    id: FriendId,
    name: String,
    points: u32,
    rank: Option<u32>,
    previous_rank: Option<u32>,
    last_delta: i32,
    baseline: u32,
    change_basis: u32,
    percentage_change: f64,
    history: FriendHistory,
}

impl FriendState {
    fn restore(friend: Friend, history_config: HistoryConfig, now: DateTime<Utc>) -> Self {
        let points = mutator::clamp_points(i64::from(friend.points));
        let history = FriendHistory::restore(history_config, points, &friend.point_history, now);
        Self {
            id: friend.id,
            name: friend.name,
            points,
            rank: None,
            previous_rank: None,
            last_delta: 0,
            baseline: points,
            change_basis: points,
            percentage_change: 0.0,
            history,
        }
    }

    /// Identifier.
    pub const fn id(&self) -> FriendId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current score.
    pub const fn points(&self) -> u32 {
        self.points
    }

    /// Realized change from the last cycle.
    pub const fn last_delta(&self) -> i32 {
        self.last_delta
    }

    /// Baseline the next cycle's percentage change is measured against.
    pub const fn baseline(&self) -> u32 {
        self.baseline
    }

    /// Score history.
    pub const fn history(&self) -> &FriendHistory {
        &self.history
    }

    fn rebaseline(&mut self, timeframe: Timeframe, now: DateTime<Utc>) {
        self.baseline = self.history.baseline(timeframe, now, self.points);
    }

    fn view(&self) -> FriendView {
        let rank = self.rank.unwrap_or_default();
        FriendView {
            id: self.id,
            name: self.name.clone(),
            points: self.points,
            rank,
            previous_rank: self.previous_rank,
            movement: RankMovement::between(self.previous_rank, rank),
            baseline: self.change_basis,
            percentage_change: self.percentage_change,
            point_history: self.history.rolling().collect(),
        }
    }

    fn score_update(&self) -> ScoreUpdate {
        ScoreUpdate {
            id: self.id,
            points: self.points,
            point_history: self.history.recent_snapshots(PERSISTED_SNAPSHOTS),
        }
    }
}

impl Rankable for FriendState {
    fn points(&self) -> u32 {
        self.points
    }

    fn id(&self) -> FriendId {
        self.id
    }

    fn rank(&self) -> Option<u32> {
        self.rank
    }

    fn previous_rank(&self) -> Option<u32> {
        self.previous_rank
    }

    fn set_rank(&mut self, previous: Option<u32>, current: u32) {
        self.previous_rank = previous;
        self.rank = Some(current);
    }
}

/// The simulation and ranking engine.
///
/// Generic over the random source so tests can inject a seeded generator.
#[derive(Debug)]
pub struct LeaderboardEngine<R = StdRng> {
    friends: Vec<FriendState>,
    timeframe: Timeframe,
    tick: u64,
    ticker: Ticker,
    rng: R,
    mutator: MutatorConfig,
    history: HistoryConfig,
    narrator: NarratorConfig,
    tie_break: TieBreak,
}

impl LeaderboardEngine<StdRng> {
    /// Build an engine seeded from `simulation.seed`, or from OS entropy when
    /// no seed is configured.
    pub fn from_config(
        config: &LeaderboardConfig,
        friends: Vec<Friend>,
        now: DateTime<Utc>,
    ) -> Self {
        let rng = config
            .simulation
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::with_rng(config, rng, friends, now)
    }
}

impl<R: Rng> LeaderboardEngine<R> {
    /// Build an engine from the initial friend list and an explicit random source.
    ///
    /// Histories are restored from each friend's persisted snapshot log, the
    /// board is ranked once and baselines are computed for the configured
    /// default timeframe. Duplicate ids after the first are skipped.
    pub fn with_rng(
        config: &LeaderboardConfig,
        rng: R,
        friends: Vec<Friend>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut engine = Self {
            friends: Vec::with_capacity(friends.len()),
            timeframe: config.simulation.default_timeframe,
            tick: 0,
            ticker: Ticker::new(config.narrator.ticker_capacity),
            rng,
            mutator: config.mutator.clone(),
            history: config.history,
            narrator: config.narrator.clone(),
            tie_break: config.simulation.tie_break,
        };
        for friend in friends {
            if engine.contains(friend.id) {
                warn!(friend_id = %friend.id, "Skipping duplicate friend");
                continue;
            }
            engine
                .friends
                .push(FriendState::restore(friend, engine.history, now));
        }
        ranker::rank(&mut engine.friends, engine.tie_break);
        engine.rebaseline_all(now);
        engine
    }

    /// Run one cycle at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        ranker::shuffle(&mut self.friends, &mut self.rng);

        let mut messages = Vec::new();
        for friend in &mut self.friends {
            let old = friend.points;
            let mutation = mutator::mutate(&mut self.rng, &self.mutator, old, friend.last_delta);

            let narration = narrator::describe(
                &mut self.rng,
                &self.narrator,
                &friend.name,
                old,
                mutation.points,
            );
            if let Some(narration) = narration {
                self.ticker.push(narration.text.clone());
                messages.push(TickerMessage {
                    friend_id: friend.id,
                    tone: narration.tone,
                    text: narration.text,
                });
            }

            friend.points = mutation.points;
            friend.last_delta = mutation.delta;
            friend.history.record(mutation.points, now);
            friend.change_basis = friend.baseline;
            friend.percentage_change = percentage_change(friend.baseline, mutation.points);
        }

        ranker::rank(&mut self.friends, self.tie_break);
        for friend in &mut self.friends {
            friend.rebaseline(self.timeframe, now);
        }

        let view = self.view();
        debug!(
            tick = self.tick,
            friends = self.friends.len(),
            messages = messages.len(),
            leader = view.friends.first().map_or("", |f| f.name.as_str()),
            "Leaderboard cycle complete"
        );

        TickSummary {
            tick: self.tick,
            timestamp: now,
            messages,
            persist: self.persist_batch(),
            view,
        }
    }

    /// Select a timeframe and recompute every baseline immediately.
    ///
    /// Percentage change is re-measured against the new baselines so the
    /// board reflects the selection without waiting for the next cycle.
    pub fn set_timeframe(&mut self, timeframe: Timeframe, now: DateTime<Utc>) {
        self.timeframe = timeframe;
        self.rebaseline_all(now);
        debug!(timeframe = %timeframe, "Timeframe changed");
    }

    /// Detail view of one friend: row, full snapshot log and statistics.
    pub fn detail(&self, id: FriendId) -> Result<FriendDetail, EngineError> {
        let friend = self.find(id)?;
        Ok(FriendDetail {
            friend: friend.view(),
            snapshots: friend.history.snapshots().copied().collect(),
            stats: compute_stats(friend.history.snapshots()),
        })
    }

    /// Start tracking a friend created outside the engine.
    ///
    /// The board is re-ranked so ranks stay contiguous. Existing friends keep
    /// the previous rank from the last cycle.
    pub fn add_friend(
        &mut self,
        friend: Friend,
        now: DateTime<Utc>,
    ) -> Result<FriendView, EngineError> {
        let id = friend.id;
        if self.contains(id) {
            return Err(EngineError::DuplicateFriend { id });
        }
        let mut state = FriendState::restore(friend, self.history, now);
        state.rebaseline(self.timeframe, now);
        self.friends.push(state);
        ranker::rerank(&mut self.friends, self.tie_break);
        self.find(id).map(FriendState::view)
    }

    /// Set one friend's score between cycles.
    ///
    /// The new score is recorded in the friend's history and measured against
    /// the current baseline. Momentum is cleared so the next cycle starts
    /// from a fair coin. Returns the friend's row and the update to persist.
    pub fn set_points(
        &mut self,
        id: FriendId,
        points: u32,
        now: DateTime<Utc>,
    ) -> Result<(FriendView, ScoreUpdate), EngineError> {
        let points = mutator::clamp_points(i64::from(points));
        let friend = self
            .friends
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(EngineError::UnknownFriend { id })?;
        friend.points = points;
        friend.last_delta = 0;
        friend.history.record(points, now);
        friend.change_basis = friend.baseline;
        friend.percentage_change = percentage_change(friend.baseline, points);
        let update = friend.score_update();

        ranker::rerank(&mut self.friends, self.tie_break);
        let view = self.find(id)?.view();
        Ok((view, update))
    }

    /// Zero every score and wipe all history.
    ///
    /// Each friend gets a fresh `(0, now)` snapshot and loses its momentum.
    /// The ticker is cleared.
    pub fn reset(&mut self, now: DateTime<Utc>) -> PersistBatch {
        for friend in &mut self.friends {
            friend.points = 0;
            friend.last_delta = 0;
            friend.history.clear();
            friend.history.record(0, now);
        }
        self.ticker.clear();
        ranker::rank(&mut self.friends, self.tie_break);
        self.rebaseline_all(now);
        self.persist_batch()
    }

    /// Current leaderboard in rank order.
    pub fn view(&self) -> LeaderboardView {
        let mut friends: Vec<FriendView> = self.friends.iter().map(FriendState::view).collect();
        friends.sort_by_key(|f| f.rank);
        LeaderboardView {
            tick: self.tick,
            timeframe: self.timeframe,
            friends,
            ticker: self.ticker.messages(),
        }
    }

    /// Most recent narrator messages, oldest first.
    pub fn ticker(&self) -> Vec<String> {
        self.ticker.messages()
    }

    /// Selected timeframe.
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Number of completed cycles.
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Tracked friends in their current order.
    pub fn friends(&self) -> &[FriendState] {
        &self.friends
    }

    /// Whether a friend is tracked.
    pub fn contains(&self, id: FriendId) -> bool {
        self.friends.iter().any(|f| f.id == id)
    }

    fn find(&self, id: FriendId) -> Result<&FriendState, EngineError> {
        self.friends
            .iter()
            .find(|f| f.id == id)
            .ok_or(EngineError::UnknownFriend { id })
    }

    fn rebaseline_all(&mut self, now: DateTime<Utc>) {
        for friend in &mut self.friends {
            friend.rebaseline(self.timeframe, now);
            friend.change_basis = friend.baseline;
            friend.percentage_change = percentage_change(friend.baseline, friend.points);
        }
    }

    fn persist_batch(&self) -> PersistBatch {
        PersistBatch {
            tick: self.tick,
            updates: self.friends.iter().map(FriendState::score_update).collect(),
        }
    }
}
