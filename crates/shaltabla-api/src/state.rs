//! Shared application state for the leaderboard API.
//!
//! [`AppState`] holds the engine behind the same lock the runner ticks
//! through, the friend store, the persistence queue and the broadcast
//! channel that feeds `WebSocket` clients.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shaltabla_core::engine::{LeaderboardEngine, TickSummary};
use shaltabla_core::operator::OperatorState;
use shaltabla_db::{PersistHandle, Store};
use shaltabla_types::{LeaderboardView, TickerMessage};
use tokio::sync::{Mutex, broadcast};

/// Capacity of the broadcast channel for cycle summaries.
///
/// A subscriber that falls behind by more than this many messages receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
pub const BROADCAST_CAPACITY: usize = 256;

/// The engine shared between the runner and the handlers.
pub type SharedEngine = Arc<Mutex<LeaderboardEngine>>;

/// JSON cycle summary pushed over the `WebSocket`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TickBroadcast {
    /// Cycle number.
    pub tick: u64,
    /// Timestamp of the cycle's snapshots.
    pub timestamp: DateTime<Utc>,
    /// Narrator output of this cycle.
    pub messages: Vec<TickerMessage>,
    /// Ranked board after the cycle.
    pub leaderboard: LeaderboardView,
}

impl From<&TickSummary> for TickBroadcast {
    fn from(summary: &TickSummary) -> Self {
        Self {
            tick: summary.tick,
            timestamp: summary.timestamp,
            messages: summary.messages.clone(),
            leaderboard: summary.view.clone(),
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The leaderboard engine.
    pub engine: SharedEngine,
    /// Friend store for creation.
    pub store: Arc<Store>,
    /// Queue feeding the persistence writer.
    pub persist: PersistHandle,
    /// Broadcast sender for cycle summaries.
    pub tx: broadcast::Sender<TickBroadcast>,
    /// Runner control state (present when the runner is attached).
    pub operator_state: Option<Arc<OperatorState>>,
}

impl AppState {
    /// Create application state without operator controls.
    pub fn new(engine: SharedEngine, store: Arc<Store>, persist: PersistHandle) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            engine,
            store,
            persist,
            tx,
            operator_state: None,
        }
    }

    /// Attach runner control state.
    #[must_use]
    pub fn with_operator(mut self, operator: Arc<OperatorState>) -> Self {
        self.operator_state = Some(operator);
        self
    }

    /// Subscribe to the cycle broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<TickBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a cycle summary to every connected client.
    ///
    /// Returns the number of receivers reached; 0 when nobody is connected.
    pub fn broadcast(&self, summary: &TickBroadcast) -> usize {
        self.tx.send(summary.clone()).unwrap_or(0)
    }
}
