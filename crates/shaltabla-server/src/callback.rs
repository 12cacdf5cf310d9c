//! Cycle callback feeding the API and the persistence writer.
//!
//! After each cycle this broadcasts a [`TickBroadcast`] to every connected
//! `WebSocket` client and queues the cycle's [`PersistOp::Scores`] batch.
//! Neither step waits.

use std::sync::Arc;

use shaltabla_api::state::{AppState, TickBroadcast};
use shaltabla_core::engine::TickSummary;
use shaltabla_core::runner::TickCallback;
use shaltabla_db::PersistOp;
use tracing::{debug, warn};

/// Callback that bridges the cycle loop to clients and storage.
pub struct LeaderboardCallback {
    state: Arc<AppState>,
}

impl LeaderboardCallback {
    /// Create a callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl TickCallback for LeaderboardCallback {
    fn on_tick(&mut self, summary: &TickSummary) {
        let receivers = self.state.broadcast(&TickBroadcast::from(summary));
        debug!(tick = summary.tick, receivers, "Tick broadcast sent");

        for message in &summary.messages {
            debug!(tick = summary.tick, friend_id = %message.friend_id, text = %message.text, "Ticker");
        }

        if let Err(e) = self
            .state
            .persist
            .submit(PersistOp::Scores(summary.persist.clone()))
        {
            warn!(tick = summary.tick, error = %e, "Score batch not persisted");
        }
    }
}
