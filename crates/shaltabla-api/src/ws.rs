//! Live leaderboard stream.
//!
//! `GET /ws/ticks` opens a `WebSocket` that first receives the current board
//! as a `board` frame, then one `tick` frame per completed cycle:
//!
//! ```json
//! {"type":"board","tick":12,"timeframe":"1m","friends":[...],"ticker":[...]}
//! {"type":"tick","tick":13,"timestamp":"...","messages":[...],"leaderboard":{...}}
//! ```
//!
//! `?top=N` limits every frame to the first `N` ranks. Cycle messages about
//! friends outside the limit are dropped with their rows. A client that
//! falls behind skips to the newest cycle and is sent nothing for the cycles
//! it missed; the next `tick` frame carries the full board again.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use shaltabla_types::LeaderboardView;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, TickBroadcast};

/// Query parameters of `GET /ws/ticks`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StreamParams {
    /// Only stream the first `top` ranks.
    pub top: Option<usize>,
}

impl StreamParams {
    fn trim_board(self, board: &mut LeaderboardView) {
        if let Some(top) = self.top {
            board.friends.truncate(top);
        }
    }

    fn trim_tick(self, tick: &mut TickBroadcast) {
        if self.top.is_none() {
            return;
        }
        self.trim_board(&mut tick.leaderboard);
        let shown = &tick.leaderboard.friends;
        tick.messages.retain(|m| shown.iter().any(|f| f.id == m.friend_id));
    }
}

/// One message on the stream.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Frame {
    /// Standings at connect time.
    Board(LeaderboardView),
    /// A completed cycle.
    Tick(TickBroadcast),
}

impl Frame {
    fn encode(&self) -> Option<String> {
        serde_json::to_string(self)
            .inspect_err(|e| warn!(error = %e, "Failed to encode stream frame"))
            .ok()
    }
}

/// Upgrade to a `WebSocket` and stream the board.
///
/// # Route
///
/// `GET /ws/ticks[?top=N]`
pub async fn ws_ticks(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreamParams>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_board(socket, state, params))
}

async fn stream_board(mut socket: WebSocket, state: Arc<AppState>, params: StreamParams) {
    // Subscribe before reading the board so no cycle falls between the two.
    let mut rx = state.subscribe();
    let mut board = state.engine.lock().await.view();
    let connected_at = board.tick;
    params.trim_board(&mut board);
    debug!(tick = connected_at, top = params.top, "Board stream opened");

    if let Some(json) = Frame::Board(board).encode() {
        let delivered = socket.send(Message::Text(json.into())).await.is_ok();
        if !delivered {
            return;
        }
    }

    let mut sent: u64 = 0;
    loop {
        tokio::select! {
            result = rx.recv() => match result {
                // Cycles already in the initial board.
                Ok(tick) if tick.tick <= connected_at => {}
                Ok(mut tick) => {
                    params.trim_tick(&mut tick);
                    let Some(json) = Frame::Tick(tick).encode() else { continue };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                    sent = sent.saturating_add(1);
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Board stream lagged, skipping ahead");
                }
                Err(RecvError::Closed) => break,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                // Clients have nothing to say on this stream.
                Some(Ok(_)) => {}
            },
        }
    }

    debug!(ticks_sent = sent, "Board stream closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use shaltabla_types::{FriendId, FriendView, RankMovement, TickerMessage, Timeframe, Tone};

    use super::*;

    fn row(name: &str, rank: u32) -> FriendView {
        FriendView {
            id: FriendId::new(),
            name: name.to_owned(),
            points: 1000_u32.saturating_sub(rank),
            rank,
            previous_rank: None,
            movement: RankMovement::New,
            baseline: 0,
            percentage_change: 0.0,
            point_history: Vec::new(),
        }
    }

    fn board() -> LeaderboardView {
        LeaderboardView {
            tick: 4,
            timeframe: Timeframe::OneMinute,
            friends: vec![row("Alex", 1), row("Jordan", 2), row("Sam", 3)],
            ticker: Vec::new(),
        }
    }

    fn message(friend_id: FriendId) -> TickerMessage {
        TickerMessage {
            friend_id,
            tone: Tone::Positive,
            text: "up".to_owned(),
        }
    }

    #[test]
    fn top_limits_board_rows() {
        let mut view = board();
        StreamParams { top: Some(2) }.trim_board(&mut view);
        let names: Vec<&str> = view.friends.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Alex", "Jordan"]);

        let mut view = board();
        StreamParams::default().trim_board(&mut view);
        assert_eq!(view.friends.len(), 3);
    }

    #[test]
    fn top_drops_messages_about_hidden_friends() {
        let view = board();
        let shown = view.friends[0].id;
        let hidden = view.friends[2].id;
        let mut tick = TickBroadcast {
            tick: 5,
            timestamp: Utc::now(),
            messages: vec![message(shown), message(hidden)],
            leaderboard: view,
        };
        StreamParams { top: Some(1) }.trim_tick(&mut tick);
        assert_eq!(tick.leaderboard.friends.len(), 1);
        assert_eq!(tick.messages.len(), 1);
        assert_eq!(tick.messages[0].friend_id, shown);
    }

    #[test]
    fn frames_are_tagged() {
        let json = Frame::Board(board()).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "board");
        assert_eq!(value["tick"], 4);
        assert_eq!(value["friends"].as_array().map(Vec::len), Some(3));

        let tick = TickBroadcast {
            tick: 5,
            timestamp: Utc::now(),
            messages: Vec::new(),
            leaderboard: board(),
        };
        let json = Frame::Tick(tick).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "tick");
        assert_eq!(value["leaderboard"]["tick"], 4);
    }
}
