//! REST endpoint handlers for the leaderboard.
//!
//! Reads and mutations both go through the engine lock shared with the
//! runner, so a request never observes a half-finished cycle.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/friends` | Ranked leaderboard |
//! | `POST` | `/api/friends` | Create a friend |
//! | `GET` | `/api/friends/{id}` | Friend detail with statistics |
//! | `PATCH` | `/api/friends/{id}` | Set one friend's score |
//! | `POST` | `/api/friends/reset` | Zero every score |
//! | `GET` | `/api/timeframe` | Selected timeframe |
//! | `PUT` | `/api/timeframe` | Select a timeframe |
//! | `GET` | `/api/ticker` | Latest narrator messages |

use std::borrow::Cow;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use chrono::Utc;
use shaltabla_db::PersistOp;
use shaltabla_types::{FriendId, Timeframe};
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Request body for `POST /api/friends`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct CreateFriendRequest {
    /// Display name, at most 64 characters. Surrounding whitespace is trimmed.
    #[validate(
        length(max = 64, message = "name is too long"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
}

/// Request body for `PATCH /api/friends/{id}`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct UpdatePointsRequest {
    /// New score in `[0, 10000]`.
    #[validate(range(min = 0, max = 10000, message = "points must be between 0 and 10000"))]
    pub points: i64,
}

/// Request body for `PUT /api/timeframe`.
#[derive(Debug, serde::Deserialize)]
pub struct SetTimeframeRequest {
    /// Timeframe label: `15s`, `1m`, `5m`, `10m`, `1h` or `all`.
    pub timeframe: String,
}

fn validate_not_blank(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("name must not be empty"));
        return Err(err);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with the current standings and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.engine.lock().await.view();
    let tick = view.tick;
    let timeframe = view.timeframe;
    let friend_count = view.friends.len();
    let rows: String = view
        .friends
        .iter()
        .map(|f| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:+.1}%</td></tr>",
                f.rank,
                escape_html(&f.name),
                f.points,
                f.percentage_change
            )
        })
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Shaltabla</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        table {{ border-collapse: collapse; width: 100%; }}
        td, th {{ border-bottom: 1px solid #30363d; padding: 0.4rem; text-align: left; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>Shaltabla</h1>
    <p class="subtitle">Live leaderboard -- tick {tick}, timeframe {timeframe}, {friend_count} friends</p>

    <table>
        <tr><th>Rank</th><th>Name</th><th>Points</th><th>Change</th></tr>
        {rows}
    </table>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/friends">/api/friends</a> -- Ranked leaderboard</li>
        <li><a href="/api/timeframe">/api/timeframe</a> -- Selected timeframe</li>
        <li><a href="/api/ticker">/api/ticker</a> -- Latest commentary</li>
        <li><a href="/api/operator/status">/api/operator/status</a> -- Runner status</li>
        <li><code>ws://host:port/ws/ticks</code> -- Live cycle stream</li>
    </ul>
</body>
</html>"#
    ))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Friends
// ---------------------------------------------------------------------------

/// Return the ranked leaderboard with the selected timeframe and ticker.
pub async fn list_friends(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.lock().await.view())
}

/// Create a friend with zero points and add it to the board.
///
/// The store assigns the id; the engine then starts tracking the friend.
/// Returns `201 Created` with the new row.
pub async fn create_friend(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateFriendRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    body.validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let friend = state.store.insert_friend(body.name.trim()).await?;
    let view = state.engine.lock().await.add_friend(friend, Utc::now())?;
    info!(friend_id = %view.id, name = %view.name, rank = view.rank, "Friend added");

    Ok((StatusCode::CREATED, Json(view)))
}

/// Return one friend's row, full snapshot log and statistics.
pub async fn get_friend(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = Uuid::parse_str(&id).map_err(|e| ApiError::InvalidUuid(format!("{id}: {e}")))?;
    let detail = state.engine.lock().await.detail(FriendId::from(uuid))?;
    Ok(Json(detail))
}

/// Set one friend's score between cycles.
///
/// The engine records the new score so the next cycle continues from it.
/// The write is queued while the engine lock is held, keeping its order
/// against resets the same as in the engine.
pub async fn update_points(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePointsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let uuid = Uuid::parse_str(&id).map_err(|e| ApiError::InvalidUuid(format!("{id}: {e}")))?;
    let Json(body) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    body.validate()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let points =
        u32::try_from(body.points).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let mut engine = state.engine.lock().await;
    let (view, update) = engine.set_points(FriendId::from(uuid), points, Utc::now())?;
    let tick = engine.tick_count();
    if let Err(e) = state.persist.submit(PersistOp::Points { tick, update }) {
        warn!(friend_id = %view.id, error = %e, "Score edit not persisted");
    }
    drop(engine);

    info!(friend_id = %view.id, points = view.points, rank = view.rank, "Points set");
    Ok(Json(view))
}

/// Zero every score and restart every history.
///
/// The store reset is queued behind earlier score writes while the engine
/// lock is still held, so no later cycle can be persisted ahead of it.
pub async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = Utc::now();
    let mut engine = state.engine.lock().await;
    let batch = engine.reset(now);
    if let Err(e) = state.persist.submit(PersistOp::Reset {
        at: now,
        tick: batch.tick,
    }) {
        warn!(error = %e, "Reset not persisted");
    }
    let view = engine.view();
    drop(engine);

    info!(
        tick = batch.tick,
        friends = batch.updates.len(),
        "Leaderboard reset"
    );
    Json(view)
}

// ---------------------------------------------------------------------------
// Timeframe
// ---------------------------------------------------------------------------

/// Return the selected timeframe and every accepted label.
pub async fn get_timeframe(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timeframe = state.engine.lock().await.timeframe();
    let options: Vec<&str> = Timeframe::ALL.into_iter().map(Timeframe::label).collect();
    Json(serde_json::json!({
        "timeframe": timeframe,
        "options": options,
    }))
}

/// Select a timeframe. Baselines and percentages are recomputed at once.
pub async fn set_timeframe(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetTimeframeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let timeframe: Timeframe = body
        .timeframe
        .parse()
        .map_err(|e: shaltabla_types::TimeframeParseError| {
            ApiError::InvalidRequest(e.to_string())
        })?;

    let mut engine = state.engine.lock().await;
    engine.set_timeframe(timeframe, Utc::now());
    let view = engine.view();
    drop(engine);

    Ok(Json(view))
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Return the latest narrator messages, oldest first.
pub async fn ticker(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let messages = state.engine.lock().await.ticker();
    Json(serde_json::json!({ "messages": messages }))
}
