//! Runtime control of the cycle loop.
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | `POST` | `/api/operator/pause` | Hold the board after the current cycle |
//! | `POST` | `/api/operator/resume` | Start cycling again |
//! | `POST` | `/api/operator/speed` | Change the cycle interval (ms) |
//! | `GET` | `/api/operator/status` | Runner status |
//! | `POST` | `/api/operator/stop` | End the cycle loop for good |
//!
//! Every control action answers with a [`ControlResponse`] carrying the
//! runner status after the change, so a dashboard never needs a second
//! round trip. Without a runner (for example in tests) all routes return 500.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use shaltabla_core::config::MIN_TICK_INTERVAL_MS;
use shaltabla_core::operator::{OperatorState, RunnerStatus, StopReason};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// Milliseconds between cycles; at least the configured minimum.
    pub tick_interval_ms: u64,
}

/// Outcome of a control action.
#[derive(Debug, serde::Serialize)]
pub struct ControlResponse {
    /// What changed, for the operator's log.
    pub message: String,
    /// Interval before a speed change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_interval_ms: Option<u64>,
    /// Runner status after the action.
    pub status: RunnerStatus,
}

impl ControlResponse {
    fn after(operator: &OperatorState, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
            previous_interval_ms: None,
            status: operator.status(),
        })
    }
}

fn runner(state: &AppState) -> Result<&OperatorState, ApiError> {
    state
        .operator_state
        .as_deref()
        .ok_or_else(|| ApiError::Internal("cycle runner not attached".to_owned()))
}

/// Hold the board after the current cycle.
pub async fn pause(State(state): State<Arc<AppState>>) -> Result<Json<ControlResponse>, ApiError> {
    let operator = runner(&state)?;
    operator.pause();
    info!(tick = operator.ticks_completed(), "Leaderboard paused by operator");
    Ok(ControlResponse::after(operator, "paused"))
}

/// Start cycling again after a pause.
pub async fn resume(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ControlResponse>, ApiError> {
    let operator = runner(&state)?;
    operator.resume();
    info!(tick = operator.ticks_completed(), "Leaderboard resumed by operator");
    Ok(ControlResponse::after(operator, "resumed"))
}

/// Change the cycle interval. The running sleep is not cut short; the new
/// interval applies from the next one.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetSpeedRequest>, JsonRejection>,
) -> Result<Json<ControlResponse>, ApiError> {
    let operator = runner(&state)?;
    let Json(body) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let requested = body.tick_interval_ms;

    let previous = operator.set_tick_interval_ms(requested).ok_or_else(|| {
        ApiError::InvalidRequest(format!(
            "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}, got {requested}"
        ))
    })?;
    info!(previous_ms = previous, new_ms = requested, "Cycle interval changed");

    let mut response = ControlResponse::after(operator, format!("interval {requested}ms"));
    response.previous_interval_ms = Some(previous);
    Ok(response)
}

/// Current runner status.
pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<RunnerStatus>, ApiError> {
    Ok(Json(runner(&state)?.status()))
}

/// End the cycle loop. The HTTP side stays up so the final board can still
/// be read and edited.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<Json<ControlResponse>, ApiError> {
    let operator = runner(&state)?;
    operator.request_stop(StopReason::OperatorStop);
    info!(tick = operator.ticks_completed(), "Operator stopped the cycle loop");
    Ok(ControlResponse::after(operator, "stopped"))
}
