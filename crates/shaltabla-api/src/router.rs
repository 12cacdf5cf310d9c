//! Axum router construction for the leaderboard API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/ticks` -- `WebSocket` cycle stream
/// - `GET|POST /api/friends` -- ranked board, create friend
/// - `GET|PATCH /api/friends/{id}` -- friend detail, set score
/// - `POST /api/friends/reset` -- zero every score
/// - `GET|PUT /api/timeframe` -- read or select the timeframe
/// - `GET /api/ticker` -- latest commentary
/// - `/api/operator/*` -- runner control
///
/// CORS allows any origin so a separately served dashboard can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/ticks", get(ws::ws_ticks))
        .route(
            "/api/friends",
            get(handlers::list_friends).post(handlers::create_friend),
        )
        .route("/api/friends/reset", post(handlers::reset))
        .route(
            "/api/friends/{id}",
            get(handlers::get_friend).patch(handlers::update_points),
        )
        .route(
            "/api/timeframe",
            get(handlers::get_timeframe).put(handlers::set_timeframe),
        )
        .route("/api/ticker", get(handlers::ticker))
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
