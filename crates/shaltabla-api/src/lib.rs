//! Leaderboard API server for Shaltabla.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/ticks`) streaming every cycle via
//!   [`tokio::sync::broadcast`]
//! - **REST endpoints** for the ranked board, friend detail, friend
//!   creation, daily reset, timeframe selection and the ticker
//! - **Operator endpoints** for pause, resume, speed, status and stop
//! - **Minimal HTML page** (`GET /`) with the current standings
//!
//! Handlers share the engine lock with the cycle runner. Persistence goes
//! through the writer queue and never blocks a request.

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, BROADCAST_CAPACITY, SharedEngine, TickBroadcast};
