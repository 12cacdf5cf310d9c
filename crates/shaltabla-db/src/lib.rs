//! Data layer for the Shaltabla leaderboard.
//!
//! Friends live in `PostgreSQL` (or process memory for tests and demos).
//! The engine never touches the store directly: cycle output is queued for
//! a background writer that applies it in order.
//!
//! ```text
//! Engine cycle
//!     |
//!     +-- PersistBatch --> PersistHandle::submit (bounded, non-blocking)
//!                              |
//!                              +-- writer task --> Store::{batch_update, update_points, reset_all}
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` pool settings, connection and migrations
//! - [`friend_store`] -- Friend CRUD over `PostgreSQL` or memory
//! - [`writer`] -- Background writer with retry policy
//! - [`error`] -- Shared error types

pub mod error;
pub mod friend_store;
pub mod postgres;
pub mod writer;

// Re-export primary types for convenience.
pub use error::DbError;
pub use friend_store::{FriendRow, MemoryFriendStore, PostgresFriendStore, Store};
pub use postgres::{PostgresConfig, PostgresPool};
pub use writer::{
    PersistError, PersistHandle, PersistOp, RetryPolicy, WriterStats, apply_with_retry,
    spawn_writer,
};
