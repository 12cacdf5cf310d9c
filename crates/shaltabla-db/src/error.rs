//! Error types for the data layer.
//!
//! Store operations return [`DbError`], which wraps the underlying [`sqlx`]
//! and `serde_json` errors. The background writer reports through
//! [`PersistError`](crate::writer::PersistError).

use shaltabla_types::FriendId;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No friend with this id exists.
    #[error("Friend not found: {0}")]
    NotFound(FriendId),

    /// A stored value is outside its valid range.
    #[error("Invalid stored value: {0}")]
    InvalidData(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
