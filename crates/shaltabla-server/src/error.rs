//! Error types for the server binary.

/// Top-level error for the server binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: shaltabla_core::config::ConfigError,
    },

    /// The friend store could not be opened or read.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: shaltabla_db::DbError,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
