//! Leaderboard server binary for Shaltabla.
//!
//! Wires the engine, the cycle runner, the persistence writer and the API
//! server together, then runs cycles until stopped.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `shaltabla-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Open the friend store (connect and migrate) and load the initial friends
//! 4. Build the engine and start the persistence writer
//! 5. Start the API server and the Ctrl-C handler
//! 6. Run the cycle loop
//! 7. Drain the writer and log the result

mod callback;
mod error;
mod roster;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shaltabla_api::server::{ServerConfig, start_server};
use shaltabla_api::state::AppState;
use shaltabla_core::config::{
    InfrastructureConfig, LeaderboardConfig, LoggingConfig, StorageBackend,
};
use shaltabla_core::engine::LeaderboardEngine;
use shaltabla_core::operator::{OperatorState, StopReason};
use shaltabla_core::runner;
use shaltabla_db::{
    MemoryFriendStore, PostgresConfig, PostgresPool, RetryPolicy, Store, spawn_writer,
};
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::callback::LeaderboardCallback;
use crate::error::AppError;
use crate::roster::demo_roster;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "shaltabla-config.yaml";

/// How long shutdown waits for queued writes to finish.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging or the store cannot be
/// initialized.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = Path::new(CONFIG_PATH);
    let config_found = config_path.exists();
    let config = if config_found {
        LeaderboardConfig::from_file(config_path).map_err(AppError::from)?
    } else {
        LeaderboardConfig::parse("").map_err(AppError::from)?
    };

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("shaltabla-server starting");
    if !config_found {
        info!("Config file not found, using defaults");
    }
    info!(
        seed = config.simulation.seed,
        tick_interval_ms = config.simulation.tick_interval_ms,
        timeframe = %config.simulation.default_timeframe,
        backend = ?config.persistence.backend,
        "Configuration loaded"
    );

    // 3. Open the store.
    let store = Arc::new(open_store(&config).await?);
    let friends = store.list_friends().await.map_err(AppError::from)?;
    info!(
        backend = store.backend(),
        friends = friends.len(),
        "Friends loaded"
    );

    // 4. Engine and writer.
    let engine = Arc::new(Mutex::new(LeaderboardEngine::from_config(
        &config,
        friends,
        Utc::now(),
    )));
    let policy = RetryPolicy {
        max_retries: config.persistence.max_retries,
        backoff: Duration::from_millis(config.persistence.retry_backoff_ms),
    };
    let (persist, writer) = spawn_writer(
        Arc::clone(&store),
        config.persistence.queue_capacity,
        policy,
    );
    info!(
        queue_capacity = config.persistence.queue_capacity,
        max_retries = policy.max_retries,
        "Persist writer started"
    );

    // 5. API server and Ctrl-C.
    let operator = Arc::new(OperatorState::new(config.simulation.tick_interval_ms));
    let app_state = Arc::new(
        AppState::new(Arc::clone(&engine), Arc::clone(&store), persist)
            .with_operator(Arc::clone(&operator)),
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    spawn_ctrl_c_handler(Arc::clone(&operator), shutdown_tx);

    let server_config = ServerConfig::from(&config.infrastructure);
    let server_state = Arc::clone(&app_state);
    let server = tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        };
        if let Err(e) = start_server(&server_config, server_state, shutdown).await {
            error!(error = %e, "API server failed");
        }
    });

    // 6. Run cycles.
    let mut callback = LeaderboardCallback::new(Arc::clone(&app_state));
    let result = runner::run_leaderboard(&engine, &operator, &mut callback).await;
    runner::log_run_end(&result);
    drop(callback);

    if result.stop_reason == StopReason::OperatorStop {
        info!("Cycles stopped by operator, API serving until Ctrl-C");
    }
    if let Err(e) = server.await {
        warn!(error = %e, "API server task failed");
    }

    // 7. Drain queued writes.
    drop(app_state);
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await {
        Ok(Ok(stats)) => info!(
            written = stats.written,
            failed = stats.failed,
            stale = stats.stale,
            "Persist writer finished"
        ),
        Ok(Err(e)) => warn!(error = %e, "Persist writer task failed"),
        Err(_) => warn!("Persist writer did not drain in time"),
    }

    info!(
        reason = ?result.stop_reason,
        total_ticks = result.total_ticks,
        "shaltabla-server shutdown complete"
    );

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AppError::Logging {
        message: e.to_string(),
    })
}

/// Open the configured store.
///
/// `PostgreSQL` is connected and migrated. The memory backend starts with
/// the demo roster.
async fn open_store(config: &LeaderboardConfig) -> Result<Store, AppError> {
    match config.persistence.backend {
        StorageBackend::Postgres => {
            let pool = PostgresPool::connect(&postgres_config(&config.infrastructure)).await?;
            Ok(Store::Postgres(pool.friend_store()))
        }
        StorageBackend::Memory => Ok(Store::Memory(MemoryFriendStore::with_friends(
            demo_roster(),
        ))),
    }
}

/// Pool settings from the infrastructure section.
fn postgres_config(infra: &InfrastructureConfig) -> PostgresConfig {
    PostgresConfig::new(&infra.postgres_url)
        .with_max_connections(infra.postgres_max_connections)
        .with_acquire_timeout(Duration::from_millis(infra.postgres_acquire_timeout_ms))
}

/// Stop the cycle loop and the API server on Ctrl-C.
fn spawn_ctrl_c_handler(operator: Arc<OperatorState>, shutdown: watch::Sender<bool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                operator.request_stop(StopReason::Shutdown);
                let _ = shutdown.send(true);
            }
            Err(e) => {
                warn!(error = %e, "Ctrl-C handler unavailable");
                // Hold the sender so the server is not shut down.
                std::future::pending::<()>().await;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_config_follows_infrastructure() {
        let infra = InfrastructureConfig {
            postgres_url: "postgresql://u:p@db:5433/board".to_owned(),
            postgres_max_connections: 9,
            postgres_acquire_timeout_ms: 1500,
            ..InfrastructureConfig::default()
        };
        let config = postgres_config(&infra);
        assert_eq!(config.url, infra.postgres_url);
        assert_eq!(config.max_connections, 9);
        assert_eq!(config.acquire_timeout, Duration::from_millis(1500));
    }
}
