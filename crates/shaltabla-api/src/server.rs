//! HTTP server lifecycle.
//!
//! [`start_server`] binds the listener, serves the router and returns once
//! the shutdown future resolves and in-flight requests finish.

use std::future::Future;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::sync::Arc;

use shaltabla_core::config::InfrastructureConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Where the leaderboard API listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address to bind, `0.0.0.0` for every interface.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&InfrastructureConfig::default())
    }
}

impl From<&InfrastructureConfig> for ServerConfig {
    fn from(infra: &InfrastructureConfig) -> Self {
        Self {
            host: infra.api_host.clone(),
            port: infra.api_port,
        }
    }
}

impl ServerConfig {
    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidHost`] if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let ip: IpAddr = self.host.parse().map_err(|source| ServerError::InvalidHost {
            host: self.host.clone(),
            source,
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Serve the leaderboard API until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::InvalidHost`] or [`ServerError::Bind`] before
/// serving starts, and [`ServerError::Serve`] on a fatal I/O error after.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Leaderboard API listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!(%addr, "Leaderboard API stopped");
    Ok(())
}

/// Failures of the API server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// `api_host` is not an IP address.
    #[error("api_host {host:?} is not an IP address: {source}")]
    InvalidHost {
        /// The configured host.
        host: String,
        /// Parse failure.
        source: AddrParseError,
    },

    /// The listener could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Address that was tried.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serving stopped on an I/O error.
    #[error("API server failed: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_follows_infrastructure() {
        let infra = InfrastructureConfig {
            api_host: "127.0.0.1".to_owned(),
            api_port: 9090,
            ..InfrastructureConfig::default()
        };
        let config = ServerConfig::from(&infra);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(
            config.socket_addr().ok(),
            Some(SocketAddr::from(([127, 0, 0, 1], 9090)))
        );
    }

    #[test]
    fn hostname_is_rejected_before_binding() {
        let config = ServerConfig {
            host: "leaderboard.local".to_owned(),
            port: 8080,
        };
        let err = config.socket_addr().err();
        assert!(matches!(
            err,
            Some(ServerError::InvalidHost { ref host, .. }) if host == "leaderboard.local"
        ));
    }
}
