//! Listener setup and the serve loop for the command endpoint.
//!
//! [`bind`] claims the TCP socket and [`serve`] runs the router on it
//! until `Ctrl-C`. [`start_server`] does both.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Port the endpoint listens on.
pub const DEFAULT_PORT: u16 = 8075;

/// Where the command endpoint listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to bind. Loopback by default; the endpoint is
    /// meant to sit behind the receiver's own web server.
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
        }
    }
}

/// Errors that can occur when starting or running the command server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("serve failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bind the listening socket for `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is in use or not
/// available on this host.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })
}

/// Serve the command router on an already bound listener until `Ctrl-C`.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Antenna switch endpoint listening");
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Antenna switch endpoint stopped");
    Ok(())
}

/// Bind `config.addr` and serve until `Ctrl-C`.
///
/// # Errors
///
/// See [`bind`] and [`serve`].
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_is_loopback_8075() {
        let config = ServerConfig::default();
        assert!(config.addr.ip().is_loopback());
        assert_eq!(config.addr.port(), DEFAULT_PORT);
        assert_eq!(config.addr.to_string(), "127.0.0.1:8075");
    }

    #[tokio::test]
    async fn bind_reports_address_in_use() {
        let first = bind(&ServerConfig {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        })
        .await
        .unwrap();
        let taken = first.local_addr().unwrap();

        let result = bind(&ServerConfig { addr: taken }).await;
        match result {
            Err(ServerError::Bind { addr, source }) => {
                assert_eq!(addr, taken);
                assert_eq!(source.kind(), std::io::ErrorKind::AddrInUse);
            }
            other => panic!("expected a bind error, got {other:?}"),
        }
    }
}
