//! HTTP Server
//!
//! Binds the routed warp filter to a TCP address and runs it until a
//! shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use super::handlers;
use super::{AppState, ProxyError};

/// API server bound to a TCP address
pub struct ApiServer {
    bind_addr: SocketAddr,

    /// Shared handler state
    state: Arc<AppState>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(bind_addr: SocketAddr, state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            bind_addr,
            state,
            shutdown_tx,
        }
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Serve until `shutdown` is called.
    pub async fn start(&self) -> Result<(), ProxyError> {
        let routes = handlers::routes(Arc::clone(&self.state));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let (addr, server) = warp::serve(routes).try_bind_with_graceful_shutdown(self.bind_addr, async move {
            let _ = shutdown_rx.recv().await;
        })?;

        info!("API server listening on http://{}", addr);
        info!("OAuth redirect URI: {}", self.state.config.redirect_uri());

        server.await;

        info!("API server shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[tokio::test]
    async fn test_start_reports_address_in_use() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let state = AppState::new(ServerConfig::new("http://localhost:3000").unwrap()).unwrap();
        let server = ApiServer::new(addr, state);

        assert!(matches!(server.start().await, Err(ProxyError::Bind(_))));
    }
}
