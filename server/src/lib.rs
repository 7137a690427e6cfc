pub mod ai;
pub mod auth;
pub mod common;
pub mod config;
pub mod google;
pub mod proxy;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use config::ServerConfig;
use proxy::{ApiServer, AppState, ProxyError};

/// Run the API server until Ctrl-C.
pub async fn run(config: ServerConfig, bind: SocketAddr) -> Result<(), ProxyError> {
    for name in config.missing_secrets() {
        warn!("{} is not set; endpoints that need it will report a setup error", name);
    }
    info!("Public base URL: {}", config.base_url());

    let state = AppState::new(config)?;
    let server = Arc::new(ApiServer::new(bind, state));

    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            signal_server.shutdown();
        }
    });

    server.start().await
}
