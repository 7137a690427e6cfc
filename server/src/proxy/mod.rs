//! HTTP API for inbox-assist
//!
//! Serves the JSON endpoints under `/api` over warp. Every request is
//! handled independently; the only shared state is the frozen configuration
//! and the pooled outbound HTTP client.

pub mod handlers;
pub mod server;

use std::sync::Arc;

pub use server::ApiServer;

use crate::common::create_http_client;
use crate::config::ServerConfig;

/// State shared by all request handlers. Immutable after startup.
pub struct AppState {
    pub config: ServerConfig,
    /// Outbound client for Google and OpenAI, bounded by the upstream timeout.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, ProxyError> {
        let http = create_http_client(config.upstream_timeout)?;
        Ok(Arc::new(Self { config, http }))
    }
}

/// Errors that stop the server itself, as opposed to a single request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to bind: {0}")]
    Bind(#[from] warp::Error),
}
