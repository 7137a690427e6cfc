//! Configuration management
//!
//! Resolves the server configuration once at startup. The public base URL is
//! the single source for every URL the server hands to Google, so the
//! redirect URI used when building the consent URL and when exchanging the
//! code can never drift apart.

use std::time::Duration;

use reqwest::Url;
use serde::Serialize;

pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the OAuth callback, appended to the public base URL.
pub const REDIRECT_PATH: &str = "/api/token";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid public base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Upstream endpoints. Overridden only in tests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub google_auth: String,
    pub google_token: String,
    pub gmail_api: String,
    pub openai_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google_auth: GOOGLE_AUTH_ENDPOINT.to_string(),
            google_token: GOOGLE_TOKEN_ENDPOINT.to_string(),
            gmail_api: GMAIL_API_BASE.to_string(),
            openai_api: OPENAI_API_BASE.to_string(),
        }
    }
}

/// Immutable server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    base_url: String,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub endpoints: Endpoints,
    pub upstream_timeout: Duration,
}

impl ServerConfig {
    /// Create a configuration with no secrets set.
    ///
    /// `public_base_url` must be an absolute http(s) URL; a trailing slash is
    /// dropped.
    pub fn new(public_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(public_base_url)?,
            google_client_id: None,
            google_client_secret: None,
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            endpoints: Endpoints::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        })
    }

    pub fn with_google_credentials(
        mut self,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        self.google_client_id = non_empty(client_id);
        self.google_client_secret = non_empty(client_secret);
        self
    }

    pub fn with_openai(mut self, api_key: Option<String>, model: Option<String>) -> Self {
        self.openai_api_key = non_empty(api_key);
        if let Some(model) = non_empty(model) {
            self.openai_model = model;
        }
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The exact redirect URI registered with Google.
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.base_url, REDIRECT_PATH)
    }

    /// Names of the secrets that are not configured.
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        self.secret_status()
            .into_iter()
            .filter(|s| !s.set)
            .map(|s| s.name)
            .collect()
    }

    /// Presence and length of each secret, never the value.
    pub fn secret_status(&self) -> Vec<SecretStatus> {
        vec![
            SecretStatus::of("GOOGLE_CLIENT_ID", self.google_client_id.as_deref()),
            SecretStatus::of("GOOGLE_CLIENT_SECRET", self.google_client_secret.as_deref()),
            SecretStatus::of("OPENAI_API_KEY", self.openai_api_key.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecretStatus {
    #[serde(skip)]
    pub name: &'static str,
    pub set: bool,
    pub length: usize,
}

impl SecretStatus {
    fn of(name: &'static str, value: Option<&str>) -> Self {
        Self {
            name,
            set: value.is_some(),
            length: value.map(str::len).unwrap_or(0),
        }
    }
}

/// Pick the public base URL: an explicit value wins, then a platform host
/// name (served over https), then localhost on the bound port.
pub fn resolve_public_base_url(explicit: Option<&str>, platform_host: Option<&str>, port: u16) -> String {
    if let Some(url) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return url.to_string();
    }
    if let Some(host) = platform_host.map(str::trim).filter(|s| !s.is_empty()) {
        return format!("https://{}", host);
    }
    format!("http://localhost:{}", port)
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment"));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_uri_from_base() {
        let config = ServerConfig::new("https://mail.example.com/").unwrap();
        assert_eq!(config.base_url(), "https://mail.example.com");
        assert_eq!(config.redirect_uri(), "https://mail.example.com/api/token");
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let config = ServerConfig::new("https://example.com/assistant/").unwrap();
        assert_eq!(config.redirect_uri(), "https://example.com/assistant/api/token");
    }

    #[test]
    fn test_rejects_bad_base_urls() {
        assert!(ServerConfig::new("mail.example.com").is_err());
        assert!(ServerConfig::new("ftp://mail.example.com").is_err());
        assert!(ServerConfig::new("https://mail.example.com/?x=1").is_err());
    }

    #[test]
    fn test_resolve_public_base_url() {
        assert_eq!(
            resolve_public_base_url(Some("https://a.example"), Some("b.vercel.app"), 3000),
            "https://a.example"
        );
        assert_eq!(
            resolve_public_base_url(Some("  "), Some("b.vercel.app"), 3000),
            "https://b.vercel.app"
        );
        assert_eq!(resolve_public_base_url(None, None, 8080), "http://localhost:8080");
    }

    #[test]
    fn test_blank_secrets_count_as_missing() {
        let config = ServerConfig::new("http://localhost:3000")
            .unwrap()
            .with_google_credentials(Some("id.apps.googleusercontent.com".to_string()), Some("  ".to_string()))
            .with_openai(None, Some(String::new()));

        assert_eq!(config.missing_secrets(), vec!["GOOGLE_CLIENT_SECRET", "OPENAI_API_KEY"]);
        assert_eq!(config.openai_model, DEFAULT_OPENAI_MODEL);

        let status = config.secret_status();
        assert_eq!(status[0].length, "id.apps.googleusercontent.com".len());
    }
}
