//! Setup diagnostics
//!
//! Reports which secrets are configured and the exact URLs to register with
//! Google. Secret values are never included.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use warp::reply::Response;

use super::auth::build_auth_url;
use super::common::respond;
use crate::common::AppResult;
use crate::config::{SecretStatus, ServerConfig};
use crate::proxy::AppState;

#[derive(Debug, Serialize)]
pub struct SetupReport {
    pub environment: BTreeMap<&'static str, SecretStatus>,
    pub urls: SetupUrls,
    pub instructions: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupUrls {
    pub base_url: String,
    pub redirect_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
}

/// `GET /api/debug-setup`
pub async fn debug_setup(state: Arc<AppState>) -> Response {
    info!("Setup diagnostics requested");
    respond(setup_report(&state.config))
}

fn setup_report(config: &ServerConfig) -> AppResult<SetupReport> {
    let environment = config
        .secret_status()
        .into_iter()
        .map(|status| (status.name, status))
        .collect();

    let redirect_uri = config.redirect_uri();
    let urls = SetupUrls {
        base_url: config.base_url().to_string(),
        auth_url: build_auth_url(config).ok().map(|r| r.auth_url),
        redirect_uri: redirect_uri.clone(),
    };

    Ok(SetupReport {
        environment,
        urls,
        instructions: vec![
            format!(
                "1. Add {} as an authorized redirect URI in Google Cloud Console",
                redirect_uri
            ),
            "2. Visit authUrl in your browser to test the OAuth flow".to_string(),
            "3. Make sure your account is listed as a test user on the OAuth consent screen".to_string(),
        ],
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_never_contains_secrets() {
        let config = ServerConfig::new("https://mail.example.com")
            .unwrap()
            .with_google_credentials(Some("cid-123".to_string()), Some("very-secret-value".to_string()))
            .with_openai(None, None);

        let report = serde_json::to_value(setup_report(&config).unwrap()).unwrap();
        let text = report.to_string();

        assert!(!text.contains("very-secret-value"));
        assert_eq!(report["environment"]["GOOGLE_CLIENT_SECRET"]["set"], true);
        assert_eq!(report["environment"]["GOOGLE_CLIENT_SECRET"]["length"], 17);
        assert_eq!(report["environment"]["OPENAI_API_KEY"]["set"], false);
        assert_eq!(report["urls"]["redirectUri"], "https://mail.example.com/api/token");
        assert!(report["urls"]["authUrl"].as_str().unwrap().contains("client_id=cid-123"));
        assert!(chrono::DateTime::parse_from_rfc3339(report["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_report_without_client_id_omits_auth_url() {
        let config = ServerConfig::new("http://localhost:3000").unwrap();
        let report = serde_json::to_value(setup_report(&config).unwrap()).unwrap();

        assert!(report["urls"].get("authUrl").is_none());
        assert_eq!(report["environment"]["GOOGLE_CLIENT_ID"]["set"], false);
    }
}
