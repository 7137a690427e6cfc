//! Auth Handler
//!
//! Consent URL construction and the authorization-code exchange, both as the
//! browser callback (GET, answers with a redirect or an HTML page) and as a
//! JSON endpoint (POST).

use std::collections::HashMap;
use std::sync::Arc;

use inbox_assist_protocol::{AuthTokenSet, AuthUrlResponse};
use tracing::{error, info, warn};
use warp::http::{StatusCode, Uri};
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::Reply;

use super::common::{html_page, parse_json_object, require_string, respond};
use crate::auth::{authorize_url, GoogleProvider, OAuthError, GMAIL_SCOPES};
use crate::common::{escape_html, AppError, AppResult};
use crate::config::ServerConfig;
use crate::proxy::AppState;

/// `GET /api/auth/url`
pub async fn auth_url(state: Arc<AppState>) -> Response {
    info!("Building consent URL");
    respond(build_auth_url(&state.config))
}

/// `GET /api/token`: the OAuth callback Google redirects the browser to.
pub async fn token_callback(state: Arc<AppState>, query: HashMap<String, String>) -> Response {
    info!(
        "OAuth callback (code {})",
        query
            .get("code")
            .map(|c| format!("present, {} chars", c.len()))
            .unwrap_or_else(|| "missing".to_string())
    );

    if let Some(provider_error) = query.get("error") {
        warn!("Google returned an OAuth error: {}", provider_error);
        return provider_error_page(provider_error, query.get("error_description").map(String::as_str));
    }

    let Some(code) = query.get("code").filter(|c| !c.trim().is_empty()) else {
        return html_page(
            StatusCode::BAD_REQUEST,
            "No Authorization Code",
            "<p>Google didn't return an authorization code.</p>",
        );
    };

    let tokens = match exchange(&state, code).await {
        Ok(tokens) => tokens,
        Err(err) => {
            error!("Token exchange failed: {}", err);
            return exchange_failure_page(&err);
        }
    };

    let location = app_redirect_url(state.config.base_url(), &tokens);
    match location.parse::<Uri>() {
        Ok(uri) => warp::redirect::found(uri).into_response(),
        Err(e) => {
            let err = AppError::internal("Failed to build redirect").with_details(e.to_string());
            error!("{}", err);
            exchange_failure_page(&err)
        }
    }
}

/// `POST /api/token` with `{code}`.
pub async fn token_exchange(state: Arc<AppState>, body: Bytes) -> Response {
    info!("Token exchange request");

    let result = async {
        let params = parse_json_object(&body)?;
        let code = require_string(&params, "code", "Authorization code required")?;
        exchange(&state, code).await
    }
    .await;

    respond(result)
}

pub(crate) fn build_auth_url(config: &ServerConfig) -> AppResult<AuthUrlResponse> {
    let client_id = config.google_client_id.as_deref().ok_or_else(|| {
        error!("GOOGLE_CLIENT_ID is missing");
        AppError::configuration("Server configuration error: GOOGLE_CLIENT_ID is missing")
    })?;

    Ok(AuthUrlResponse {
        auth_url: authorize_url(
            &config.endpoints.google_auth,
            client_id,
            GMAIL_SCOPES,
            &config.redirect_uri(),
        ),
        base_url: config.base_url().to_string(),
        status: "success".to_string(),
    })
}

async fn exchange(state: &AppState, code: &str) -> AppResult<AuthTokenSet> {
    let provider = google_provider(state)?;
    let redirect_uri = state.config.redirect_uri();

    info!("Exchanging code with {} (redirect URI {})", provider.name(), redirect_uri);

    provider
        .exchange_code(code, &redirect_uri)
        .await
        .map_err(oauth_error)
}

fn google_provider(state: &AppState) -> AppResult<GoogleProvider> {
    let config = &state.config;
    match (&config.google_client_id, &config.google_client_secret) {
        (Some(id), Some(secret)) => Ok(GoogleProvider::new(
            state.http.clone(),
            id.clone(),
            secret.clone(),
            config.endpoints.google_token.clone(),
        )),
        _ => {
            let missing: Vec<&str> = config
                .missing_secrets()
                .into_iter()
                .filter(|name| name.starts_with("GOOGLE_"))
                .collect();
            Err(AppError::configuration("Missing Google OAuth credentials in server configuration")
                .with_details(format!("Missing: {}", missing.join(", "))))
        }
    }
}

/// Map a token endpoint failure to an explanation the user can act on.
fn oauth_error(err: OAuthError) -> AppError {
    match &err {
        OAuthError::Rejected { error, .. } => {
            let message = match error.as_str() {
                "invalid_grant" => "Authorization code is invalid or expired. Please sign in again.",
                "redirect_uri_mismatch" => {
                    "Redirect URI mismatch. The redirect URI registered in Google Cloud Console must match exactly."
                }
                "invalid_client" => "Invalid Google OAuth client credentials.",
                _ => "Google rejected the token exchange",
            };
            AppError::upstream_generic(message).with_details(format!("Google OAuth error: {}", err))
        }
        OAuthError::NonJson(_) | OAuthError::MissingAccessToken => {
            AppError::upstream_generic("Token exchange failed").with_details(err.to_string())
        }
        OAuthError::Transport(_) => AppError::internal("Token exchange failed").with_details(err.to_string()),
    }
}

/// `<base>/?access_token=…&refresh_token=…&expires_in=…`
fn app_redirect_url(base_url: &str, tokens: &AuthTokenSet) -> String {
    format!(
        "{}/?access_token={}&refresh_token={}&expires_in={}",
        base_url,
        urlencoding::encode(&tokens.access_token),
        urlencoding::encode(tokens.refresh_token.as_deref().unwrap_or_default()),
        tokens.expires_in
    )
}

fn provider_error_page(error: &str, description: Option<&str>) -> Response {
    let description = description
        .map(|d| format!("<p>{}</p>", escape_html(d)))
        .unwrap_or_default();

    html_page(
        StatusCode::BAD_REQUEST,
        "Authentication Failed",
        &format!(
            r#"<div style="background: #fff3f3; border: 1px solid #ffcdd2; padding: 20px; border-radius: 8px; margin: 20px 0;">
      <p><strong>{}</strong></p>
      {}
    </div>"#,
            escape_html(error),
            description
        ),
    )
}

fn exchange_failure_page(err: &AppError) -> Response {
    let details = err
        .details
        .as_deref()
        .map(|d| format!("<p><code>{}</code></p>", escape_html(d)))
        .unwrap_or_default();

    html_page(
        err.status(),
        "Token Exchange Failed",
        &format!(
            r#"<div style="background: #fff3f3; border: 1px solid #ffcdd2; padding: 20px; border-radius: 8px; margin: 20px 0;">
      <p><strong>{}</strong></p>
      {}
    </div>
    <div style="text-align: left; display: inline-block; background: #f8f9fa; padding: 20px; border-radius: 8px;">
      <h4>Common Solutions:</h4>
      <ol>
        <li><strong>Redirect URI Mismatch:</strong> The redirect URI in Google Cloud Console must match exactly</li>
        <li><strong>Invalid Credentials:</strong> Check that the client ID and secret are correct</li>
        <li><strong>Authorization Code Expired:</strong> Codes expire quickly, try signing in again</li>
        <li><strong>OAuth Consent Screen:</strong> Make sure it is configured and your account is a test user</li>
      </ol>
    </div>
    <p><a href="/api/debug-setup" style="padding: 10px 20px; background: #34a853; color: white; text-decoration: none; border-radius: 5px;">Check Setup</a></p>"#,
            escape_html(&err.message),
            details
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{GMAIL_READONLY_SCOPE, GMAIL_SEND_SCOPE};
    use crate::common::ErrorKind;

    #[test]
    fn test_app_redirect_url_encodes_tokens() {
        let tokens = AuthTokenSet {
            access_token: "ya29.a+b/c".to_string(),
            refresh_token: None,
            expires_in: 3599,
        };
        assert_eq!(
            app_redirect_url("https://mail.example.com", &tokens),
            "https://mail.example.com/?access_token=ya29.a%2Bb%2Fc&refresh_token=&expires_in=3599"
        );
    }

    #[test]
    fn test_build_auth_url_requires_client_id() {
        let config = ServerConfig::new("https://mail.example.com").unwrap();
        let err = build_auth_url(&config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert_eq!(err.to_body().setup_required, Some(true));
    }

    #[test]
    fn test_build_auth_url_uses_configured_base() {
        let config = ServerConfig::new("https://mail.example.com/")
            .unwrap()
            .with_google_credentials(Some("cid".to_string()), None);
        let response = build_auth_url(&config).unwrap();

        assert_eq!(response.base_url, "https://mail.example.com");
        assert_eq!(response.status, "success");
        assert!(response
            .auth_url
            .contains("redirect_uri=https%3A%2F%2Fmail.example.com%2Fapi%2Ftoken"));
    }

    #[test]
    fn test_build_auth_url_requests_gmail_scopes() {
        let config = ServerConfig::new("https://mail.example.com")
            .unwrap()
            .with_google_credentials(Some("cid".to_string()), Some("secret".to_string()));
        let response = build_auth_url(&config).unwrap();

        assert_eq!(
            response.auth_url,
            authorize_url(
                &config.endpoints.google_auth,
                "cid",
                GMAIL_SCOPES,
                "https://mail.example.com/api/token"
            )
        );
        assert!(response.auth_url.contains(&urlencoding::encode(GMAIL_READONLY_SCOPE).into_owned()));
        assert!(response.auth_url.contains(&urlencoding::encode(GMAIL_SEND_SCOPE).into_owned()));
    }

    #[test]
    fn test_oauth_error_keeps_provider_text() {
        let err = oauth_error(OAuthError::Rejected {
            status: 400,
            error: "invalid_grant".to_string(),
            description: Some("Bad Request".to_string()),
        });
        assert_eq!(err.kind, ErrorKind::UpstreamGeneric);
        assert_eq!(err.details.as_deref(), Some("Google OAuth error: invalid_grant - Bad Request"));

        let err = oauth_error(OAuthError::NonJson("<html>".to_string()));
        assert!(err.details.unwrap().contains("<html>"));
    }
}
