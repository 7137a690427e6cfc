//! Google OAuth2 Provider
//!
//! Confidential-client authorization-code flow: the client secret stays on
//! the server and the code is exchanged server-side.

use inbox_assist_protocol::AuthTokenSet;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info};

use super::OAuthError;

pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

pub const GMAIL_SCOPES: &[&str] = &[GMAIL_READONLY_SCOPE, GMAIL_SEND_SCOPE];

const DEFAULT_EXPIRES_IN: u64 = 3600;
const NON_JSON_PREVIEW_CHARS: usize = 200;

/// Google OAuth2 provider.
pub struct GoogleProvider {
    http: Client,
    client_id: String,
    client_secret: String,
    token_endpoint: String,
}

impl GoogleProvider {
    pub fn new(http: Client, client_id: String, client_secret: String, token_endpoint: String) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            token_endpoint,
        }
    }

    pub fn name(&self) -> &str {
        "google"
    }

    /// Exchange an authorization code for tokens.
    ///
    /// `redirect_uri` must be byte-for-byte the one sent in the consent URL.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<AuthTokenSet, OAuthError> {
        info!(
            "Exchanging authorization code ({} chars) via {}",
            code.len(),
            self.token_endpoint
        );

        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::Transport(format!("Failed to read response body: {}", e)))?;

        debug!("Token endpoint responded with {}", status);

        let tokens = parse_token_response(status.as_u16(), &body);
        if let Err(e) = &tokens {
            error!("Token exchange failed: {}", e);
        }
        tokens
    }
}

/// Build the consent URL.
///
/// `access_type=offline` with `prompt=consent` makes Google issue a refresh
/// token on every login, not only the first.
pub fn authorize_url(auth_endpoint: &str, client_id: &str, scopes: &[&str], redirect_uri: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        auth_endpoint,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scopes.join(" ")),
    )
}

/// Parse a Google OAuth2 token response.
fn parse_token_response(status: u16, body: &str) -> Result<AuthTokenSet, OAuthError> {
    let parsed: Value = serde_json::from_str(body).map_err(|_| {
        OAuthError::NonJson(body.chars().take(NON_JSON_PREVIEW_CHARS).collect())
    })?;

    let error = parsed.get("error").and_then(|v| v.as_str());
    if error.is_some() || !(200..300).contains(&status) {
        return Err(OAuthError::Rejected {
            status,
            error: error.unwrap_or("unknown_error").to_string(),
            description: parsed
                .get("error_description")
                .and_then(|v| v.as_str())
                .map(String::from),
        });
    }

    let access_token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(OAuthError::MissingAccessToken)?
        .to_string();

    let refresh_token = parsed
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from);

    let expires_in = parsed
        .get("expires_in")
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_EXPIRES_IN);

    Ok(AuthTokenSet {
        access_token,
        refresh_token,
        expires_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(
            "https://accounts.google.com/o/oauth2/v2/auth",
            "123.apps.googleusercontent.com",
            GMAIL_SCOPES,
            "https://mail.example.com/api/token",
        );

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?client_id=123.apps.googleusercontent.com&"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fmail.example.com%2Fapi%2Ftoken"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fgmail.readonly%20https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fgmail.send"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.ends_with("prompt=consent"));
    }

    #[test]
    fn test_parse_token_response_success() {
        let body = r#"{
            "access_token": "ya29.test",
            "refresh_token": "1//0e.test",
            "token_type": "Bearer",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/gmail.readonly"
        }"#;

        let tokens = parse_token_response(200, body).unwrap();
        assert_eq!(tokens.access_token, "ya29.test");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//0e.test"));
        assert_eq!(tokens.expires_in, 3599);
    }

    #[test]
    fn test_parse_token_response_without_refresh_token() {
        let tokens = parse_token_response(200, r#"{"access_token": "ya29.test"}"#).unwrap();
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(tokens.expires_in, DEFAULT_EXPIRES_IN);
    }

    #[test]
    fn test_parse_token_response_error_is_verbatim() {
        let body = r#"{"error": "invalid_grant", "error_description": "Bad Request"}"#;
        let err = parse_token_response(400, body).unwrap_err();

        match &err {
            OAuthError::Rejected { status, error, description } => {
                assert_eq!(*status, 400);
                assert_eq!(error, "invalid_grant");
                assert_eq!(description.as_deref(), Some("Bad Request"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), "invalid_grant - Bad Request");
    }

    #[test]
    fn test_parse_token_response_non_json() {
        let body = "<html>".repeat(100);
        match parse_token_response(502, &body).unwrap_err() {
            OAuthError::NonJson(preview) => assert_eq!(preview.len(), NON_JSON_PREVIEW_CHARS),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_token_response_missing_access_token() {
        assert!(matches!(
            parse_token_response(200, r#"{"expires_in": 10}"#),
            Err(OAuthError::MissingAccessToken)
        ));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("code".into(), "4/0abc".into()),
                Matcher::UrlEncoded("client_id".into(), "cid".into()),
                Matcher::UrlEncoded("client_secret".into(), "secret".into()),
                Matcher::UrlEncoded("redirect_uri".into(), "https://mail.example.com/api/token".into()),
                Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.ok","expires_in":3599}"#)
            .create_async()
            .await;

        let provider = GoogleProvider::new(
            Client::new(),
            "cid".to_string(),
            "secret".to_string(),
            format!("{}/token", server.url()),
        );

        let tokens = provider
            .exchange_code("4/0abc", "https://mail.example.com/api/token")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(tokens.access_token, "ya29.ok");
        assert_eq!(tokens.expires_in, 3599);
    }
}
