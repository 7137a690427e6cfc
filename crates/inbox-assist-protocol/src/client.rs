//! HTTP client for the inbox-assist API
//!
//! Wraps every endpoint in a typed call and keeps the signed-in state on a
//! [`Session`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::session::Session;
use crate::types::{
    AuthTokenSet, AuthUrlResponse, ComposeRequest, ComposeResponse, EmailMessage, ErrorBody,
    PriorityResponse, SendRequest, SendResponse, SummaryResponse, TokenExchangeRequest,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {}", .body.error)]
    Api { status: u16, body: ErrorBody },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("redirect URL does not carry an access_token")]
    MissingAccessToken,
}

impl ClientError {
    /// True when the server reported an expired or invalid bearer token.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }
}

/// Async client for the inbox-assist HTTP API.
#[derive(Debug, Clone)]
pub struct InboxClient {
    http: Client,
    base_url: Url,
}

impl InboxClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Self::with_http_client(http, base_url)
    }

    pub fn with_http_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        // Trailing slash so relative joins keep any path prefix.
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    pub async fn auth_url(&self) -> Result<AuthUrlResponse, ClientError> {
        let url = self.endpoint("api/auth/url")?;
        execute(self.http.get(url)).await
    }

    /// Exchange an authorization code and open a session with the tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<Session, ClientError> {
        let url = self.endpoint("api/token")?;
        let request = TokenExchangeRequest {
            code: code.to_string(),
        };
        let tokens: AuthTokenSet = execute(self.http.post(url).json(&request)).await?;
        Ok(Session::new(tokens))
    }

    /// Fetch the inbox and cache the result on the session.
    pub async fn list_emails<'s>(
        &self,
        session: &'s mut Session,
        max_results: Option<u32>,
    ) -> Result<&'s [EmailMessage], ClientError> {
        let url = self.endpoint("api/emails")?;
        let mut query = vec![("access_token", session.access_token().to_string())];
        if let Some(max) = max_results {
            query.push(("maxResults", max.to_string()));
        }

        let emails: Vec<EmailMessage> = execute(self.http.get(url).query(&query)).await?;
        session.replace_emails(emails);
        Ok(session.emails())
    }

    pub async fn send_email(
        &self,
        session: &Session,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<SendResponse, ClientError> {
        let url = self.endpoint("api/send")?;
        let request = SendRequest {
            access_token: session.access_token().to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        execute(self.http.post(url).json(&request)).await
    }

    /// Summarize the session's cached emails.
    pub async fn summarize(&self, session: &Session) -> Result<SummaryResponse, ClientError> {
        let url = self.endpoint("api/summary")?;
        execute(self.http.post(url).json(&EmailsPayload::new(session.emails()))).await
    }

    /// Prioritize the session's cached emails.
    ///
    /// Pair the result with [`Session::prioritized`] before the session's
    /// email list changes.
    pub async fn prioritize(&self, session: &Session) -> Result<PriorityResponse, ClientError> {
        let url = self.endpoint("api/prioritize")?;
        execute(self.http.post(url).json(&EmailsPayload::new(session.emails()))).await
    }

    pub async fn compose(&self, request: &ComposeRequest) -> Result<ComposeResponse, ClientError> {
        let url = self.endpoint("api/generate")?;
        execute(self.http.post(url).json(request)).await
    }
}

#[derive(Serialize)]
struct EmailsPayload<'a> {
    emails: &'a [EmailMessage],
}

impl<'a> EmailsPayload<'a> {
    fn new(emails: &'a [EmailMessage]) -> Self {
        Self { emails }
    }
}

async fn execute<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
    let response = builder.send().await?;
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_else(|_| ErrorBody {
            error: format!("HTTP {}", status),
            details: (!text.is_empty()).then_some(text),
            ..Default::default()
        });
        return Err(ClientError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn session() -> Session {
        Session::new(AuthTokenSet {
            access_token: "ya29.test".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expires_in: 3599,
        })
    }

    #[tokio::test]
    async fn test_list_emails_caches_on_session() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/emails")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("access_token".into(), "ya29.test".into()),
                Matcher::UrlEncoded("maxResults".into(), "5".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"m2","internalDate":"300"},{"id":"m1","internalDate":"100"}]"#)
            .create_async()
            .await;

        let client = InboxClient::new(&server.url()).unwrap();
        let mut session = session();
        let emails = client.list_emails(&mut session, Some(5)).await.unwrap();

        assert_eq!(emails.len(), 2);
        assert_eq!(session.emails()[0].id, "m2");
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/assistant/api/auth/url")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"authUrl":"https://accounts.google.com/o/oauth2/v2/auth?client_id=abc","baseUrl":"https://example.com/assistant","status":"ok"}"#)
            .create_async()
            .await;

        let client = InboxClient::new(&format!("{}/assistant/", server.url())).unwrap();
        assert_eq!(
            client.endpoint("api/auth/url").unwrap().path(),
            "/assistant/api/auth/url"
        );

        let client = InboxClient::new(&format!("{}/assistant", server.url())).unwrap();
        let response = client.auth_url().await.unwrap();

        assert!(response.auth_url.starts_with("https://accounts.google.com/"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_requires_reauth() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/emails")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Access token expired or invalid. Please sign in again.","details":"Google API error 401: Invalid Credentials"}"#)
            .create_async()
            .await;

        let client = InboxClient::new(&server.url()).unwrap();
        let mut session = session();
        let err = client.list_emails(&mut session, None).await.unwrap_err();

        assert!(err.requires_reauth());
        match err {
            ClientError::Api { body, .. } => {
                assert_eq!(body.details.as_deref(), Some("Google API error 401: Invalid Credentials"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_email_uses_snake_case_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/send")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "access_token": "ya29.test",
                "to": "bob@example.com",
                "subject": "Hi",
                "body": "Hello Bob"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"message":"Email sent successfully","id":"s1","threadId":"t1"}"#)
            .create_async()
            .await;

        let client = InboxClient::new(&server.url()).unwrap();
        let sent = client
            .send_email(&session(), "bob@example.com", "Hi", "Hello Bob")
            .await
            .unwrap();

        assert!(sent.success);
        assert_eq!(sent.thread_id.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_preserved() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = InboxClient::new(&server.url()).unwrap();
        let err = client
            .compose(&ComposeRequest {
                subject: "Hello".to_string(),
                tone: None,
                key_points: None,
            })
            .await
            .unwrap_err();

        match err {
            ClientError::Api { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.details.as_deref(), Some("Bad Gateway"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
