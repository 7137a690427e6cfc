//! OAuth2 authorization-code flow against Google.
//!
//! Stateless: tokens are returned to the caller and never stored.

pub mod provider;

pub use provider::google::{authorize_url, GoogleProvider, GMAIL_READONLY_SCOPE, GMAIL_SCOPES, GMAIL_SEND_SCOPE};
pub use provider::OAuthError;
