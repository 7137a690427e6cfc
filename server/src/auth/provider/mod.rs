//! OAuth Providers

pub mod google;

/// Errors from the provider's token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The provider answered with an OAuth error. `error` and `description`
    /// are the provider's own `error` / `error_description` values.
    #[error("{error} - {}", .description.as_deref().unwrap_or("no description"))]
    Rejected {
        status: u16,
        error: String,
        description: Option<String>,
    },

    #[error("Google returned non-JSON response: {0}")]
    NonJson(String),

    #[error("Missing access_token in response")]
    MissingAccessToken,
}
