//! Common Error Types
//!
//! Unified error handling with HTTP status mapping.

use std::fmt;

use inbox_assist_protocol::ErrorBody;
use warp::http::StatusCode;

/// Error categories surfaced to API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing server secrets. The caller should render setup instructions.
    Configuration,
    /// Missing or malformed caller input.
    Validation,
    /// Bearer token expired or invalid; the user must sign in again.
    UpstreamAuth,
    /// Token lacks the scope for the operation.
    UpstreamPermission,
    /// AI response failed structural validation.
    UpstreamFormat,
    /// Any other non-2xx from a dependency.
    UpstreamGeneric,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamAuth => StatusCode::UNAUTHORIZED,
            ErrorKind::UpstreamPermission => StatusCode::FORBIDDEN,
            ErrorKind::Configuration
            | ErrorKind::UpstreamFormat
            | ErrorKind::UpstreamGeneric
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Validation => "validation",
            ErrorKind::UpstreamAuth => "upstream_auth",
            ErrorKind::UpstreamPermission => "upstream_permission",
            ErrorKind::UpstreamFormat => "upstream_format",
            ErrorKind::UpstreamGeneric => "upstream_generic",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Application error carried from services to the HTTP boundary.
///
/// `message` is the short category shown to users; `details` keeps the
/// dependency's own diagnostic.
#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
    pub required: Option<Vec<String>>,
    pub missing: Option<Vec<String>>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            required: None,
            missing: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Validation error listing every required field and the ones absent.
    pub fn missing_fields(required: &[&str], missing: Vec<String>) -> Self {
        let mut err = Self::validation("Missing required fields").with_details(format!(
            "Required: {}. Missing: {}",
            required.join(", "),
            missing.join(", ")
        ));
        err.required = Some(required.iter().map(|f| f.to_string()).collect());
        err.missing = Some(missing);
        err
    }

    pub fn upstream_auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamAuth, message)
    }

    pub fn upstream_permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamPermission, message)
    }

    pub fn upstream_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamFormat, message)
    }

    pub fn upstream_generic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamGeneric, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// JSON body sent to the caller.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message.clone(),
            details: self.details.clone(),
            setup_required: (self.kind == ErrorKind::Configuration).then_some(true),
            required: self.required.clone(),
            missing: self.missing.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "[{}] {}: {}", self.kind.as_str(), self.message, details),
            None => write!(f, "[{}] {}", self.kind.as_str(), self.message),
        }
    }
}

impl std::error::Error for AppError {}
