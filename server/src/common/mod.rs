//! Common Utilities
//!
//! Shared error handling, HTTP client construction, and HTML helpers.

pub mod error;
pub mod html;
pub mod http;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use html::escape_html;
pub use http::create_http_client;
pub use result::AppResult;
