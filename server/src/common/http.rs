//! HTTP Client Utilities
//!
//! One shared reqwest client per process. reqwest pools connections
//! internally, so handlers clone it freely.

use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the outbound HTTP client.
///
/// `timeout` bounds every upstream call end to end; no call is retried.
pub fn create_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("inbox-assist/", env!("CARGO_PKG_VERSION")))
        .build()
}
