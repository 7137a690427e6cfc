//! Wire types and client for the inbox-assist HTTP API.
//!
//! The server crate serializes these types directly, so a client built on
//! this crate always agrees with the server on field names and shapes.

pub mod client;
pub mod session;
pub mod types;

pub use client::{ClientError, InboxClient};
pub use session::Session;
pub use types::{
    AuthTokenSet, AuthUrlResponse, ComposeRequest, ComposeResponse, EmailMessage, ErrorBody,
    Priority, PriorityAssignment, PriorityResponse, SendRequest, SendResponse, SummaryResponse,
    TokenExchangeRequest,
};
