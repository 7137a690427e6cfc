//! Google API Client Module
//!
//! Authenticated access to the Gmail REST API with the caller's bearer token.

pub mod client;
pub mod common;
pub mod gmail;
pub mod message;

pub use client::{GoogleApiError, GoogleClient};
pub use gmail::GmailApi;
