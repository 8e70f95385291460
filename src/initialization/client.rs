//! HTTP client initialization.
//!
//! This module provides the function that builds the HTTP client used by the
//! HTTP repository backend.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::HTTP_USER_AGENT;

/// Initializes the HTTP client used for the store's import and query endpoints.
///
/// Creates a `reqwest::Client` configured with:
/// - A fixed User-Agent identifying this library
/// - The optional request timeout (covers connect, send, and body read)
/// - No idle connection pooling, so no connection outlives the call that
///   opened it
/// - Rustls TLS backend (no native TLS)
///
/// # Arguments
///
/// * `timeout` - Per-request timeout, or `None` to rely on the OS defaults
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(timeout: Option<Duration>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = ClientBuilder::new()
        .user_agent(HTTP_USER_AGENT)
        .pool_max_idle_per_host(0);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
