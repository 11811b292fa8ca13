//! REST transport for the classroom API.
//!
//! `api` carries the three auth calls behind the [`api::AuthApi`] trait so
//! the session store can be driven by fakes in tests. `classroom` is the
//! authenticated course/assignment/submission surface; it reads the bearer
//! header from a `SessionStore` passed in by the caller.

pub mod api;
pub mod classroom;
pub mod types;

use std::time::Duration;

use crate::config::Timeouts;
use types::ClientError;

/// Build the shared `reqwest` client with request and connect timeouts.
///
/// # Errors
///
/// Returns [`ClientError::HttpClientBuild`] if the TLS backend fails to initialize.
pub fn build_http_client(timeouts: Timeouts) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| ClientError::HttpClientBuild(e.to_string()))
}

/// Send a prepared request and return the status code and raw body text.
pub(crate) async fn send_for_text(request: reqwest::RequestBuilder) -> Result<(u16, String), ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    Ok((status, text))
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
