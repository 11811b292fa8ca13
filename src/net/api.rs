//! Auth endpoints: identity resolution, token issue, registration.
//!
//! Thin HTTP wrapper over `reqwest`. Response parsing lives in pure
//! functions (`parse_identity`, `parse_token`) for testability.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use super::types::{ClientError, Credential, Identity, RegisterRequest, TokenGrant, WireToken, WireUser, error_detail};
use super::{build_http_client, is_success, send_for_text};
use crate::config::{ClientConfig, join_url};

pub const ME_PATH: &str = "/auth/me";
pub const TOKEN_PATH: &str = "/auth/token";
pub const REGISTER_PATH: &str = "/auth/register";

// =============================================================================
// TRAIT
// =============================================================================

/// The auth calls the session store depends on. Enables fakes in tests.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET /auth/me` with `Authorization: Bearer <credential>`.
    ///
    /// # Errors
    ///
    /// Any transport failure, non-2xx status, malformed body, or unknown role.
    async fn current_user(&self, credential: &Credential) -> Result<Identity, ClientError>;

    /// `POST /auth/token` with form fields `username` and `password`.
    ///
    /// # Errors
    ///
    /// [`ClientError::AuthRejected`] on non-2xx, otherwise transport/parse errors.
    async fn issue_token(&self, email: &str, password: &str) -> Result<TokenGrant, ClientError>;

    /// `POST /auth/register`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// [`ClientError::AuthRejected`] on non-2xx, otherwise transport errors.
    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    api_url: String,
}

impl HttpAuthApi {
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = build_http_client(config.timeouts)?;
        Ok(Self::with_client(http, config.api_url.clone()))
    }

    /// Reuse an existing `reqwest` client (shares its connection pool).
    #[must_use]
    pub fn with_client(http: reqwest::Client, api_url: String) -> Self {
        Self { http, api_url }
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.api_url, path)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn current_user(&self, credential: &Credential) -> Result<Identity, ClientError> {
        let request = self
            .http
            .get(self.url(ME_PATH))
            .header(AUTHORIZATION, credential.bearer());
        let (status, text) = send_for_text(request).await?;
        if !is_success(status) {
            return Err(ClientError::SessionInvalid(format!(
                "status {status}: {}",
                error_detail(status, &text)
            )));
        }
        parse_identity(&text)
    }

    async fn issue_token(&self, email: &str, password: &str) -> Result<TokenGrant, ClientError> {
        let form = [("username", email), ("password", password)];
        let request = self.http.post(self.url(TOKEN_PATH)).form(&form);
        let (status, text) = send_for_text(request).await?;
        if !is_success(status) {
            return Err(ClientError::AuthRejected { status, detail: error_detail(status, &text) });
        }
        parse_token(&text)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError> {
        let request = self.http.post(self.url(REGISTER_PATH)).json(request);
        let (status, text) = send_for_text(request).await?;
        if !is_success(status) {
            return Err(ClientError::AuthRejected { status, detail: error_detail(status, &text) });
        }
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_identity(json: &str) -> Result<Identity, ClientError> {
    let wire: WireUser = serde_json::from_str(json).map_err(|e| ClientError::Parse(e.to_string()))?;
    Identity::try_from(wire)
}

fn parse_token(json: &str) -> Result<TokenGrant, ClientError> {
    let wire: WireToken = serde_json::from_str(json).map_err(|e| ClientError::Parse(e.to_string()))?;
    if wire.access_token.is_empty() {
        return Err(ClientError::Parse("empty access_token".into()));
    }
    let identity = Identity::try_from(wire.user)?;
    Ok(TokenGrant { credential: Credential::new(wire.access_token), identity })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
