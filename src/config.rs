//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use crate::net::types::ClientError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const TOKEN_FILE_NAME: &str = "session.json";

/// Hosts that serve the API under `/api` even when the configured URL omits it.
const API_SUFFIX_HOSTS: [&str; 2] = ["onrender.com", "localhost:8000"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Normalized API base URL, never ending in `/`.
    pub api_url: String,
    /// File holding the persisted credential.
    pub token_path: PathBuf,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CLASSROOM_API_URL`: default `http://localhost:8000/api`
    /// - `CLASSROOM_TOKEN_PATH`: default `<data dir>/classroom/session.json`
    /// - `CLASSROOM_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CLASSROOM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the API URL is empty or no token
    /// path can be determined.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_env_with(|_| None)
    }

    /// Like [`ClientConfig::from_env`], but `overrides` wins for every key it
    /// answers. Overridden values go through the same validation.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_env_with<F>(overrides: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| overrides(key).or_else(|| std::env::var(key).ok()))
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("CLASSROOM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let api_url = normalize_api_url(&raw_url);
        if api_url.is_empty() {
            return Err(ClientError::Config("CLASSROOM_API_URL is empty".into()));
        }

        let token_path = match lookup("CLASSROOM_TOKEN_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_token_path()?,
        };

        let timeouts = Timeouts {
            request_secs: parse_secs(lookup("CLASSROOM_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_secs(lookup("CLASSROOM_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_url, token_path, timeouts })
    }
}

/// Normalize a configured API URL.
///
/// All trailing slashes are removed. A URL that does not already end in
/// `/api` gets the suffix appended when it points at a known API host.
#[must_use]
pub fn normalize_api_url(raw: &str) -> String {
    let mut url = raw.trim().trim_end_matches('/').to_owned();
    if !url.ends_with("/api") && API_SUFFIX_HOSTS.iter().any(|host| url.contains(host)) {
        url.push_str("/api");
    }
    url
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn parse_secs(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}

fn default_token_path() -> Result<PathBuf, ClientError> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| ClientError::Config("no data directory; set CLASSROOM_TOKEN_PATH".into()))?;
    Ok(base.join("classroom").join(TOKEN_FILE_NAME))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
