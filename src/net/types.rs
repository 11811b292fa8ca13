//! Wire types and errors for the classroom REST API.
//!
//! DESIGN
//! ======
//! `Identity` is never built from local input: it only comes out of
//! [`Identity::try_from`] on a server payload, which is where unknown role
//! strings are rejected. Everything downstream can then match on a closed
//! [`Role`] enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by session and REST operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server could not be reached, or the call timed out.
    #[error("request failed: {0}")]
    Transport(String),

    /// The token or register endpoint answered with a non-success status.
    #[error("{detail}")]
    AuthRejected { status: u16, detail: String },

    /// A stored credential no longer resolves to an identity.
    #[error("stored session is no longer valid: {0}")]
    SessionInvalid(String),

    /// Any other endpoint answered with a non-success status.
    #[error("API error (status {status}): {detail}")]
    Api { status: u16, detail: String },

    /// A response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The server reported a role this client does not know.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// An authenticated call was attempted without a credential.
    #[error("not logged in")]
    NotAuthenticated,

    /// Reading or writing the persisted credential failed.
    #[error("credential storage failed: {0}")]
    Storage(String),

    /// A configuration value was missing or invalid.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ClientError {
    /// `true` when the failure happened before any response was received.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// HTTP status carried by a rejection, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthRejected { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extract a human-readable message from an error response body.
///
/// The API reports errors as `{"detail": "..."}`; validation failures carry
/// a list of `{"msg": "..."}` entries instead. Anything else falls back to
/// the raw body, or to the bare status when the body is empty.
#[must_use]
pub fn error_detail(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(serde_json::Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                    .collect();
                if !msgs.is_empty() {
                    return msgs.join("; ");
                }
            }
            _ => {}
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("request failed with status {status}")
    } else {
        trimmed.to_owned()
    }
}

// =============================================================================
// CREDENTIAL
// =============================================================================

/// Opaque bearer token identifying a session.
///
/// `Debug` redacts the value so credentials never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

// =============================================================================
// ROLE & IDENTITY
// =============================================================================

/// The two account roles the classroom API issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ClientError;

    /// Exact match only: `"Teacher"` is not a role.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(ClientError::UnknownRole(other.to_owned())),
        }
    }
}

/// Resolved user profile for a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// User payload as the server sends it, before role validation.
#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

impl TryFrom<WireUser> for Identity {
    type Error = ClientError;

    fn try_from(wire: WireUser) -> Result<Self, Self::Error> {
        let role = wire.role.parse::<Role>()?;
        Ok(Self { id: wire.id, email: wire.email, full_name: wire.full_name, role })
    }
}

/// Successful `POST /auth/token` result.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub credential: Credential,
    pub identity: Identity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireToken {
    pub access_token: String,
    pub user: WireUser,
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

// =============================================================================
// CLASSROOM RESOURCES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub teacher_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub subject: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentStatus {
    pub enrolled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub max_score: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAssignment {
    pub course_id: i64,
    pub title: String,
    pub description: String,
    /// ISO-8601 timestamp.
    pub due_date: String,
    pub max_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: String,
    pub submitted_at: String,
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSubmission {
    pub assignment_id: i64,
    pub content: String,
}

/// Server-computed study guidance for the current student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRecommendations {
    pub recommendations: Vec<String>,
    pub learning_path: String,
    pub performance_score: f64,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
