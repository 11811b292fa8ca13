//! Authenticated course, assignment, submission, and recommendation calls.
//!
//! Every call takes the `SessionStore` explicitly and attaches its bearer
//! header; with no credential held the call fails with
//! [`ClientError::NotAuthenticated`] before touching the network.

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{
    AiRecommendations, Assignment, ClientError, Course, EnrollmentStatus, NewAssignment, NewCourse, NewSubmission,
    Submission, error_detail,
};
use super::{build_http_client, is_success, send_for_text};
use crate::config::{ClientConfig, join_url};
use crate::session::SessionStore;

/// REST client for the classroom resources.
///
/// Errors shared by every call: [`ClientError::NotAuthenticated`] without a
/// credential, [`ClientError::Transport`] when the server is unreachable or
/// times out, [`ClientError::Api`] on a non-2xx status, and
/// [`ClientError::Parse`] on an unexpected body.
pub struct ClassroomClient {
    http: reqwest::Client,
    api_url: String,
}

#[derive(serde::Deserialize)]
struct MessageResponse {
    message: Option<String>,
}

impl ClassroomClient {
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = build_http_client(config.timeouts)?;
        Ok(Self::with_client(http, config.api_url.clone()))
    }

    #[must_use]
    pub fn with_client(http: reqwest::Client, api_url: String) -> Self {
        Self { http, api_url }
    }

    // =========================================================================
    // COURSES
    // =========================================================================

    /// Courses the current user teaches or is enrolled in.
    ///
    /// # Errors
    ///
    /// See [`ClassroomClient`] for the shared error contract.
    pub async fn courses(&self, session: &SessionStore) -> Result<Vec<Course>, ClientError> {
        self.call(session, Method::GET, "/courses", None::<&()>).await
    }

    /// Every course, for students browsing to enroll.
    ///
    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn browse_courses(&self, session: &SessionStore) -> Result<Vec<Course>, ClientError> {
        self.call(session, Method::GET, "/courses/browse", None::<&()>).await
    }

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn course(&self, session: &SessionStore, id: i64) -> Result<Course, ClientError> {
        self.call(session, Method::GET, &format!("/courses/{id}"), None::<&()>).await
    }

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn enrollment_status(&self, session: &SessionStore, course_id: i64) -> Result<bool, ClientError> {
        let path = format!("/courses/{course_id}/enrollment-status");
        let status: EnrollmentStatus = self.call(session, Method::GET, &path, None::<&()>).await?;
        Ok(status.enrolled)
    }

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn create_course(&self, session: &SessionStore, course: &NewCourse) -> Result<Course, ClientError> {
        self.call(session, Method::POST, "/courses", Some(course)).await
    }

    /// Enroll the current student; returns the server's confirmation message.
    ///
    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn enroll(&self, session: &SessionStore, course_id: i64) -> Result<Option<String>, ClientError> {
        let path = format!("/courses/{course_id}/enroll");
        let response: MessageResponse = self.call(session, Method::POST, &path, None::<&()>).await?;
        Ok(response.message)
    }

    // =========================================================================
    // ASSIGNMENTS
    // =========================================================================

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn assignment(&self, session: &SessionStore, id: i64) -> Result<Assignment, ClientError> {
        self.call(session, Method::GET, &format!("/assignments/{id}"), None::<&()>).await
    }

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn assignments(&self, session: &SessionStore, course_id: i64) -> Result<Vec<Assignment>, ClientError> {
        let path = format!("/assignments/course/{course_id}");
        self.call(session, Method::GET, &path, None::<&()>).await
    }

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn create_assignment(
        &self,
        session: &SessionStore,
        assignment: &NewAssignment,
    ) -> Result<Assignment, ClientError> {
        self.call(session, Method::POST, "/assignments", Some(assignment)).await
    }

    // =========================================================================
    // SUBMISSIONS
    // =========================================================================

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn submissions(&self, session: &SessionStore, assignment_id: i64) -> Result<Vec<Submission>, ClientError> {
        let path = format!("/submissions/assignment/{assignment_id}");
        self.call(session, Method::GET, &path, None::<&()>).await
    }

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn submit(&self, session: &SessionStore, submission: &NewSubmission) -> Result<Submission, ClientError> {
        self.call(session, Method::POST, "/submissions", Some(submission)).await
    }

    // =========================================================================
    // AI
    // =========================================================================

    /// # Errors
    ///
    /// See [`ClassroomClient`].
    pub async fn recommendations(&self, session: &SessionStore) -> Result<AiRecommendations, ClientError> {
        self.call(session, Method::GET, "/ai/recommendations", None::<&()>).await
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    async fn call<B, T>(&self, session: &SessionStore, method: Method, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bearer = session.bearer().ok_or(ClientError::NotAuthenticated)?;
        tracing::debug!(%method, path, "api request");

        let request = self
            .http
            .request(method, join_url(&self.api_url, path))
            .header(AUTHORIZATION, bearer);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let (status, text) = send_for_text(request).await?;
        if !is_success(status) {
            tracing::debug!(status, path, "api request rejected");
            return Err(ClientError::Api { status, detail: error_detail(status, &text) });
        }
        parse_body(&text)
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ClientError> {
    serde_json::from_str(text).map_err(|e| ClientError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "classroom_test.rs"]
mod tests;
