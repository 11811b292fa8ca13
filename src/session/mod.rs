//! Session store: credential, identity, and the published session state.
//!
//! ARCHITECTURE
//! ============
//! `SessionStore` is the only writer of the held credential and of its
//! persisted copy. The outgoing `Authorization` header is derived from the
//! held credential on every call ([`SessionStore::bearer`]) instead of being
//! kept as a separate mutable default, so the two cannot diverge.
//!
//! ERROR HANDLING
//! ==============
//! `restore` absorbs every failure into `Anonymous`. `login` and `register`
//! return their error to the caller and leave the session untouched.
//! Nothing retries.

pub mod state;
pub mod storage;

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::ClientConfig;
use crate::net::api::{AuthApi, HttpAuthApi};
use crate::net::types::{ClientError, Credential, Identity, RegisterRequest, Role};
use state::SessionState;
use storage::{CredentialStorage, FileStorage};

pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn CredentialStorage>,
    credential: Option<Credential>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create a store in the `Loading` state. Call [`SessionStore::restore`]
    /// once before routing decisions are needed.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn CredentialStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self { api, storage, credential: None, state }
    }

    /// Store backed by the HTTP auth API and a credential file from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let api = HttpAuthApi::new(config)?;
        let storage = FileStorage::new(config.token_path.clone());
        Ok(Self::new(Arc::new(api), Arc::new(storage)))
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// `Authorization` header value for outgoing calls, present exactly when
    /// a credential is held.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.credential.as_ref().map(Credential::bearer)
    }

    /// Restore a persisted session at startup.
    ///
    /// Never fails: an absent, unreadable, expired, or otherwise unresolvable
    /// credential leaves the store `Anonymous` with storage cleared.
    pub async fn restore(&mut self) {
        let stored = match self.storage.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "credential storage unreadable; starting anonymous");
                self.drop_credential();
                return;
            }
        };

        let Some(credential) = stored else {
            self.credential = None;
            self.publish(SessionState::Anonymous);
            tracing::debug!("no stored credential");
            return;
        };

        self.credential = Some(credential.clone());
        self.publish(SessionState::Loading);

        match self.api.current_user(&credential).await {
            Ok(identity) => {
                tracing::info!(user_id = identity.id, role = %identity.role, "session restored");
                self.publish(SessionState::Authenticated(identity));
            }
            Err(e) => {
                let invalid = match e {
                    ClientError::SessionInvalid(_) => e,
                    other => ClientError::SessionInvalid(other.to_string()),
                };
                tracing::warn!(error = %invalid, "stored credential rejected; clearing session");
                self.drop_credential();
            }
        }
    }

    /// Exchange email and password for a credential and establish a session.
    ///
    /// # Errors
    ///
    /// Returns the auth API or storage error; the session is left unchanged.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Identity, ClientError> {
        let grant = self.api.issue_token(email, password).await.inspect_err(|e| {
            tracing::info!(error = %e, "login failed");
        })?;

        self.storage.save(&grant.credential)?;
        self.credential = Some(grant.credential);
        tracing::info!(user_id = grant.identity.id, role = %grant.identity.role, "logged in");
        self.publish(SessionState::Authenticated(grant.identity.clone()));
        Ok(grant.identity)
    }

    /// Create an account, then log in with the same credentials.
    ///
    /// # Errors
    ///
    /// Returns the registration error without touching the session, or any
    /// error from the follow-up [`SessionStore::login`].
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<Identity, ClientError> {
        let request = RegisterRequest {
            email: email.to_owned(),
            password: password.to_owned(),
            full_name: full_name.to_owned(),
            role,
        };
        self.api.register(&request).await.inspect_err(|e| {
            tracing::info!(error = %e, "registration failed");
        })?;
        tracing::info!(%role, "registered");
        self.login(email, password).await
    }

    /// End the session. Always leaves the store `Anonymous`.
    pub fn logout(&mut self) {
        self.drop_credential();
        tracing::info!("logged out");
    }

    /// Forget the credential in memory and in storage, then go `Anonymous`.
    fn drop_credential(&mut self) {
        self.credential = None;
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "failed to clear stored credential");
        }
        self.publish(SessionState::Anonymous);
    }

    fn publish(&self, next: SessionState) {
        self.state.send_replace(next);
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
