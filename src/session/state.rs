//! Session state observed by route guards and identity-aware callers.
//!
//! SYSTEM CONTEXT
//! ==============
//! A single tagged variant replaces separate `loading` / `user` flags, so a
//! loading session can never also carry a user.

use tokio::sync::watch;

use crate::net::types::{Identity, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// A stored credential is being resolved; routing must wait.
    Loading,
    /// No credential is held.
    Anonymous,
    /// The held credential resolved to this identity.
    Authenticated(Identity),
}

impl SessionState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Loading | Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }
}

/// Wait until the observed state leaves `Loading` and return it.
///
/// If the session store is dropped mid-restore the last published state is
/// returned as-is.
pub async fn settled(rx: &mut watch::Receiver<SessionState>) -> SessionState {
    let result = rx.wait_for(|state| !state.is_loading()).await.map(|state| state.clone());
    match result {
        Ok(state) => state,
        Err(_) => rx.borrow().clone(),
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
