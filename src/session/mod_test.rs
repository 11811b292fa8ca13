use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::*;
use crate::net::types::TokenGrant;
use storage::{FileStorage, MemoryStorage};

// =============================================================================
// FAKE AUTH API
// =============================================================================

#[derive(Default)]
struct FakeAuth {
    /// email -> (password, identity)
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    /// token -> identity
    sessions: Mutex<HashMap<String, Identity>>,
    me_calls: AtomicUsize,
    token_calls: AtomicUsize,
    offline: bool,
}

impl FakeAuth {
    fn with_account(self, password: &str, identity: Identity) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(identity.email.clone(), (password.to_owned(), identity));
        self
    }

    fn with_session(self, token: &str, identity: Identity) -> Self {
        self.sessions.lock().unwrap().insert(token.to_owned(), identity);
        self
    }

    fn offline() -> Self {
        Self { offline: true, ..Self::default() }
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn current_user(&self, credential: &Credential) -> Result<Identity, ClientError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(ClientError::Transport("connection refused".into()));
        }
        self.sessions
            .lock()
            .unwrap()
            .get(credential.as_str())
            .cloned()
            .ok_or_else(|| ClientError::SessionInvalid("status 401: Could not validate credentials".into()))
    }

    async fn issue_token(&self, email: &str, password: &str) -> Result<TokenGrant, ClientError> {
        let n = self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(ClientError::Transport("connection refused".into()));
        }
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some((expected, identity)) if expected == password => {
                let token = format!("tok-{}-{n}", identity.id);
                self.sessions.lock().unwrap().insert(token.clone(), identity.clone());
                Ok(TokenGrant { credential: Credential::new(token), identity: identity.clone() })
            }
            _ => Err(ClientError::AuthRejected { status: 401, detail: "Incorrect email or password".into() }),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&request.email) {
            return Err(ClientError::AuthRejected { status: 400, detail: "Email already registered".into() });
        }
        let id = i64::try_from(accounts.len()).unwrap() + 100;
        let identity = Identity {
            id,
            email: request.email.clone(),
            full_name: request.full_name.clone(),
            role: request.role,
        };
        accounts.insert(request.email.clone(), (request.password.clone(), identity));
        Ok(())
    }
}

fn teacher() -> Identity {
    Identity { id: 1, email: "t@school.test".into(), full_name: "Terry Teach".into(), role: Role::Teacher }
}

fn student() -> Identity {
    Identity { id: 2, email: "a@b.com".into(), full_name: "Sam Student".into(), role: Role::Student }
}

fn store(api: &Arc<FakeAuth>, storage: &Arc<MemoryStorage>) -> SessionStore {
    SessionStore::new(api.clone(), storage.clone())
}

// =============================================================================
// initial state
// =============================================================================

#[test]
fn new_store_is_loading_without_credential() {
    let store = store(&Arc::new(FakeAuth::default()), &Arc::new(MemoryStorage::new()));
    assert_eq!(store.state(), SessionState::Loading);
    assert_eq!(store.bearer(), None);
}

// =============================================================================
// restore
// =============================================================================

#[tokio::test]
async fn restore_without_stored_credential_is_anonymous_and_offline() {
    let api = Arc::new(FakeAuth::default());
    let mut store = store(&api, &Arc::new(MemoryStorage::new()));
    store.restore().await;
    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(api.me_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn restore_with_live_credential_authenticates() {
    let api = Arc::new(FakeAuth::default().with_session("live", teacher()));
    let storage = Arc::new(MemoryStorage::with_credential(Credential::new("live")));
    let mut store = store(&api, &storage);

    store.restore().await;

    assert_eq!(store.state(), SessionState::Authenticated(teacher()));
    assert_eq!(store.identity(), Some(teacher()));
    assert_eq!(store.bearer().as_deref(), Some("Bearer live"));
    assert_eq!(storage.load().unwrap(), Some(Credential::new("live")));
}

#[tokio::test]
async fn restore_with_expired_credential_clears_storage() {
    let api = Arc::new(FakeAuth::default());
    let storage = Arc::new(MemoryStorage::with_credential(Credential::new("expired")));
    let mut store = store(&api, &storage);

    store.restore().await;

    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(store.bearer(), None);
    assert_eq!(storage.load().unwrap(), None);
    assert_eq!(api.me_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn restore_is_idempotent_after_rejection() {
    let api = Arc::new(FakeAuth::default());
    let storage = Arc::new(MemoryStorage::with_credential(Credential::new("expired")));
    let mut store = store(&api, &storage);

    store.restore().await;
    store.restore().await;

    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(api.me_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn restore_absorbs_transport_failure() {
    let api = Arc::new(FakeAuth::offline());
    let storage = Arc::new(MemoryStorage::with_credential(Credential::new("whatever")));
    let mut store = store(&api, &storage);

    store.restore().await;

    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn restore_absorbs_unreadable_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    let api = Arc::new(FakeAuth::default());
    let mut store = SessionStore::new(api.clone(), Arc::new(FileStorage::new(&path)));
    store.restore().await;

    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(store.bearer(), None);
    assert!(!path.exists());
    assert_eq!(api.me_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn restore_publishes_loading_then_result() {
    let api = Arc::new(FakeAuth::default().with_session("live", student()));
    let storage = Arc::new(MemoryStorage::with_credential(Credential::new("live")));
    let mut store = store(&api, &storage);
    let mut rx = store.subscribe();

    store.restore().await;

    assert!(rx.has_changed().unwrap());
    assert_eq!(state::settled(&mut rx).await, SessionState::Authenticated(student()));
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_persists_and_authenticates() {
    let api = Arc::new(FakeAuth::default().with_account("pw", student()));
    let storage = Arc::new(MemoryStorage::new());
    let mut store = store(&api, &storage);
    store.restore().await;

    let identity = store.login("a@b.com", "pw").await.unwrap();

    assert_eq!(identity, student());
    assert_eq!(store.state(), SessionState::Authenticated(student()));
    let held = store.credential().cloned().unwrap();
    assert_eq!(storage.load().unwrap(), Some(held.clone()));
    assert_eq!(store.bearer(), Some(held.bearer()));
}

#[tokio::test]
async fn login_failure_propagates_and_leaves_state() {
    let api = Arc::new(FakeAuth::default().with_account("pw", student()));
    let storage = Arc::new(MemoryStorage::new());
    let mut store = store(&api, &storage);
    store.restore().await;

    let err = store.login("a@b.com", "wrong").await.unwrap_err();

    assert!(matches!(err, ClientError::AuthRejected { status: 401, .. }));
    assert_eq!(err.to_string(), "Incorrect email or password");
    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(store.bearer(), None);
    assert_eq!(storage.load().unwrap(), None);
}

#[tokio::test]
async fn login_failure_keeps_existing_session() {
    let api = Arc::new(FakeAuth::default().with_session("live", teacher()));
    let storage = Arc::new(MemoryStorage::with_credential(Credential::new("live")));
    let mut store = store(&api, &storage);
    store.restore().await;

    assert!(store.login("nobody@school.test", "pw").await.is_err());

    assert_eq!(store.state(), SessionState::Authenticated(teacher()));
    assert_eq!(store.bearer().as_deref(), Some("Bearer live"));
    assert_eq!(storage.load().unwrap(), Some(Credential::new("live")));
}

#[tokio::test]
async fn login_then_restore_round_trips_identity() {
    let api = Arc::new(FakeAuth::default().with_account("pw", student()));
    let storage = Arc::new(MemoryStorage::new());

    let mut first = store(&api, &storage);
    first.restore().await;
    let logged_in = first.login("a@b.com", "pw").await.unwrap();

    // Simulated reload: a fresh store over the same storage.
    let mut second = store(&api, &storage);
    second.restore().await;

    assert_eq!(second.state(), SessionState::Authenticated(logged_in));
    assert_eq!(second.bearer(), first.bearer());
}

#[tokio::test]
async fn second_login_replaces_credential() {
    let api = Arc::new(
        FakeAuth::default()
            .with_account("pw", student())
            .with_account("tpw", teacher()),
    );
    let storage = Arc::new(MemoryStorage::new());
    let mut store = store(&api, &storage);

    store.login("a@b.com", "pw").await.unwrap();
    store.login("t@school.test", "tpw").await.unwrap();

    assert_eq!(store.state(), SessionState::Authenticated(teacher()));
    assert_eq!(storage.load().unwrap().as_ref(), store.credential());
}

// =============================================================================
// register
// =============================================================================

#[tokio::test]
async fn register_then_logs_in() {
    let api = Arc::new(FakeAuth::default());
    let storage = Arc::new(MemoryStorage::new());
    let mut store = store(&api, &storage);
    store.restore().await;

    let identity = store
        .register("new@school.test", "pw", "New Teacher", Role::Teacher)
        .await
        .unwrap();

    assert_eq!(identity.email, "new@school.test");
    assert_eq!(identity.role, Role::Teacher);
    assert_eq!(store.state(), SessionState::Authenticated(identity));
    assert!(storage.load().unwrap().is_some());
    assert_eq!(api.token_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn register_failure_does_not_login() {
    let api = Arc::new(FakeAuth::default().with_account("pw", student()));
    let storage = Arc::new(MemoryStorage::new());
    let mut store = store(&api, &storage);
    store.restore().await;

    let err = store
        .register("a@b.com", "pw", "Dup", Role::Student)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Email already registered");
    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(api.token_calls.load(Ordering::SeqCst), 0);
    assert_eq!(storage.load().unwrap(), None);
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_clears_everything() {
    let api = Arc::new(FakeAuth::default().with_account("pw", student()));
    let storage = Arc::new(MemoryStorage::new());
    let mut store = store(&api, &storage);
    store.login("a@b.com", "pw").await.unwrap();

    store.logout();

    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(store.credential(), None);
    assert_eq!(store.bearer(), None);
    assert_eq!(storage.load().unwrap(), None);
}

#[test]
fn logout_from_any_state_is_anonymous() {
    let api = Arc::new(FakeAuth::default());
    let storage = Arc::new(MemoryStorage::with_credential(Credential::new("x")));
    let mut store = store(&api, &storage);
    assert_eq!(store.state(), SessionState::Loading);

    store.logout();
    store.logout();

    assert_eq!(store.state(), SessionState::Anonymous);
    assert_eq!(storage.load().unwrap(), None);
}
