//! Classroom client core: authenticated session and role-based routing.
//!
//! ARCHITECTURE
//! ============
//! `session::SessionStore` owns the bearer credential and the resolved
//! identity, and publishes a single `SessionState` to observers.
//! `routes::guard` is a pure decision over that state for every navigation
//! target. `net` holds the REST wire types and the HTTP transports; nothing
//! outside `SessionStore` writes the credential or its persisted copy.

pub mod config;
pub mod net;
pub mod routes;
pub mod session;

pub use config::ClientConfig;
pub use net::types::{ClientError, Credential, Identity, Role};
pub use routes::Route;
pub use routes::guard::Outcome;
pub use session::SessionStore;
pub use session::state::SessionState;
