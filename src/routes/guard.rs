//! Route guard: render, wait, or redirect for a navigation target.
//!
//! Pure functions of the session state, so every caller applies identical
//! redirect behavior and decisions are re-evaluated whenever the state
//! changes.

use super::{Access, Route};
use crate::net::types::Role;
use crate::session::state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Session is still being restored; show a placeholder and re-evaluate.
    Wait,
    Render,
    RedirectTo(Route),
}

/// Decide what to do when navigating to `route`.
#[must_use]
pub fn evaluate(state: &SessionState, route: Route) -> Outcome {
    match route.access() {
        Access::Redirect => resolve_root(state),
        Access::AnonymousOnly => anonymous_only(state),
        Access::Authenticated => protect(state, None),
        Access::Role(role) => protect(state, Some(role)),
    }
}

/// Gate a protected page, optionally restricted to one role.
///
/// A signed-in user with the wrong role is sent to their own home page.
#[must_use]
pub fn protect(state: &SessionState, required: Option<Role>) -> Outcome {
    match state {
        SessionState::Loading => Outcome::Wait,
        SessionState::Anonymous => Outcome::RedirectTo(Route::Login),
        SessionState::Authenticated(identity) => match required {
            Some(role) if role != identity.role => Outcome::RedirectTo(Route::home_for(identity.role)),
            _ => Outcome::Render,
        },
    }
}

/// Login and registration pages are only shown without a session.
fn anonymous_only(state: &SessionState) -> Outcome {
    match state {
        SessionState::Loading => Outcome::Wait,
        SessionState::Anonymous => Outcome::Render,
        SessionState::Authenticated(identity) => Outcome::RedirectTo(Route::home_for(identity.role)),
    }
}

fn resolve_root(state: &SessionState) -> Outcome {
    match state {
        SessionState::Loading => Outcome::Wait,
        SessionState::Anonymous => Outcome::RedirectTo(Route::Login),
        SessionState::Authenticated(identity) => Outcome::RedirectTo(Route::home_for(identity.role)),
    }
}

/// Follow redirects from `route` until a page renders or the state says wait.
///
/// Returns the route that ends up rendered alongside the final outcome.
/// Follows at most four redirects.
#[must_use]
pub fn resolve(state: &SessionState, route: Route) -> (Route, Outcome) {
    let mut current = route;
    for _ in 0..4 {
        match evaluate(state, current) {
            Outcome::RedirectTo(next) if next != current => current = next,
            outcome => return (current, outcome),
        }
    }
    (current, evaluate(state, current))
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
