//! Application route table.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation target the client knows about, with the access rule the
//! guard applies to it. Paths parse leniently (trailing slash, query string)
//! and print canonically.

pub mod guard;

use std::fmt;

use crate::net::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    TeacherDashboard,
    StudentDashboard,
    Course(i64),
    Assignment(i64),
    /// Anything unmatched; resolved like [`Route::Root`].
    NotFound,
}

/// Who may view a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Pure redirect to the login page or the role home.
    Redirect,
    /// Login/registration pages: only without a session.
    AnonymousOnly,
    /// Any authenticated user.
    Authenticated,
    /// Authenticated users with exactly this role.
    Role(Role),
}

impl Route {
    /// Resolve a path such as `/course/12` or `/teacher/?tab=1`.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Self::Root,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["teacher"] => Self::TeacherDashboard,
            ["student"] => Self::StudentDashboard,
            ["course", id] => id.parse().map_or(Self::NotFound, Self::Course),
            ["assignment", id] => id.parse().map_or(Self::NotFound, Self::Assignment),
            _ => Self::NotFound,
        }
    }

    /// Canonical path. `NotFound` prints as `/`, where it resolves.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Root | Self::NotFound => "/".to_owned(),
            Self::Login => "/login".to_owned(),
            Self::Register => "/register".to_owned(),
            Self::TeacherDashboard => "/teacher".to_owned(),
            Self::StudentDashboard => "/student".to_owned(),
            Self::Course(id) => format!("/course/{id}"),
            Self::Assignment(id) => format!("/assignment/{id}"),
        }
    }

    /// Landing page for a signed-in user of `role`.
    #[must_use]
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Teacher => Self::TeacherDashboard,
            Role::Student => Self::StudentDashboard,
        }
    }

    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Self::Root | Self::NotFound => Access::Redirect,
            Self::Login | Self::Register => Access::AnonymousOnly,
            Self::TeacherDashboard => Access::Role(Role::Teacher),
            Self::StudentDashboard => Access::Role(Role::Student),
            Self::Course(_) | Self::Assignment(_) => Access::Authenticated,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
