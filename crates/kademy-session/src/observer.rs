//! Navigation and notification hooks.
//!
//! The session layer decides *that* the user should be sent somewhere or
//! told something (login succeeded, session expired); the embedding
//! application decides *how*. It does so by implementing
//! [`SessionObserver`].

use std::fmt;

/// Where the session layer wants the user to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The public landing page. Target of every logout.
    PublicRoot,
    /// The login page. Target after registration.
    Login,
    /// The authenticated application root. Target after login, whatever
    /// the user's role.
    AppRoot,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::PublicRoot => "/",
            Route::Login => "/login",
            Route::AppRoot => "/app",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives navigation requests and notifications from the session layer.
///
/// Both methods default to doing nothing, so an implementation only
/// overrides what it cares about. They are synchronous and called
/// without any session lock held; implementations should hand the event
/// off (to a channel, a UI queue) rather than block.
pub trait SessionObserver: Send + Sync {
    /// The user should be shown `route`.
    fn navigate(&self, _route: Route) {}

    /// The user should see `notice`.
    fn notify(&self, _notice: &Notice) {}
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::PublicRoot.path(), "/");
        assert_eq!(Route::Login.path(), "/login");
        assert_eq!(Route::AppRoot.to_string(), "/app");
    }

    #[test]
    fn test_notice_constructors_set_level() {
        assert_eq!(Notice::success("ok").level, NoticeLevel::Success);
        assert_eq!(Notice::error("bad").level, NoticeLevel::Error);
    }
}
