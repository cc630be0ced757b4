//! Session configuration: endpoint paths and logout behavior.

// ---------------------------------------------------------------------------
// RefreshVariant
// ---------------------------------------------------------------------------

/// Which refresh endpoint the backend exposes.
///
/// Deployments have shipped both paths; they accept the same
/// `{"refresh": ...}` body and return the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshVariant {
    /// `/api/v1/auth/refresh/`
    #[default]
    Refresh,
    /// `/api/v1/auth/token/refresh/`
    TokenRefresh,
}

impl RefreshVariant {
    pub fn path(self) -> &'static str {
        match self {
            RefreshVariant::Refresh => "/api/v1/auth/refresh/",
            RefreshVariant::TokenRefresh => "/api/v1/auth/token/refresh/",
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Paths of the authentication endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub register: String,
    pub login: String,
    /// Server-side refresh token revocation. Only used when
    /// [`SessionConfig::revoke_on_logout`] is set.
    pub logout: String,
    pub refresh: String,
    pub profile: String,
    pub change_password: String,
    pub forgot_password: String,
}

impl Endpoints {
    /// Switches the refresh path to the given variant.
    pub fn with_refresh_variant(mut self, variant: RefreshVariant) -> Self {
        self.refresh = variant.path().to_string();
        self
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            register: "/api/v1/auth/register/".into(),
            login: "/api/v1/auth/login/".into(),
            logout: "/api/v1/auth/logout/".into(),
            refresh: RefreshVariant::default().path().into(),
            profile: "/api/v1/auth/profile/".into(),
            change_password: "/api/v1/auth/change-password/".into(),
            forgot_password: "/api/v1/auth/forgot-password/".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub endpoints: Endpoints,

    /// When set, logout first asks the backend to revoke the refresh
    /// token. Failure to revoke never blocks the local logout.
    ///
    /// Default: `false` (logout is purely client-side).
    pub revoke_on_logout: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints_match_backend_routes() {
        let e = Endpoints::default();
        assert_eq!(e.login, "/api/v1/auth/login/");
        assert_eq!(e.refresh, "/api/v1/auth/refresh/");
        assert_eq!(e.profile, "/api/v1/auth/profile/");
        assert_eq!(e.change_password, "/api/v1/auth/change-password/");
    }

    #[test]
    fn test_with_refresh_variant_switches_only_refresh_path() {
        let e = Endpoints::default().with_refresh_variant(RefreshVariant::TokenRefresh);
        assert_eq!(e.refresh, "/api/v1/auth/token/refresh/");
        assert_eq!(e.login, Endpoints::default().login);
    }

    #[test]
    fn test_default_config_does_not_revoke_on_logout() {
        assert!(!SessionConfig::default().revoke_on_logout);
    }
}
