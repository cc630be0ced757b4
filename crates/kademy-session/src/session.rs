//! Session state: what the client currently knows about the user.
//!
//! A session is the client's record of being logged in. It tracks:
//! - HOW requests are authenticated (the credential pair)
//! - WHO the user is (the identity, once fetched)

use kademy_store::CredentialPair;

use crate::Identity;

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// Internal authentication state.
///
/// ```text
///   Anonymous ──(login)──→ Credentialed { identity: Some }
///       ↑                        │  ↑
///       │              (401 on   │  │ (check_auth)
///       │            check_auth) ▼  │
///       └──(logout)──── Credentialed { identity: None }
/// ```
///
/// Identity lives *inside* the credentialed variant, so "an identity
/// without credentials" can't be represented.
#[derive(Debug, Clone, Default)]
pub(crate) enum AuthState {
    #[default]
    Anonymous,
    Credentialed {
        credentials: CredentialPair,
        identity: Option<Identity>,
    },
}

impl AuthState {
    pub(crate) fn credentials(&self) -> Option<&CredentialPair> {
        match self {
            AuthState::Anonymous => None,
            AuthState::Credentialed { credentials, .. } => Some(credentials),
        }
    }

    pub(crate) fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Anonymous => None,
            AuthState::Credentialed { identity, .. } => identity.as_ref(),
        }
    }

    pub(crate) fn status(&self) -> SessionStatus {
        match self {
            AuthState::Anonymous => SessionStatus::Anonymous,
            AuthState::Credentialed { identity: None, .. } => SessionStatus::Pending,
            AuthState::Credentialed {
                identity: Some(identity),
                ..
            } => SessionStatus::Authenticated(identity.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Public view of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// No credential pair. Requests go out without authorization.
    Anonymous,

    /// A credential pair exists but the identity hasn't been confirmed:
    /// right after restoring a stored pair, or after a profile fetch was
    /// rejected. The next request may still recover via refresh.
    Pending,

    /// Credentials plus a confirmed identity.
    Authenticated(Identity),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        serde_json::from_value(serde_json::json!({"email": "a@b.com"})).unwrap()
    }

    #[test]
    fn test_anonymous_has_neither_credentials_nor_identity() {
        let state = AuthState::Anonymous;
        assert!(state.credentials().is_none());
        assert!(state.identity().is_none());
        assert_eq!(state.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn test_credentialed_without_identity_is_pending() {
        let state = AuthState::Credentialed {
            credentials: CredentialPair::new("a", "r"),
            identity: None,
        };
        assert_eq!(state.credentials().map(|c| c.access.as_str()), Some("a"));
        assert_eq!(state.status(), SessionStatus::Pending);
    }

    #[test]
    fn test_credentialed_with_identity_is_authenticated() {
        let state = AuthState::Credentialed {
            credentials: CredentialPair::new("a", "r"),
            identity: Some(identity()),
        };
        assert_eq!(state.status(), SessionStatus::Authenticated(identity()));
    }
}
