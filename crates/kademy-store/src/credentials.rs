//! The credential pair: the only durable state the client owns.
//!
//! A pair is created by a successful login, replaced wholesale by a
//! refresh, and destroyed by logout (or by a refresh that cannot be
//! recovered from).

use std::fmt;

use serde::{Deserialize, Serialize};

/// An access/refresh token pair.
///
/// Both tokens are opaque strings as far as the client is concerned:
/// they are never parsed, only forwarded.
///
/// The wire/storage shape is `{"access": "...", "refresh": "..."}`, the
/// same shape the login endpoint returns under `tokens`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Short-lived token attached to every authenticated request.
    pub access: String,

    /// Longer-lived token used only to mint new access tokens.
    pub refresh: String,
}

impl CredentialPair {
    /// Creates a pair from its two tokens.
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// The value for an `Authorization` header: `Bearer <access>`.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access)
    }

    /// Returns a pair with a new access token and the same refresh token.
    pub fn with_access(&self, access: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: self.refresh.clone(),
        }
    }

    /// Builds the pair that follows a refresh exchange.
    ///
    /// If the exchange handed back a (non-empty) refresh token, it replaces
    /// the old one. Otherwise the current refresh token is retained.
    pub fn rotated(&self, access: impl Into<String>, refresh: Option<String>) -> Self {
        match refresh.filter(|r| !r.is_empty()) {
            Some(refresh) => Self::new(access, refresh),
            None => self.with_access(access),
        }
    }
}

/// Tokens are secrets, so `Debug` prints only their lengths. This keeps
/// `tracing::debug!(?pair)` and panic messages from leaking them.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &format_args!("<{} bytes>", self.access.len()))
            .field("refresh", &format_args!("<{} bytes>", self.refresh.len()))
            .finish()
    }
}
