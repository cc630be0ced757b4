//! Error types for the session layer.

use kademy_store::StoreError;
use kademy_transport::{ApiResponse, TransportError};
use serde_json::Value;

/// Errors that can occur during session management.
///
/// These cover the full lifecycle of an authenticated session: login,
/// authenticated requests, token refresh, and logout.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No response arrived from the backend.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The credential store failed to persist or clear the pair.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation needs a session and there is none (never logged in,
    /// or logged out while the operation was in flight).
    #[error("not authenticated")]
    NotAuthenticated,

    /// The backend rejected the access token and nothing more can be done
    /// for this request: either there was no session to refresh, or the
    /// request was already replayed once with a refreshed token.
    #[error("{}", unauthorized_text(.after_refresh, .message))]
    Unauthorized {
        after_refresh: bool,
        message: Option<String>,
    },

    /// The refresh exchange failed. The session has been cleared.
    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] RefreshFailure),

    /// The backend refused the operation (validation error, bad
    /// credentials, server error, or no response for a mutation).
    ///
    /// `message` is user-facing: the backend's own message when it sent
    /// one, otherwise a per-operation fallback. It is never empty.
    #[error("{message}")]
    Rejected {
        /// HTTP status, or `None` when no response arrived.
        status: Option<u16>,
        message: String,
        /// Per-field validation errors, when the backend reported them.
        fields: Option<Value>,
    },

    /// A 2xx response whose body didn't have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

fn unauthorized_text(after_refresh: &bool, message: &Option<String>) -> String {
    let base = if *after_refresh {
        "authorization failed after token refresh"
    } else {
        "authorization failed"
    };
    match message {
        Some(m) => format!("{base}: {m}"),
        None => base.to_string(),
    }
}

/// Why a refresh exchange didn't produce a new access token.
#[derive(Debug, thiserror::Error)]
pub enum RefreshFailure {
    /// The exchange request got no response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The refresh endpoint answered with a non-2xx status. A 401 here
    /// means the refresh token itself is invalid or expired.
    #[error("refresh endpoint returned {status}")]
    Rejected { status: u16 },

    /// The refresh endpoint answered 2xx without a usable access token.
    #[error("malformed refresh response: {0}")]
    Malformed(String),
}

impl SessionError {
    /// A message suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Rejected { message, .. } => message.clone(),
            SessionError::Unauthorized {
                message: Some(m), ..
            } => m.clone(),
            SessionError::Unauthorized { message: None, .. }
            | SessionError::NotAuthenticated => "Please log in to continue.".to_string(),
            SessionError::RefreshFailed(_) => {
                "Your session has expired. Please log in again.".to_string()
            }
            SessionError::Transport(_) => "Could not reach the server.".to_string(),
            SessionError::Store(_) => "Could not save your session on this device.".to_string(),
            SessionError::Decode(_) => "The server sent an unexpected response.".to_string(),
        }
    }

    /// Builds a [`SessionError::Rejected`] from a non-2xx response.
    pub fn rejected(response: &ApiResponse, fallback: &str) -> Self {
        let body = serde_json::from_slice::<Value>(&response.body).ok();
        let message = body
            .as_ref()
            .and_then(message_from_body)
            .unwrap_or_else(|| fallback.to_string());
        let fields = body
            .as_ref()
            .and_then(|b| b.get("fields"))
            .filter(|f| !f.is_null())
            .cloned();
        SessionError::Rejected {
            status: Some(response.status),
            message,
            fields,
        }
    }
}

/// Pulls a user-facing message out of a backend error body.
///
/// The backend's error envelope is `{code, message, fields}`; plain DRF
/// responses use `detail`, and serializer-level validation errors use
/// `non_field_errors`. They're tried in that order.
pub(crate) fn message_from_body(body: &Value) -> Option<String> {
    let non_empty = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);

    body.get("message")
        .and_then(non_empty)
        .or_else(|| body.get("detail").and_then(non_empty))
        .or_else(|| {
            body.get("non_field_errors")
                .and_then(|v| v.get(0))
                .and_then(non_empty)
        })
}

/// [`message_from_body`] for raw response bytes.
pub(crate) fn message_from_bytes(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(message_from_body)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_rejected_prefers_message_field() {
        let resp = ApiResponse::json_body(
            400,
            &json!({"code": 400, "message": "Invalid credentials", "fields": null}),
        );
        let err = SessionError::rejected(&resp, "Login failed");
        assert!(matches!(
            &err,
            SessionError::Rejected { status: Some(400), message, fields: None }
                if message == "Invalid credentials"
        ));
    }

    #[test]
    fn test_rejected_falls_back_to_detail_then_non_field_errors() {
        let detail = ApiResponse::json_body(403, &json!({"detail": "Forbidden"}));
        assert_eq!(SessionError::rejected(&detail, "x").user_message(), "Forbidden");

        let nfe = ApiResponse::json_body(400, &json!({"non_field_errors": ["Passwords don't match"]}));
        assert_eq!(
            SessionError::rejected(&nfe, "x").user_message(),
            "Passwords don't match"
        );
    }

    #[test]
    fn test_rejected_uses_fallback_for_empty_or_non_json_body() {
        let empty_message = ApiResponse::json_body(400, &json!({"message": ""}));
        assert_eq!(
            SessionError::rejected(&empty_message, "Login failed").user_message(),
            "Login failed"
        );

        let html = ApiResponse::new(502, "<html>Bad Gateway</html>");
        assert_eq!(
            SessionError::rejected(&html, "Login failed").user_message(),
            "Login failed"
        );
    }

    #[test]
    fn test_rejected_keeps_validation_fields() {
        let resp = ApiResponse::json_body(
            400,
            &json!({"code": 400, "message": "Validation error", "fields": {"email": ["Enter a valid email address."]}}),
        );
        match SessionError::rejected(&resp, "Registration failed") {
            SessionError::Rejected { fields: Some(fields), .. } => {
                assert_eq!(fields["email"][0], "Enter a valid email address.");
            }
            other => panic!("expected Rejected with fields, got {other:?}"),
        }
    }

    #[test]
    fn test_unauthorized_display_mentions_refresh() {
        let before = SessionError::Unauthorized {
            after_refresh: false,
            message: None,
        };
        let after = SessionError::Unauthorized {
            after_refresh: true,
            message: Some("Token is invalid".into()),
        };
        assert_eq!(before.to_string(), "authorization failed");
        assert_eq!(
            after.to_string(),
            "authorization failed after token refresh: Token is invalid"
        );
    }

    #[test]
    fn test_user_message_is_never_empty() {
        let errors = [
            SessionError::NotAuthenticated,
            SessionError::RefreshFailed(RefreshFailure::Rejected { status: 401 }),
            SessionError::Decode("bad".into()),
            SessionError::Unauthorized {
                after_refresh: true,
                message: None,
            },
        ];
        for err in errors {
            assert!(!err.user_message().is_empty(), "{err:?}");
        }
    }
}
