//! Unified error type for the Kademy client.

use kademy_session::SessionError;
use kademy_store::StoreError;
use kademy_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors, so code
/// using the `kademy` crate only deals with this one type.
#[derive(Debug, thiserror::Error)]
pub enum KademyError {
    /// No response from the backend, or the HTTP client couldn't be built.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The credential store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Login, refresh, or an authenticated request failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Invalid client configuration (bad base URL, no token directory).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl KademyError {
    /// A message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            KademyError::Session(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
