//! Transparent recovery from an expired access token.
//!
//! Every authenticated request runs inside [`SessionManager::with_auth_retry`]:
//!
//! ```text
//! Sent ──(2xx/4xx/5xx other than 401)──→ done
//!   │
//!   └─(401)─→ Failed-Auth ──(no session / already retried)──→ Unauthorized
//!                  │
//!                  ▼
//!             Refreshing ──(exchange fails)──→ forced logout, RefreshFailed
//!                  │
//!                  ▼
//!             Replayed ──→ done (a second 401 is final)
//! ```
//!
//! The "already retried" flag is a local variable of one
//! `with_auth_retry` call. Nothing is stored on the request, and nothing
//! is shared between calls except the credentials themselves.
//!
//! # Coalescing
//!
//! Refresh exchanges go through a single async gate. When several requests
//! fail with the same stale access token, the first one through the gate
//! performs the exchange; the rest find the access token already replaced
//! and replay with it. One expiry costs one exchange.

use std::future::Future;

use kademy_store::{CredentialPair, TokenStore};
use kademy_transport::{ApiRequest, ApiResponse, Backend, TransportError};
use serde_json::json;

use crate::error::message_from_bytes;
use crate::identity::RefreshResponse;
use crate::session::AuthState;
use crate::{RefreshFailure, SessionError, SessionManager, authorize};

impl<B: Backend, S: TokenStore> SessionManager<B, S> {
    /// Runs `issue` with the current credentials, refreshing and replaying
    /// once if the backend answers 401.
    ///
    /// `issue` receives the credentials to use for this attempt and
    /// returns the backend's response. It is called at most twice.
    ///
    /// # Returns
    /// - `Ok(response)`: any non-401 response, from the first attempt or
    ///   the replay. Other error statuses are for the caller to interpret.
    /// - `Err(Unauthorized { after_refresh: false })`: 401 with no
    ///   session to refresh.
    /// - `Err(Unauthorized { after_refresh: true })`: the replay was
    ///   rejected too. No second refresh is attempted.
    /// - `Err(RefreshFailed)`: the exchange failed; the session has
    ///   already been logged out.
    pub async fn with_auth_retry<F, Fut>(&self, issue: F) -> Result<ApiResponse, SessionError>
    where
        F: Fn(Option<CredentialPair>) -> Fut,
        Fut: Future<Output = Result<ApiResponse, TransportError>>,
    {
        let mut retried = false;

        loop {
            let credentials = self.credentials().await;
            let response = issue(credentials.clone()).await?;

            if !response.is_unauthorized() {
                return Ok(response);
            }

            let message = message_from_bytes(&response.body);
            let Some(stale) = credentials else {
                tracing::debug!("401 without a session, nothing to refresh");
                return Err(SessionError::Unauthorized {
                    after_refresh: false,
                    message,
                });
            };

            if retried {
                tracing::warn!("request rejected again after token refresh");
                return Err(SessionError::Unauthorized {
                    after_refresh: true,
                    message,
                });
            }

            retried = true;
            self.refresh_credentials(&stale).await?;
        }
    }

    /// [`with_auth_retry`](Self::with_auth_retry) for a plain request:
    /// each attempt sends `request` through [`authorize`].
    pub(crate) async fn send_authorized(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, SessionError> {
        let backend = &self.backend;
        self.with_auth_retry(move |credentials| {
            backend.execute(authorize(request.clone(), credentials.as_ref()))
        })
        .await
    }

    /// Replaces `stale` with a refreshed pair, or logs out.
    ///
    /// Returns the pair the caller should replay with.
    async fn refresh_credentials(
        &self,
        stale: &CredentialPair,
    ) -> Result<CredentialPair, SessionError> {
        let _gate = self.refresh_gate.lock().await;

        let Some(current) = self.credentials().await else {
            // Logged out while we waited for the gate.
            return Err(SessionError::NotAuthenticated);
        };

        if current.access != stale.access {
            tracing::debug!("access token already refreshed by a concurrent request");
            return Ok(current);
        }

        tracing::debug!("access token rejected, exchanging refresh token");

        match self.exchange_refresh_token(&current).await {
            Ok(next) => {
                let mut state = self.state.write().await;
                match &mut *state {
                    // Only install the new pair if the session we refreshed
                    // is still the current one. A logout (or a new login)
                    // during the exchange wins.
                    AuthState::Credentialed { credentials, .. } if *credentials == current => {
                        self.store.save(&next)?;
                        *credentials = next.clone();
                        tracing::info!(
                            rotated = next.refresh != current.refresh,
                            "access token refreshed"
                        );
                        Ok(next)
                    }
                    _ => {
                        tracing::debug!("session changed during refresh, discarding new token");
                        Err(SessionError::NotAuthenticated)
                    }
                }
            }
            Err(failure) => {
                let error = SessionError::RefreshFailed(failure);
                self.force_logout(&error).await;
                Err(error)
            }
        }
    }

    /// Trades the refresh token for a new access token.
    ///
    /// This goes straight to the backend: no bearer header and no retry.
    /// A 401 from the refresh endpoint is a plain failure, never another
    /// refresh.
    async fn exchange_refresh_token(
        &self,
        current: &CredentialPair,
    ) -> Result<CredentialPair, RefreshFailure> {
        let request = ApiRequest::post(self.config.endpoints.refresh.as_str())
            .with_json(json!({ "refresh": current.refresh }));

        let response = self.backend.execute(request).await?;
        if !response.is_success() {
            return Err(RefreshFailure::Rejected {
                status: response.status,
            });
        }

        let body: RefreshResponse = response
            .json()
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?;
        if body.access.is_empty() {
            return Err(RefreshFailure::Malformed("empty access token".into()));
        }

        Ok(current.rotated(body.access, body.refresh))
    }
}
