//! The session manager: login, logout, and everything in between.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Restoring a persisted credential pair at startup
//! - Exchanging credentials for a pair (login) and creating accounts
//! - Confirming the user's identity against the profile endpoint
//! - Sending authenticated requests (with refresh, see `refresh.rs`)
//! - Clearing everything on logout
//!
//! # Concurrency note
//!
//! `SessionManager` is meant to be shared (`Arc<SessionManager<..>>`)
//! across tasks. The authentication state sits behind a
//! `tokio::sync::RwLock`, and every write to the [`TokenStore`] happens
//! while that lock is held for writing. That serializes writers and
//! keeps memory and disk in step: last writer wins, nobody sees half a
//! pair.
//!
//! Observer callbacks are always invoked after the lock is released.

use std::sync::Arc;

use kademy_store::{CredentialPair, TokenStore};
use kademy_transport::{ApiRequest, ApiResponse, Backend};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};

use crate::identity::LoginResponse;
use crate::observer::{Notice, Route};
use crate::session::AuthState;
use crate::{
    Identity, NoopObserver, PasswordChange, ProfileUpdate, RegistrationRequest, SessionConfig,
    SessionError, SessionObserver, SessionStatus, authorize,
};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const PROFILE_UPDATE_FAILED: &str = "Profile update failed";
const PASSWORD_CHANGE_FAILED: &str = "Password change failed";
const PASSWORD_RESET_FAILED: &str = "Password reset request failed";
const SESSION_CHECK_FAILED: &str = "Session check failed";
const REQUEST_FAILED: &str = "Request failed";

/// Owns the credential pair and everything derived from it.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ [Anonymous] ──login()──→ [Authenticated]
///   │                                   │      ▲
///   │ (stored pair)        check_auth() │      │ check_auth()
///   ▼                        gets 401   ▼      │
/// [Pending] ─────check_auth()────→ [Pending] ──┘
///
/// any state ──logout() / refresh failure──→ [Anonymous]
/// ```
pub struct SessionManager<B: Backend, S: TokenStore> {
    pub(crate) backend: B,
    pub(crate) store: S,
    pub(crate) config: SessionConfig,
    pub(crate) state: RwLock<AuthState>,
    /// Serializes refresh exchanges (see `refresh.rs`).
    pub(crate) refresh_gate: Mutex<()>,
    observer: Arc<dyn SessionObserver>,
}

impl<B: Backend, S: TokenStore> SessionManager<B, S> {
    /// Creates a manager, restoring any pair persisted in `store`.
    ///
    /// A restored session starts as [`SessionStatus::Pending`]; call
    /// [`check_auth`](Self::check_auth) to confirm the identity.
    ///
    /// # Errors
    /// Returns [`SessionError::Store`] if the store can't be read. A
    /// malformed stored value is not an error; it reads as "logged out".
    pub fn new(backend: B, store: S, config: SessionConfig) -> Result<Self, SessionError> {
        let state = match store.load()? {
            Some(credentials) => {
                tracing::debug!("restored stored credentials");
                AuthState::Credentialed {
                    credentials,
                    identity: None,
                }
            }
            None => AuthState::Anonymous,
        };

        Ok(Self {
            backend,
            store,
            config,
            state: RwLock::new(state),
            refresh_gate: Mutex::new(()),
            observer: Arc::new(NoopObserver),
        })
    }

    /// Routes navigation requests and notifications to `observer`.
    pub fn with_observer(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Like [`with_observer`](Self::with_observer), for an observer the
    /// caller also keeps a handle to.
    pub fn with_shared_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =====================================================================
    // State accessors
    // =====================================================================

    /// The current credential pair, if any.
    pub async fn credentials(&self) -> Option<CredentialPair> {
        self.state.read().await.credentials().cloned()
    }

    /// The confirmed identity, if any. Always `None` without credentials.
    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.identity().cloned()
    }

    /// `true` once the identity has been confirmed.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.identity().is_some()
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status()
    }

    // =====================================================================
    // Lifecycle
    // =====================================================================

    /// Exchanges email and password for a session.
    ///
    /// The request never carries the stored bearer token and never
    /// triggers a refresh, so a fully expired stored pair can't get in the
    /// way of a fresh login.
    ///
    /// On success the pair and identity are stored and the user is sent
    /// to [`Route::AppRoot`], whatever their role.
    ///
    /// # Errors
    /// [`SessionError::Rejected`] with the backend's message (or
    /// `"Login failed"`). Nothing is persisted on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let request = ApiRequest::post(self.config.endpoints.login.as_str())
            .with_json(json!({ "email": email, "password": password }));

        let response = self.submit_anonymous(request, LOGIN_FAILED).await?;
        let login: LoginResponse = match response.json() {
            Ok(login) => login,
            Err(e) => {
                tracing::warn!(error = %e, "login response had an unexpected shape");
                return Err(self.fail(SessionError::Decode(e.to_string()), LOGIN_FAILED));
            }
        };
        if login.tokens.access.is_empty() {
            return Err(self.fail(
                SessionError::Decode("empty access token".into()),
                LOGIN_FAILED,
            ));
        }

        {
            let mut state = self.state.write().await;
            self.store.save(&login.tokens)?;
            *state = AuthState::Credentialed {
                credentials: login.tokens,
                identity: Some(login.user.clone()),
            };
        }

        tracing::info!(email, role = ?login.user.role, "login succeeded");
        self.observer.notify(&Notice::success("Login successful!"));
        self.observer.navigate(Route::AppRoot);
        Ok(login.user)
    }

    /// Creates an account.
    ///
    /// No session is created, even if the backend hands back tokens: the
    /// user is sent to [`Route::Login`] to sign in explicitly.
    ///
    /// # Errors
    /// [`SessionError::Rejected`] with the backend's message (or
    /// `"Registration failed"`) and any per-field validation errors.
    pub async fn register(&self, profile: &RegistrationRequest) -> Result<(), SessionError> {
        let body = serde_json::to_value(profile)
            .map_err(|e| self.fail(SessionError::Decode(e.to_string()), REGISTRATION_FAILED))?;
        let request = ApiRequest::post(self.config.endpoints.register.as_str()).with_json(body);

        self.submit_anonymous(request, REGISTRATION_FAILED).await?;

        tracing::info!(email = %profile.email, "registration succeeded");
        self.observer
            .notify(&Notice::success("Registration successful! Please log in."));
        self.observer.navigate(Route::Login);
        Ok(())
    }

    /// Ends the session: clears the pair, the identity, and the store,
    /// and sends the user to [`Route::PublicRoot`].
    ///
    /// Safe to call any number of times. The "logged out" notice is only
    /// shown when there was a session to end.
    ///
    /// # Errors
    /// [`SessionError::Store`] if the store couldn't be cleared. The
    /// in-memory session is gone regardless.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.end_session(Notice::success("Logged out successfully"))
            .await
    }

    /// Logs out because the session can no longer be trusted, telling the
    /// user why instead of reporting a normal logout.
    pub(crate) async fn force_logout(&self, cause: &SessionError) {
        tracing::warn!(error = %cause, "ending session");
        if let Err(e) = self.end_session(Notice::error(cause.user_message())).await {
            tracing::error!(error = %e, "failed to clear stored credentials");
        }
    }

    /// Clears the session and navigates to [`Route::PublicRoot`]. `notice`
    /// is shown only if there was a session to clear.
    async fn end_session(&self, notice: Notice) -> Result<(), SessionError> {
        let (previous, cleared) = {
            let mut state = self.state.write().await;
            let previous = std::mem::take(&mut *state);
            (previous, self.store.clear())
        };

        let previous = previous.credentials().cloned();
        if let Some(pair) = &previous {
            if self.config.revoke_on_logout {
                self.revoke(pair).await;
            }
        }

        self.observer.navigate(Route::PublicRoot);
        if previous.is_some() {
            tracing::info!("logged out");
            self.observer.notify(&notice);
        }

        cleared.map_err(SessionError::from)
    }

    /// Confirms the identity behind the current credentials.
    ///
    /// # Returns
    /// - `Ok(Some(identity))`: profile fetched (possibly after a refresh).
    /// - `Ok(None)`: no session; or the profile fetch was rejected with
    ///   401, in which case the identity is cleared but the pair is kept
    ///   so a later request can still recover it; or the refresh failed
    ///   and the session has already been logged out.
    ///
    /// # Errors
    /// Any other failure (no response, 5xx, malformed profile) leaves the
    /// session in a state that can't be trusted, so it forces a logout
    /// and returns the error.
    pub async fn check_auth(&self) -> Result<Option<Identity>, SessionError> {
        if self.credentials().await.is_none() {
            return Ok(None);
        }

        let request = ApiRequest::get(self.config.endpoints.profile.as_str());
        let error = match self.send_authorized(request).await {
            Ok(response) if response.is_success() => match response.json::<Identity>() {
                Ok(identity) => {
                    self.set_identity(Some(identity.clone())).await;
                    tracing::debug!(email = %identity.email, "identity confirmed");
                    return Ok(Some(identity));
                }
                Err(e) => SessionError::Decode(e.to_string()),
            },
            Ok(response) => SessionError::rejected(&response, SESSION_CHECK_FAILED),
            Err(SessionError::Unauthorized { .. }) => {
                tracing::info!("profile fetch rejected, keeping credentials for a later refresh");
                self.set_identity(None).await;
                return Ok(None);
            }
            Err(SessionError::RefreshFailed(_) | SessionError::NotAuthenticated) => {
                return Ok(None);
            }
            Err(e) => e,
        };

        tracing::warn!("session check failed, logging out");
        self.force_logout(&error).await;
        Err(error)
    }

    /// Updates profile fields; on success the cached identity is replaced
    /// with the backend's updated copy.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, SessionError> {
        let body = serde_json::to_value(update)
            .map_err(|e| self.fail(SessionError::Decode(e.to_string()), PROFILE_UPDATE_FAILED))?;
        let request = ApiRequest::patch(self.config.endpoints.profile.as_str()).with_json(body);

        let response = self.mutate(request, PROFILE_UPDATE_FAILED).await?;
        let identity: Identity = response
            .json()
            .map_err(|e| self.fail(SessionError::Decode(e.to_string()), PROFILE_UPDATE_FAILED))?;

        self.set_identity(Some(identity.clone())).await;
        self.observer
            .notify(&Notice::success("Profile updated successfully"));
        Ok(identity)
    }

    /// Changes the password. Local state is untouched.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), SessionError> {
        let body = serde_json::to_value(change)
            .map_err(|e| self.fail(SessionError::Decode(e.to_string()), PASSWORD_CHANGE_FAILED))?;
        let request =
            ApiRequest::post(self.config.endpoints.change_password.as_str()).with_json(body);

        self.mutate(request, PASSWORD_CHANGE_FAILED).await?;

        self.observer
            .notify(&Notice::success("Password changed successfully"));
        Ok(())
    }

    /// Asks the backend to email a password reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), SessionError> {
        let request = ApiRequest::post(self.config.endpoints.forgot_password.as_str())
            .with_json(json!({ "email": email }));

        self.submit_anonymous(request, PASSWORD_RESET_FAILED).await?;

        self.observer
            .notify(&Notice::success("Password reset instructions sent"));
        Ok(())
    }

    // =====================================================================
    // Generic authenticated requests
    // =====================================================================

    /// Sends any request with the session's credentials.
    ///
    /// A 401 triggers one refresh-and-replay. If the replay is rejected
    /// as well, the session is logged out and
    /// [`SessionError::Unauthorized`] returned. Other error statuses come
    /// back as ordinary responses.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, SessionError> {
        match self.send_authorized(request).await {
            Err(
                error @ SessionError::Unauthorized {
                    after_refresh: true,
                    ..
                },
            ) => {
                self.force_logout(&error).await;
                Err(error)
            }
            other => other,
        }
    }

    /// `GET`s `path` and decodes a 2xx JSON body.
    ///
    /// # Errors
    /// Non-2xx responses become [`SessionError::Rejected`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SessionError> {
        let response = self.send(ApiRequest::get(path)).await?;
        if !response.is_success() {
            return Err(SessionError::rejected(&response, REQUEST_FAILED));
        }
        response
            .json()
            .map_err(|e| SessionError::Decode(e.to_string()))
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    /// Sends a user-initiated mutation and normalizes its failure.
    ///
    /// Any failure becomes [`SessionError::Rejected`] (with the backend's
    /// message when there is one) and is shown as an error notice. Store
    /// failures and refresh failures keep their own variants: they're not
    /// about this mutation.
    async fn mutate(
        &self,
        request: ApiRequest,
        fallback: &str,
    ) -> Result<ApiResponse, SessionError> {
        let outcome = self.send(request).await;
        self.settle(outcome, fallback)
    }

    /// [`mutate`](Self::mutate) for the credential endpoints (login,
    /// register, password reset): sent without a bearer header, straight
    /// to the backend. A 401 here is a plain rejection.
    async fn submit_anonymous(
        &self,
        request: ApiRequest,
        fallback: &str,
    ) -> Result<ApiResponse, SessionError> {
        let outcome = self
            .backend
            .execute(authorize(request, None))
            .await
            .map_err(SessionError::from);
        self.settle(outcome, fallback)
    }

    fn settle(
        &self,
        outcome: Result<ApiResponse, SessionError>,
        fallback: &str,
    ) -> Result<ApiResponse, SessionError> {
        match outcome {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(self.fail(SessionError::rejected(&response, fallback), fallback)),
            Err(e) => Err(self.fail(e, fallback)),
        }
    }

    /// Converts `error` into its user-facing form and shows it.
    ///
    /// A refresh failure was already shown by the forced logout.
    fn fail(&self, error: SessionError, fallback: &str) -> SessionError {
        let error = match error {
            e @ SessionError::RefreshFailed(_) => return e,
            e @ (SessionError::Rejected { .. } | SessionError::Store(_)) => e,
            SessionError::Unauthorized { message, .. } => SessionError::Rejected {
                status: Some(401),
                message: message.unwrap_or_else(|| fallback.to_string()),
                fields: None,
            },
            other => {
                tracing::warn!(error = %other, "{fallback}");
                SessionError::Rejected {
                    status: None,
                    message: fallback.to_string(),
                    fields: None,
                }
            }
        };
        self.observer.notify(&Notice::error(error.user_message()));
        error
    }

    /// Replaces the cached identity, if there is still a session.
    async fn set_identity(&self, next: Option<Identity>) {
        let mut state = self.state.write().await;
        if let AuthState::Credentialed { identity, .. } = &mut *state {
            *identity = next;
        }
    }

    /// Best-effort server-side revocation of `pair`'s refresh token.
    async fn revoke(&self, pair: &CredentialPair) {
        let request = ApiRequest::post(self.config.endpoints.logout.as_str())
            .with_json(json!({ "refresh": pair.refresh }));
        match self.backend.execute(authorize(request, Some(pair))).await {
            Ok(response) if response.is_success() => {
                tracing::debug!("refresh token revoked");
            }
            Ok(response) => {
                tracing::debug!(status = response.status, "refresh token revocation refused");
            }
            Err(e) => {
                tracing::debug!(error = %e, "refresh token revocation failed");
            }
        }
    }
}
