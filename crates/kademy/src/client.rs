//! `KademyClient` builder and the catalogue calls.
//!
//! This is the entry point for applications: it ties the layers together
//! (HTTP backend, token store, session manager) behind one handle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kademy_session::{SessionConfig, SessionManager, SessionObserver};
use kademy_store::{FileTokenStore, TokenStore};
use kademy_transport::HttpBackend;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{ClientConfig, KademyError, Resource};

/// Builder for a [`KademyClient`].
///
/// # Example
///
/// ```rust,no_run
/// use kademy::prelude::*;
///
/// # async fn run() -> Result<(), KademyError> {
/// let client = KademyClient::builder()
///     .config(ClientConfig::from_env()?)
///     .build()?;
///
/// client.session().login("student@example.com", "password123").await?;
/// let books = client.list(Resource::Books).await?;
/// println!("{books}");
/// # Ok(())
/// # }
/// ```
pub struct KademyClientBuilder {
    config: ClientConfig,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl KademyClientBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            observer: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: Url) -> Self {
        self.config.base_url = base_url;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Sets the directory [`build`](Self::build) keeps `tokens.json` in.
    pub fn token_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.token_dir = Some(dir.into());
        self
    }

    pub fn session_config(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Routes navigation requests and notifications to `observer`.
    pub fn observer(mut self, observer: impl SessionObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Builds a client persisting credentials in `store`.
    ///
    /// A pair already in the store is restored; call
    /// [`SessionManager::check_auth`] to confirm it.
    pub fn build_with_store<S: TokenStore>(self, store: S) -> Result<KademyClient<S>, KademyError> {
        let mut backend = HttpBackend::new(self.config.base_url.clone())?;
        if let Some(timeout) = self.config.request_timeout {
            backend = backend.with_timeout(timeout);
        }

        let mut session = SessionManager::new(backend, store, self.config.session)?;
        if let Some(observer) = self.observer {
            session = session.with_shared_observer(observer);
        }

        tracing::debug!(base_url = %self.config.base_url, "client ready");
        Ok(KademyClient { session })
    }

    /// Builds a client persisting credentials in `tokens.json` under the
    /// configured token directory, or the platform config directory.
    ///
    /// # Errors
    /// [`KademyError::Config`] if no token directory is configured and the
    /// platform has no config directory.
    pub fn build(self) -> Result<KademyClient<FileTokenStore>, KademyError> {
        let dir = match &self.config.token_dir {
            Some(dir) => dir.clone(),
            None => default_token_dir()?,
        };
        let store = FileTokenStore::in_dir(&dir);
        tracing::debug!(path = %store.path().display(), "using file token store");
        self.build_with_store(store)
    }
}

impl Default for KademyClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_token_dir() -> Result<PathBuf, KademyError> {
    dirs::config_dir()
        .map(|dir| dir.join("kademy"))
        .ok_or_else(|| KademyError::Config("no platform config directory for tokens".into()))
}

/// A Kademy API client.
///
/// Lifecycle operations (login, logout, profile) live on
/// [`session()`](Self::session); catalogue reads are methods here. Share
/// it across tasks with `Arc<KademyClient<_>>`.
pub struct KademyClient<S: TokenStore = FileTokenStore> {
    session: SessionManager<HttpBackend, S>,
}

impl KademyClient {
    pub fn builder() -> KademyClientBuilder {
        KademyClientBuilder::new()
    }
}

impl<S: TokenStore> KademyClient<S> {
    pub fn session(&self) -> &SessionManager<HttpBackend, S> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        self.session.backend().base_url()
    }

    /// Fetches a whole collection.
    pub async fn list(&self, resource: Resource) -> Result<serde_json::Value, KademyError> {
        self.list_as(resource).await
    }

    /// [`list`](Self::list), decoded into `T`.
    pub async fn list_as<T: DeserializeOwned>(&self, resource: Resource) -> Result<T, KademyError> {
        Ok(self.session.get_json(&resource.path()).await?)
    }

    /// Fetches one item of a collection.
    pub async fn get(
        &self,
        resource: Resource,
        id: impl std::fmt::Display,
    ) -> Result<serde_json::Value, KademyError> {
        Ok(self.session.get_json(&resource.item_path(id)).await?)
    }
}
