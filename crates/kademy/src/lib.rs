//! # Kademy
//!
//! Client library for the Kademy learning platform API.
//!
//! Kademy keeps a user logged in against the backend's token API: it
//! stores the access/refresh pair, attaches the bearer token to every
//! request, refreshes an expired access token transparently (once per
//! expiry, however many requests hit it), and logs out when the refresh
//! token is no longer accepted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kademy::prelude::*;
//!
//! # async fn run() -> Result<(), KademyError> {
//! let client = KademyClient::builder().build()?;
//!
//! if client.session().check_auth().await?.is_none() {
//!     client.session().login("student@example.com", "password123").await?;
//! }
//! let quizzes = client.list(Resource::Quizzes).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod resource;

pub use client::{KademyClient, KademyClientBuilder};
pub use config::{API_URL_ENV, ClientConfig, DEFAULT_API_URL};
pub use error::KademyError;
pub use resource::{Resource, UnknownResource};

pub use kademy_session as session;
pub use kademy_store as store;
pub use kademy_transport as transport;

/// Convenient imports for applications.
pub mod prelude {
    pub use crate::{ClientConfig, KademyClient, KademyClientBuilder, KademyError, Resource};
    pub use kademy_session::{
        Identity, Notice, NoticeLevel, PasswordChange, ProfileUpdate, RegistrationRequest, Role,
        Route, SessionConfig, SessionError, SessionManager, SessionObserver, SessionStatus,
    };
    pub use kademy_store::{CredentialPair, FileTokenStore, MemoryTokenStore, TokenStore};
}
