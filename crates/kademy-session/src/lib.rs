//! Session management for Kademy clients.
//!
//! [`SessionManager`] is the only writer of authentication state. It owns:
//! - the credential pair (in memory, mirrored to a [`TokenStore`](kademy_store::TokenStore))
//! - the confirmed [`Identity`], once fetched
//! - the refresh coordinator that recovers from an expired access token
//!
//! Requests are authenticated by the pure [`authorize`] function at dispatch
//! time. There is no shared default header to forget to clear.
//!
//! # Example
//!
//! ```rust,no_run
//! use kademy_session::{SessionConfig, SessionManager};
//! use kademy_store::MemoryTokenStore;
//! use kademy_transport::HttpBackend;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = HttpBackend::new("http://127.0.0.1:8000".parse()?)?;
//! let session = SessionManager::new(backend, MemoryTokenStore::new(), SessionConfig::default())?;
//!
//! let user = session.login("student@example.com", "password123").await?;
//! println!("hello, {}", user.display_name());
//!
//! let books: serde_json::Value = session.get_json("/api/v1/books/").await?;
//! println!("{books}");
//!
//! session.logout().await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod config;
mod error;
mod identity;
mod manager;
mod observer;
mod refresh;
mod session;

pub use auth::{AUTHORIZATION, authorize};
pub use config::{Endpoints, RefreshVariant, SessionConfig};
pub use error::{RefreshFailure, SessionError};
pub use identity::{
    Identity, PasswordChange, ProfileDetails, ProfileUpdate, RegistrationRequest, Role, UserId,
};
pub use manager::SessionManager;
pub use observer::{NoopObserver, Notice, NoticeLevel, Route, SessionObserver};
pub use session::SessionStatus;
