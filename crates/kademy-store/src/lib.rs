//! Credential storage for Kademy.
//!
//! This crate owns the one piece of durable client state: the
//! access/refresh token pair.
//!
//! - **Types** ([`CredentialPair`]): the pair itself and the helpers used
//!   when a refresh replaces part of it.
//! - **Stores** ([`TokenStore`] trait, [`MemoryTokenStore`],
//!   [`FileTokenStore`]): where the pair lives between runs.
//! - **Errors** ([`StoreError`]): what can go wrong while persisting.
//!
//! # Architecture
//!
//! The store sits at the bottom of the session stack. It never talks to
//! the network; the session layer decides *when* to save or clear, the
//! store only decides *how*.
//!
//! ```text
//! Session (lifecycle, refresh) → Store (load / save / clear) → disk
//! ```
//!
//! Absence of a stored pair means "logged out". A stored value that is not
//! well-formed is treated the same way: it is logged and ignored rather
//! than surfaced as an error.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod credentials;
mod error;
mod file;
mod store;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use credentials::CredentialPair;
pub use error::StoreError;
pub use file::FileTokenStore;
pub use store::{MemoryTokenStore, TOKENS_KEY, TokenStore, decode_pair};
