//! The [`TokenStore`] trait and the in-memory implementation.
//!
//! The session layer doesn't care WHERE the pair lives; it just needs
//! something that can load, save, and clear it. Swapping the file store
//! for the memory store (tests, short-lived tools) changes nothing above
//! this layer.

use std::sync::Mutex;

use serde::Deserialize;

use crate::{CredentialPair, StoreError};

/// The single well-known key the pair is persisted under.
pub const TOKENS_KEY: &str = "tokens";

/// Durable persistence for a [`CredentialPair`].
///
/// ## Trait bounds
///
/// - `Send + Sync` → the session manager is shared across Tokio tasks,
///   and so is its store.
/// - `'static` → the store lives as long as the session manager.
///
/// The methods are synchronous: a token pair is a few hundred bytes and
/// every write happens while the session state lock is held, which is
/// what serializes writers.
pub trait TokenStore: Send + Sync + 'static {
    /// Returns the persisted pair.
    ///
    /// `Ok(None)` when nothing is stored *or* the stored value is not a
    /// well-formed pair. Only failures of the medium itself are errors.
    fn load(&self) -> Result<Option<CredentialPair>, StoreError>;

    /// Overwrites the persisted pair.
    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError>;

    /// Removes any persisted pair. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Loose shape used only for validation, so that a missing field and a
/// wrong type both land in the same "malformed" branch.
#[derive(Deserialize)]
struct StoredPair {
    access: String,
    refresh: String,
}

/// Parses a stored value into a pair, or `None` if it isn't one.
///
/// An empty access token is rejected as well: it could never
/// authenticate anything, and a bearer header of `Bearer ` would be worse
/// than no header at all.
pub fn decode_pair(raw: &str) -> Option<CredentialPair> {
    // A derived `Deserialize` also accepts a sequence (`["a","r"]`), so
    // only a JSON object is allowed through.
    let parsed = serde_json::from_str::<serde_json::Value>(raw).and_then(|value| {
        if value.is_object() {
            serde_json::from_value::<StoredPair>(value)
        } else {
            Err(serde::de::Error::custom("expected a JSON object"))
        }
    });
    match parsed {
        Ok(stored) if !stored.access.is_empty() => {
            Some(CredentialPair::new(stored.access, stored.refresh))
        }
        Ok(_) => {
            tracing::warn!(key = TOKENS_KEY, "stored credentials have an empty access token, ignoring");
            None
        }
        Err(e) => {
            tracing::warn!(key = TOKENS_KEY, error = %e, "stored credentials are malformed, ignoring");
            None
        }
    }
}

pub(crate) fn encode_pair(pair: &CredentialPair) -> Result<String, StoreError> {
    serde_json::to_string(pair).map_err(StoreError::Encode)
}

// ---------------------------------------------------------------------------
// MemoryTokenStore
// ---------------------------------------------------------------------------

/// A [`TokenStore`] that keeps the serialized pair in memory.
///
/// It stores the *serialized* text rather than the struct so that `load`
/// goes through the same validation as the file store. That also lets
/// tests seed garbage with [`with_raw`](Self::with_raw).
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `pair`.
    ///
    /// If the pair can't be encoded the store starts empty and a warning
    /// is logged.
    pub fn with_pair(pair: &CredentialPair) -> Self {
        let raw = match encode_pair(pair) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!(key = TOKENS_KEY, error = %e, "could not encode seed credentials, starting empty");
                None
            }
        };
        Self {
            slot: Mutex::new(raw),
        }
    }

    /// Creates a store holding arbitrary text under the tokens key.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    /// Returns the raw stored text, if any.
    pub fn raw(&self) -> Option<String> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A panic while holding this lock can't leave the slot half
        // written (it's a single assignment), so poisoning is ignored.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        Ok(self.slot().as_deref().and_then(decode_pair))
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        let raw = encode_pair(pair)?;
        *self.slot() = Some(raw);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> CredentialPair {
        CredentialPair::new("access-1", "refresh-1")
    }

    #[test]
    fn test_load_empty_store_returns_none() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load_returns_saved_pair() {
        let store = MemoryTokenStore::new();
        store.save(&pair()).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair()));
    }

    #[test]
    fn test_save_overwrites_previous_pair() {
        let store = MemoryTokenStore::with_pair(&pair());
        let next = CredentialPair::new("access-2", "refresh-2");
        store.save(&next).unwrap();
        assert_eq!(store.load().unwrap(), Some(next));
    }

    #[test]
    fn test_clear_then_load_returns_none() {
        let store = MemoryTokenStore::with_pair(&pair());
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_load_malformed_json_returns_none() {
        let store = MemoryTokenStore::with_raw("{not json");
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_load_wrong_shape_returns_none() {
        for raw in [
            r#"{"access":"a"}"#,
            r#"{"access":1,"refresh":"r"}"#,
            r#"["a","r"]"#,
            r#"null"#,
        ] {
            let store = MemoryTokenStore::with_raw(raw);
            assert_eq!(store.load().unwrap(), None, "raw = {raw}");
        }
    }

    #[test]
    fn test_with_pair_seeds_encoded_pair() {
        let store = MemoryTokenStore::with_pair(&pair());
        assert_eq!(store.raw(), encode_pair(&pair()).ok());
        assert_eq!(store.load().unwrap(), Some(pair()));
    }

    #[test]
    fn test_decode_pair_rejects_sequence_shape() {
        assert_eq!(decode_pair(r#"["a","r"]"#), None);
        assert_eq!(
            decode_pair(r#"{"access":"a","refresh":"r"}"#),
            Some(CredentialPair::new("a", "r"))
        );
    }

    #[test]
    fn test_decode_pair_rejects_empty_access() {
        assert_eq!(decode_pair(r#"{"access":"","refresh":"r"}"#), None);
    }

    #[test]
    fn test_decode_pair_ignores_extra_fields() {
        let decoded = decode_pair(r#"{"access":"a","refresh":"r","user":{}}"#);
        assert_eq!(decoded, Some(CredentialPair::new("a", "r")));
    }

    #[test]
    fn test_raw_is_json_object_with_both_tokens() {
        let store = MemoryTokenStore::with_pair(&pair());
        let raw = store.raw().expect("pair was stored");
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["access"], "access-1");
        assert_eq!(value["refresh"], "refresh-1");
    }
}
