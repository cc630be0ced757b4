//! Error types for the store layer.
//!
//! Each Kademy crate defines its own error enum. A `StoreError` always
//! means the storage medium misbehaved; a malformed stored value is not
//! an error at all (it reads back as "absent").

use std::path::PathBuf;

/// Errors that can occur while persisting credentials.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading, writing, or removing the backing file failed.
    ///
    /// The path is kept so log lines point at the exact file, which
    /// matters when the token directory comes from configuration.
    #[error("token store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the pair failed.
    ///
    /// With two `String` fields this is practically unreachable, but
    /// `serde_json::to_string` is fallible, so the variant exists rather
    /// than an `expect`.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
