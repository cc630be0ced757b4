//! File-backed [`TokenStore`].
//!
//! The pair is persisted as JSON at `<dir>/tokens.json`. Writes go to a
//! temporary sibling file that is then renamed over the target, so a
//! reader only ever sees the old pair or the new one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::store::{TOKENS_KEY, decode_pair, encode_pair};
use crate::{CredentialPair, StoreError, TokenStore};

/// A [`TokenStore`] that survives process restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Stores the pair at `<dir>/tokens.json`.
    ///
    /// The directory doesn't need to exist yet; it is created on the
    /// first save.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{TOKENS_KEY}.json")),
        }
    }

    /// Stores the pair at exactly `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the pair is persisted to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, content: &str) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let suffix: u64 = rand::rng().random();
        let tmp_path = dir.join(format!(".{TOKENS_KEY}.{suffix:016x}.tmp"));

        let result = (|| -> io::Result<()> {
            let mut file = open_private(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::io(&self.path, e));
        }
        Ok(())
    }
}

/// Opens a fresh file readable only by the current user.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(decode_pair(&raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 content is a malformed value, not a broken disk.
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(path = %self.path.display(), "stored credentials are not UTF-8, ignoring");
                Ok(None)
            }
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        let content = encode_pair(pair)?;
        self.write_atomically(&content)?;
        tracing::debug!(path = %self.path.display(), "credentials persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "credentials removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}
