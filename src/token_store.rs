//! Single-slot bearer credential storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! Exactly one credential is active per profile. The API client reads it on
//! every request; only the session store writes it. Nothing here validates or
//! expires the token; it is an opaque string passed through unchanged.

#[cfg(test)]
#[path = "token_store_test.rs"]
mod token_store_test;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token write failed at {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("token remove failed at {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

/// Credential slot shared by the API client and the session store.
///
/// `set(None)` and `set(Some(""))` both remove the credential.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;

    /// Persist `token`, overwriting any previous value, or remove it when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage rejects the write or delete.
    fn set(&self, token: Option<&str>) -> Result<(), TokenStoreError>;
}

fn non_empty(token: Option<&str>) -> Option<&str> {
    token.filter(|t| !t.is_empty())
}

// =============================================================================
// FILE STORE
// =============================================================================

/// Durable store: one file holds the raw token. Survives process restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, token: &str) -> Result<(), TokenStoreError> {
        let wrap = |source| TokenStoreError::Write { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(wrap)?;
            }
        }

        // Write beside the target then rename, so a crash never leaves half a token.
        let tmp = self.path.with_extension("tmp");
        let written = write_private(&tmp, token).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(source) = written {
            match fs::remove_file(&tmp) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(error = %e, path = %tmp.display(), "stale token temp file left behind"),
            }
            return Err(wrap(source));
        }
        Ok(())
    }

    fn remove(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TokenStoreError::Remove { path: self.path.clone(), source }),
        }
    }
}

fn write_private(path: &Path, token: &str) -> io::Result<()> {
    let mut file = open_private(path)?;
    file.write_all(token.as_bytes())?;
    file.sync_all()
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() { None } else { Some(token.to_owned()) }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "token read failed; treating as logged out");
                None
            }
        }
    }

    fn set(&self, token: Option<&str>) -> Result<(), TokenStoreError> {
        match non_empty(token) {
            Some(token) => self.write(token),
            None => self.remove(),
        }
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self { slot: Mutex::new(non_empty(Some(token)).map(ToOwned::to_owned)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: Option<&str>) -> Result<(), TokenStoreError> {
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = non_empty(token).map(ToOwned::to_owned);
        Ok(())
    }
}
