//! Durable credential storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! The persisted layout is a small JSON key/value document with the
//! credential under [`TOKEN_KEY`]. A missing file or missing key both mean
//! "no session". Only `SessionStore` writes through this trait.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::net::types::{ClientError, Credential};

/// Fixed key the credential is stored under.
pub const TOKEN_KEY: &str = "token";

pub trait CredentialStorage: Send + Sync {
    /// Read the persisted credential, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the backing store is unreadable.
    fn load(&self) -> Result<Option<Credential>, ClientError>;

    /// Persist `credential`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the write fails.
    fn save(&self, credential: &Credential) -> Result<(), ClientError>;

    /// Remove the persisted credential. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the removal fails.
    fn clear(&self) -> Result<(), ClientError>;
}

// =============================================================================
// FILE STORAGE
// =============================================================================

/// JSON document on disk. Writes go to a sibling temp file then rename.
///
/// On unix the file is created owner-only (`0600`).
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

type Document = BTreeMap<String, String>;

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, ClientError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(storage_error(&self.path, &e)),
        };
        if raw.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&raw).map_err(|e| storage_error(&self.path, &e))
    }

    fn write_document(&self, doc: &Document) -> Result<(), ClientError> {
        if doc.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(storage_error(&self.path, &e)),
            };
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, &e))?;
        }
        let raw = serde_json::to_string_pretty(doc).map_err(|e| storage_error(&self.path, &e))?;
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, raw.as_bytes()).map_err(|e| storage_error(&tmp, &e))?;
        fs::rename(&tmp, &self.path).map_err(|e| storage_error(&self.path, &e))
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> Result<Option<Credential>, ClientError> {
        let doc = self.read_document()?;
        Ok(doc.get(TOKEN_KEY).filter(|token| !token.is_empty()).map(Credential::new))
    }

    fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        // An unreadable document is replaced rather than blocking login.
        let mut doc = self.read_document().unwrap_or_default();
        doc.insert(TOKEN_KEY.to_owned(), credential.as_str().to_owned());
        self.write_document(&doc)
    }

    fn clear(&self) -> Result<(), ClientError> {
        let mut doc = self.read_document().unwrap_or_default();
        doc.remove(TOKEN_KEY);
        self.write_document(&doc)
    }
}

/// Write `data` to `path` readable only by the owner.
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // `mode` only applies on creation; a leftover temp file keeps its bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(data)?;
    file.sync_all()
}

fn storage_error(path: &Path, err: &dyn std::fmt::Display) -> ClientError {
    ClientError::Storage(format!("{}: {err}", path.display()))
}

// =============================================================================
// MEMORY STORAGE
// =============================================================================

/// Process-local storage for embedding without a filesystem, and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    value: Mutex<Option<Credential>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self { value: Mutex::new(Some(credential)) }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Credential>> {
        self.value.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Credential>, ClientError> {
        Ok(self.slot().clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), ClientError> {
        *self.slot() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
