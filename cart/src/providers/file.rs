//! File-backed durable storage.
//!
//! All keys live in one JSON object on disk. Every write rewrites the file
//! through a sibling temp file and a rename, so a crash never leaves half a
//! document behind. A file that is not a JSON map is moved aside on the next
//! write rather than blocking storage for good.

use super::DurableStorage;
use crate::error::StorageError;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

type Entries = BTreeMap<String, String>;

/// Durable storage persisted as a JSON map in a single file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    guard: Mutex<()>,
}

impl FileStorage {
    /// Use the file at `path`. It is created on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed contents of the backing file. The inner error means the file
    /// exists but is not a JSON map.
    fn read(&self) -> Result<Result<Entries, serde_json::Error>, StorageError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Ok(Entries::new())),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        if text.trim().is_empty() {
            return Ok(Ok(Entries::new()));
        }
        Ok(serde_json::from_str(&text))
    }

    fn load(&self) -> Result<Entries, StorageError> {
        self.read()?.map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Storage file is not a JSON map");
            StorageError::Io(format!("corrupt storage file: {e}"))
        })
    }

    /// Like [`Self::load`], but a corrupt file is renamed to
    /// `<name>.corrupt` and writing continues from an empty map.
    fn load_or_recover(&self) -> Result<Entries, StorageError> {
        match self.read()? {
            Ok(entries) => Ok(entries),
            Err(error) => {
                let aside = self.corrupt_path();
                tracing::warn!(
                    path = %self.path.display(),
                    aside = %aside.display(),
                    %error,
                    "Storage file is not a JSON map, moving it aside"
                );
                std::fs::rename(&self.path, &aside).map_err(|e| map_io_error(&e))?;
                Ok(Entries::new())
            },
        }
    }

    fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn store(&self, entries: &Entries) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| map_io_error(&e))?;
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, text).map_err(|e| map_io_error(&e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| map_io_error(&e))
    }

    fn update(&self, apply: impl FnOnce(&mut Entries)) -> Result<(), StorageError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load_or_recover()?;
        apply(&mut entries);
        self.store(&entries)
    }
}

fn map_io_error(error: &std::io::Error) -> StorageError {
    match error.kind() {
        ErrorKind::StorageFull => StorageError::QuotaExceeded,
        ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem => {
            StorageError::Unavailable(error.to_string())
        },
        _ => StorageError::Io(error.to_string()),
    }
}

impl DurableStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
