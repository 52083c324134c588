//! Mock durable storage.

use crate::error::StorageError;
use crate::providers::{DurableStorage, InMemoryStorage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Storage whose writes fail with a fixed error.
///
/// Reads go to a backing [`InMemoryStorage`] unless `fail_reads` is set, so a
/// test can seed a record and then watch every save fail.
#[derive(Debug, Clone)]
pub struct FailingStorage {
    backing: InMemoryStorage,
    error: StorageError,
    fail_reads: bool,
    attempts: Arc<AtomicUsize>,
}

impl FailingStorage {
    /// Fail every operation with `error`.
    #[must_use]
    pub fn new(error: StorageError) -> Self {
        Self {
            backing: InMemoryStorage::new(),
            error,
            fail_reads: true,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve reads from `backing` and fail writes with `error`.
    #[must_use]
    pub fn read_only(backing: InMemoryStorage, error: StorageError) -> Self {
        Self {
            backing,
            error,
            fail_reads: false,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Full storage: writes fail with [`StorageError::QuotaExceeded`].
    #[must_use]
    pub fn quota_exceeded() -> Self {
        Self::read_only(InMemoryStorage::new(), StorageError::QuotaExceeded)
    }

    /// Number of failed calls so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

impl DurableStorage for FailingStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return self.fail();
        }
        Ok(self.backing.get(key))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.fail()
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        self.fail()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    #[test]
    fn read_only_serves_seeded_records() {
        let backing = InMemoryStorage::new();
        backing.set_item("k", "v").unwrap();
        let storage = FailingStorage::read_only(backing.clone(), StorageError::QuotaExceeded);

        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(storage.set_item("k", "w"), Err(StorageError::QuotaExceeded));
        assert_eq!(storage.remove_item("k"), Err(StorageError::QuotaExceeded));
        assert_eq!(backing.get("k").as_deref(), Some("v"));
        assert_eq!(storage.attempts(), 2);
    }

    #[test]
    fn new_fails_reads_too() {
        let storage = FailingStorage::new(StorageError::Unavailable("private mode".into()));

        assert!(storage.get_item("k").is_err());
        assert_eq!(storage.attempts(), 1);
    }
}
