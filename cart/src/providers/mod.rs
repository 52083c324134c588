//! Host providers.
//!
//! The cart never touches the host environment directly. Everything it needs
//! from outside (a durable key-value store, the current URL, a clipboard) is
//! a trait here, injected through the environment.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The reducer and the
//! persistence adapter depend on these traits; the host supplies concrete
//! implementations.
//!
//! - **Testing**: in-memory providers and the mocks in [`crate::mocks`]
//! - **Native hosts**: [`FileStorage`] for durability across runs
//! - **Browsers**: thin wrappers over `localStorage`, `history.replaceState`
//!   and `navigator.clipboard`, living outside this crate

use crate::error::{ClipboardError, LocationError, StorageError};
use std::future::Future;
use url::Url;

pub mod auth;
pub mod file;
pub mod memory;

pub use auth::{AuthResponse, AuthService, Session, SignInData, SignUpData, User};
pub use file::FileStorage;
pub use memory::{InMemoryClipboard, InMemoryLocation, InMemoryStorage, NoClipboard};

/// Durable string key-value storage.
///
/// Values survive a page reload (or a process restart for native hosts). The
/// cart uses one key per tenant.
pub trait DurableStorage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] if the backend is full, or
    /// another [`StorageError`] if it cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// The page's current address.
pub trait Location: Send + Sync {
    /// The current URL.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError`] if the host has no usable location.
    fn current(&self) -> Result<Url, LocationError>;

    /// Replace the current URL in place, without navigating or adding a
    /// history entry.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Unavailable`] if the host cannot rewrite its location.
    fn replace(&self, url: Url) -> Result<(), LocationError>;
}

/// Clipboard write access.
pub trait Clipboard: Send + Sync {
    /// Put `text` on the clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if the clipboard is missing, access is
    /// denied, or the write fails.
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send;
}

impl<T: DurableStorage + ?Sized> DurableStorage for std::sync::Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

impl<T: Location + ?Sized> Location for std::sync::Arc<T> {
    fn current(&self) -> Result<Url, LocationError> {
        (**self).current()
    }

    fn replace(&self, url: Url) -> Result<(), LocationError> {
        (**self).replace(url)
    }
}

impl<T: Clipboard> Clipboard for std::sync::Arc<T> {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send {
        (**self).write_text(text)
    }
}
