//! In-memory providers.
//!
//! Process-local stand-ins for the browser APIs. Clones share their contents,
//! so a test can keep a handle and inspect what the cart wrote.

use super::{Clipboard, DurableStorage, Location};
use crate::error::{ClipboardError, LocationError, StorageError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use url::Url;

/// Key-value storage held in a shared map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Whether `key` holds a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableStorage for InMemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Location held in memory, with a count of in-place replacements.
#[derive(Debug, Clone)]
pub struct InMemoryLocation {
    url: Arc<Mutex<Url>>,
    replacements: Arc<Mutex<usize>>,
}

impl InMemoryLocation {
    /// Start at `url`.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url: Arc::new(Mutex::new(url)),
            replacements: Arc::new(Mutex::new(0)),
        }
    }

    /// Start at the URL parsed from `href`.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidUrl`] if `href` is not an absolute URL.
    pub fn parse(href: &str) -> Result<Self, LocationError> {
        let url = Url::parse(href).map_err(|e| LocationError::InvalidUrl(e.to_string()))?;
        Ok(Self::new(url))
    }

    /// The current address as a string.
    #[must_use]
    pub fn href(&self) -> String {
        self.url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_string()
    }

    /// Value of query parameter `name`, if present.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Simulate the user navigating to `url`.
    pub fn navigate(&self, url: Url) {
        *self.url.lock().unwrap_or_else(PoisonError::into_inner) = url;
    }

    /// How many times [`Location::replace`] has been called.
    #[must_use]
    pub fn replacements(&self) -> usize {
        *self
            .replacements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Location for InMemoryLocation {
    fn current(&self) -> Result<Url, LocationError> {
        Ok(self
            .url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn replace(&self, url: Url) -> Result<(), LocationError> {
        *self.url.lock().unwrap_or_else(PoisonError::into_inner) = url;
        *self
            .replacements
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Clipboard that keeps the last written text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
}

impl InMemoryClipboard {
    /// Create an empty clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last written text.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Clipboard for InMemoryClipboard {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send {
        let contents = Arc::clone(&self.contents);
        let text = text.to_string();

        async move {
            *contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text);
            Ok(())
        }
    }
}

/// Clipboard for hosts without one. Every write fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write_text(&self, _text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send {
        async move { Err(ClipboardError::Unavailable) }
    }
}
