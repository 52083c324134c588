//! Mock location.

use crate::error::LocationError;
use crate::providers::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Location that cannot be rewritten, and optionally not even read.
#[derive(Debug, Clone)]
pub struct FailingLocation {
    url: Option<Url>,
    replace_attempts: Arc<AtomicUsize>,
}

impl FailingLocation {
    /// A host without any location.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            url: None,
            replace_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A fixed address whose history cannot be rewritten.
    #[must_use]
    pub fn read_only(url: Url) -> Self {
        Self {
            url: Some(url),
            replace_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of rejected `replace` calls.
    #[must_use]
    pub fn replace_attempts(&self) -> usize {
        self.replace_attempts.load(Ordering::SeqCst)
    }
}

impl Location for FailingLocation {
    fn current(&self) -> Result<Url, LocationError> {
        self.url.clone().ok_or(LocationError::Unavailable)
    }

    fn replace(&self, _url: Url) -> Result<(), LocationError> {
        self.replace_attempts.fetch_add(1, Ordering::SeqCst);
        Err(LocationError::Unavailable)
    }
}
