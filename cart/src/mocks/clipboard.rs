//! Mock clipboard.

use crate::error::ClipboardError;
use crate::providers::Clipboard;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Clipboard that rejects every write with a fixed error.
#[derive(Debug, Clone)]
pub struct FailingClipboard {
    error: ClipboardError,
    attempts: Arc<AtomicUsize>,
}

impl FailingClipboard {
    /// Reject writes with `error`.
    #[must_use]
    pub fn new(error: ClipboardError) -> Self {
        Self {
            error,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reject writes as if the user denied access.
    #[must_use]
    pub fn denied() -> Self {
        Self::new(ClipboardError::PermissionDenied)
    }

    /// Number of rejected writes.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Clipboard for FailingClipboard {
    fn write_text(&self, _text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let error = self.error.clone();

        async move { Err(error) }
    }
}
