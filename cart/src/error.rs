//! Error types for the cart subsystem.
//!
//! None of the cart errors reach callers of the cart store: decode errors
//! collapse to an empty cart, persistence errors are logged and swallowed,
//! clipboard errors become a `false` result. They exist so the boundaries can
//! log a precise reason. [`ConfigError`] is the exception, returned at startup.

use thiserror::Error;

/// Why a cart token or storage record could not be decoded.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Nothing to decode.
    #[error("Token is empty")]
    Empty,

    /// The token is not base64 in either the URL-safe or the standard alphabet.
    #[error("Token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not UTF-8.
    #[error("Token is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The decoded text is not JSON.
    #[error("Record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON has no `items` array.
    #[error("Record has no items array")]
    MissingItems,
}

/// Failures of a durable key-value storage backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend refused the write because it is full.
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    /// The backend cannot be used in this context (private browsing, no disk, ...).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backend failed.
    #[error("Storage I/O failed: {0}")]
    Io(String),
}

/// Failures reading or rewriting the current URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The host cannot rewrite its location.
    #[error("Location history unavailable")]
    Unavailable,
}

/// Errors raised inside the persistence adapter before being logged.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Storage backend failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Location failure.
    #[error(transparent)]
    Location(#[from] LocationError),

    /// Stored record could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Record could not be serialized.
    #[error("Failed to serialize cart record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures writing to a clipboard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// No clipboard API in this context.
    #[error("Clipboard API not available")]
    Unavailable,

    /// The user or host denied clipboard access.
    #[error("Clipboard permission denied")]
    PermissionDenied,

    /// The write itself failed.
    #[error("Clipboard write failed: {0}")]
    WriteFailed(String),
}

/// Errors reported by the authentication collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email or password did not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Sign-up with an email that is already registered.
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Sign-out without an active session.
    #[error("No active session")]
    NoSession,

    /// The service failed for another reason.
    #[error("Authentication service error: {0}")]
    Service(String),
}

/// Invalid storefront configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
    },

    /// The configuration parsed but is not usable.
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}
