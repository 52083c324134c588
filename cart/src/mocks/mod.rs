//! Mock provider implementations for testing.
//!
//! The in-memory providers in [`crate::providers`] always succeed. The mocks
//! here fail on demand, so tests can check that the cart keeps working when
//! the host does not, and stand in for the authentication service.

pub mod auth;
pub mod clipboard;
pub mod location;
pub mod storage;

pub use auth::MockAuthService;
pub use clipboard::FailingClipboard;
pub use location::FailingLocation;
pub use storage::FailingStorage;
