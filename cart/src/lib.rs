//! # Storefront Cart
//!
//! Tenant-partitioned shopping cart for a small-business storefront. Each
//! storefront (tenant) has its own cart, kept in two places at once:
//!
//! - **Durable storage**: survives reloads, one key per tenant
//! - **The page URL**: a compact token in a query parameter, so the address
//!   bar is always a link to the current cart
//!
//! On open the URL wins over durable storage, which wins over an empty cart.
//!
//! ## Architecture
//!
//! The cart is a reducer running in the runtime store. Persistence happens in
//! effects, so the reducer itself stays pure and testable:
//!
//! ```text
//! CartStore::add_item → CartAction::AddItem → CartReducer → (CartState, persist effect)
//!                                                                │
//!                                     PersistenceAdapter ←───────┘
//!                                     ├─ DurableStorage (JSON record)
//!                                     └─ Location       (base64url token)
//! ```
//!
//! Around the store sit the [`sharing`] facade (share links, clipboard,
//! shared-link notice) and WhatsApp [`checkout`].
//!
//! ## Example
//!
//! ```
//! use storefront_cart::prelude::*;
//!
//! let location = InMemoryLocation::parse("https://shop.test/runa").unwrap();
//! let storage = InMemoryStorage::new();
//! let cart = CartStore::open_for(
//!     CartEnvironment::in_memory(storage.clone(), location.clone()),
//!     Tenant::new("runa"),
//! );
//!
//! cart.add_item(Service::new("kopi", "Kopi Susu", 15_000));
//!
//! assert!(storage.contains_key("chill6_cart_runa"));
//! assert!(location.query_param("cart_runa").is_some());
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod catalog;
pub mod checkout;
pub mod codec;
pub mod config;
pub mod error;
pub mod metrics;
pub mod persistence;
pub mod providers;
pub mod reducer;
pub mod selectors;
pub mod sharing;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use catalog::{Catalog, CatalogEntry, StaticCatalog, StockStatus};
pub use checkout::{Checkout, OrderMessage};
pub use config::StorefrontConfig;
pub use error::{
    AuthError, ClipboardError, CodecError, ConfigError, LocationError, PersistenceError,
    StorageError,
};
pub use crate::metrics::register_metrics;
pub use persistence::{CartKeys, PersistenceAdapter};
pub use reducer::{CartAction, CartEnvironment, CartReducer};
pub use sharing::{Notice, ShareFacade, ShareStatus, SharedLinkNotice};
pub use store::CartStore;
pub use types::{CartItem, CartState, LoadOrigin, MAIN_TENANT, Service, ServiceId, Tenant};

/// Everything a host needs to open a cart and wire its providers.
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogEntry, StaticCatalog, StockStatus};
    pub use crate::checkout::Checkout;
    pub use crate::config::StorefrontConfig;
    pub use crate::providers::{
        Clipboard, DurableStorage, FileStorage, InMemoryClipboard, InMemoryLocation,
        InMemoryStorage, Location, NoClipboard,
    };
    pub use crate::reducer::CartEnvironment;
    pub use crate::sharing::{ShareFacade, ShareStatus, SharedLinkNotice};
    pub use crate::store::CartStore;
    pub use crate::types::{CartItem, CartState, LoadOrigin, Service, ServiceId, Tenant};
}
