//! Domain types for the cart.
//!
//! A cart is an ordered list of lines, one per catalog entry, owned by a
//! tenant. Lines carry a snapshot of the catalog entry taken when it was first
//! added, never a live reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the default storefront
pub const MAIN_TENANT: &str = "main";

/// Unique identifier of a catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// Creates a `ServiceId` from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ServiceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Snapshot of a catalog entry as stored in the cart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Catalog identifier
    pub id: ServiceId,
    /// Display name
    pub name: String,
    /// Unit price in the smallest currency unit
    pub price: u64,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Service {
    /// Creates a service without a description
    #[must_use]
    pub fn new(id: impl Into<ServiceId>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            description: None,
        }
    }

    /// Attaches a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One line of a cart
///
/// Equality ignores `added_at`, which only drives the "recently added"
/// highlight.
#[derive(Clone, Debug)]
pub struct CartItem {
    /// Snapshot of the catalog entry
    pub service: Service,
    /// Number of units, always at least 1
    pub quantity: u32,
    /// When the line was created or last incremented
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new line
    #[must_use]
    pub const fn new(service: Service, quantity: u32, added_at: DateTime<Utc>) -> Self {
        Self {
            service,
            quantity,
            added_at,
        }
    }

    /// Identifier of the line's catalog entry
    #[must_use]
    pub const fn id(&self) -> &ServiceId {
        &self.service.id
    }
}

impl PartialEq for CartItem {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service && self.quantity == other.quantity
    }
}

impl Eq for CartItem {}

/// Storefront a cart belongs to
///
/// Blank identifiers resolve to the main tenant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tenant(String);

impl Tenant {
    /// Creates a tenant, mapping blank input to [`Tenant::main`]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            Self::main()
        } else if trimmed.len() == id.len() {
            Self(id)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// The default storefront
    #[must_use]
    pub fn main() -> Self {
        Self(MAIN_TENANT.to_string())
    }

    /// Whether this is the default storefront
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.0 == MAIN_TENANT
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Tenant {
    fn default() -> Self {
        Self::main()
    }
}

impl std::fmt::Display for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tenant {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Where the live cart came from when it was initialized
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadOrigin {
    /// Neither channel held a cart
    #[default]
    FreshEmpty,
    /// Loaded from durable storage
    FromDurable,
    /// Loaded from the tenant's cart parameter in the current URL
    FromSharedLink,
}

/// The live cart
///
/// Equality compares `items` and `tenant` only; the remaining fields are
/// UI feedback.
#[derive(Clone, Debug, Default)]
pub struct CartState {
    /// Lines in insertion order, unique by service id
    pub items: Vec<CartItem>,
    /// Owner of this cart
    pub tenant: Tenant,
    /// Id of the most recently added service
    pub last_added_item: Option<ServiceId>,
    /// Timestamp of the most recent add, used to retrigger animations
    pub animation_trigger: Option<DateTime<Utc>>,
    /// How the cart was obtained at initialization
    pub load_origin: LoadOrigin,
}

impl CartState {
    /// Creates an empty cart for the given tenant
    #[must_use]
    pub fn new(tenant: Tenant) -> Self {
        Self {
            tenant,
            ..Self::default()
        }
    }

    /// Creates a cart holding the given lines
    #[must_use]
    pub fn with_items(tenant: Tenant, items: Vec<CartItem>) -> Self {
        Self {
            items,
            tenant,
            ..Self::default()
        }
    }

    /// Returns the line for a service, if present
    #[must_use]
    pub fn find(&self, id: &ServiceId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether a line for the service exists
    #[must_use]
    pub fn contains(&self, id: &ServiceId) -> bool {
        self.find(id).is_some()
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for CartState {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && self.tenant == other.tenant
    }
}

impl Eq for CartState {}
