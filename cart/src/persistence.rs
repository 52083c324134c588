//! Tenant-scoped persistence for the cart.
//!
//! Every tenant owns two slots:
//!
//! | Channel | Main tenant | Tenant `T` | Value |
//! |---|---|---|---|
//! | Durable storage key | `chill6_cart` | `chill6_cart_T` | JSON record |
//! | URL query parameter | `cart` | `cart_T` | codec token |
//!
//! The main tenant uses the bare names so links and storage written before
//! tenants existed keep working.
//!
//! Persistence is best-effort. Nothing here returns an error to the caller:
//! failures are logged, counted, and loads degrade to an empty list.
//!
//! Writes issued by the store carry a version taken when the reducer ran.
//! A write older than the last one applied for the same tenant is dropped,
//! so effects that run out of order (a listener dispatching mid-`send`, or
//! clones sending from several threads) never overwrite a newer cart.

use crate::codec::{self, SerializedCart};
use crate::error::{CodecError, LocationError, PersistenceError};
use crate::metrics::{CART_DECODE_FAILURES, CART_PERSISTENCE_FAILURES, CART_SUPERSEDED_WRITES};
use crate::providers::{DurableStorage, Location};
use crate::types::{CartItem, LoadOrigin, Tenant};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use storefront_core::environment::Clock;
use url::Url;

/// Base names the per-tenant storage key and URL parameter derive from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartKeys {
    storage_base: String,
    url_param_base: String,
}

impl CartKeys {
    /// Default durable storage key base
    pub const DEFAULT_STORAGE_BASE: &'static str = "chill6_cart";

    /// Default URL query parameter base
    pub const DEFAULT_URL_PARAM_BASE: &'static str = "cart";

    /// Use custom base names.
    #[must_use]
    pub fn new(storage_base: impl Into<String>, url_param_base: impl Into<String>) -> Self {
        Self {
            storage_base: storage_base.into(),
            url_param_base: url_param_base.into(),
        }
    }

    /// Durable storage key for `tenant`.
    #[must_use]
    pub fn storage_key(&self, tenant: &Tenant) -> String {
        scoped(&self.storage_base, tenant)
    }

    /// URL query parameter name for `tenant`.
    #[must_use]
    pub fn url_param(&self, tenant: &Tenant) -> String {
        scoped(&self.url_param_base, tenant)
    }
}

impl Default for CartKeys {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STORAGE_BASE, Self::DEFAULT_URL_PARAM_BASE)
    }
}

fn scoped(base: &str, tenant: &Tenant) -> String {
    if tenant.is_main() {
        base.to_string()
    } else {
        format!("{base}_{tenant}")
    }
}

/// Result of resolving which channel a tenant's cart comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitialCart {
    /// Lines to adopt
    pub items: Vec<CartItem>,
    /// Channel they came from
    pub origin: LoadOrigin,
}

/// Reads and writes a tenant's cart in durable storage and in the current URL.
pub struct PersistenceAdapter {
    storage: Arc<dyn DurableStorage>,
    location: Arc<dyn Location>,
    clock: Arc<dyn Clock>,
    keys: CartKeys,
    next_version: AtomicU64,
    // Last version applied per tenant. Held for the whole write.
    applied: Mutex<HashMap<Tenant, u64>>,
}

impl PersistenceAdapter {
    /// Create an adapter with the default key names.
    #[must_use]
    pub fn new(
        storage: Arc<dyn DurableStorage>,
        location: Arc<dyn Location>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            location,
            clock,
            keys: CartKeys::default(),
            next_version: AtomicU64::new(0),
            applied: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the key names.
    #[must_use]
    pub fn with_keys(mut self, keys: CartKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Key names in use.
    #[must_use]
    pub const fn keys(&self) -> &CartKeys {
        &self.keys
    }

    /// The clock records are stamped with.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// The current URL, or `None` if the host has none.
    #[must_use]
    pub fn current_url(&self) -> Option<Url> {
        match self.location.current() {
            Ok(url) => Some(url),
            Err(error) => {
                tracing::warn!(%error, "Current location unavailable");
                None
            },
        }
    }

    /// Reserve the version for the next write.
    ///
    /// Versions increase strictly; the reducer takes one while it holds the
    /// store lock, so they follow the order in which states were produced.
    #[must_use]
    pub fn next_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Write `items` to both of `tenant`'s channels unless a newer version
    /// has already been written. Returns whether the write was applied.
    pub fn persist(&self, items: &[CartItem], tenant: &Tenant, version: u64) -> bool {
        self.apply(tenant, version, || {
            self.save_durable(items, tenant);
            self.save_url(items, tenant);
        })
    }

    /// Write `items` to `tenant`'s durable key only, with the same version
    /// check as [`Self::persist`].
    pub fn persist_durable(&self, items: &[CartItem], tenant: &Tenant, version: u64) -> bool {
        self.apply(tenant, version, || self.save_durable(items, tenant))
    }

    /// Drop `tenant`'s durable key and URL parameter, with the same version
    /// check as [`Self::persist`].
    pub fn clear(&self, tenant: &Tenant, version: u64) -> bool {
        self.apply(tenant, version, || {
            self.clear_durable(tenant);
            self.remove_url(tenant);
        })
    }

    /// Remove `tenant`'s URL parameter only, with the same version check as
    /// [`Self::persist`].
    pub fn clear_url(&self, tenant: &Tenant, version: u64) -> bool {
        self.apply(tenant, version, || self.remove_url(tenant))
    }

    fn apply(&self, tenant: &Tenant, version: u64, write: impl FnOnce()) -> bool {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        let last = applied.entry(tenant.clone()).or_default();
        if version <= *last {
            tracing::debug!(%tenant, version, latest = *last, "Skipping superseded cart write");
            metrics::counter!(CART_SUPERSEDED_WRITES).increment(1);
            return false;
        }
        *last = version;
        write();
        true
    }

    /// Write `items` to `tenant`'s durable key.
    ///
    /// An empty list is written as an empty record, not removed; use
    /// [`Self::clear_durable`] to drop the key.
    pub fn save_durable(&self, items: &[CartItem], tenant: &Tenant) {
        if let Err(error) = self.try_save_durable(items, tenant) {
            Self::report("save_durable", tenant, &error);
        }
    }

    /// Read `tenant`'s durable cart. Missing or invalid records read as empty.
    #[must_use]
    pub fn load_durable(&self, tenant: &Tenant) -> Vec<CartItem> {
        self.try_load_durable(tenant).unwrap_or_else(|error| {
            Self::report("load_durable", tenant, &error);
            Vec::new()
        })
    }

    /// Remove `tenant`'s durable key.
    pub fn clear_durable(&self, tenant: &Tenant) {
        let key = self.keys.storage_key(tenant);
        match self.storage.remove_item(&key) {
            Ok(()) => tracing::debug!(%tenant, %key, "Cleared durable cart"),
            Err(error) => Self::report("clear_durable", tenant, &PersistenceError::from(error)),
        }
    }

    /// Set `tenant`'s URL parameter to the token for `items`, or remove it
    /// when `items` is empty. The location is replaced in place.
    pub fn save_url(&self, items: &[CartItem], tenant: &Tenant) {
        if let Err(error) = self.try_save_url(items, tenant) {
            Self::report("save_url", tenant, &error);
        }
    }

    /// Remove `tenant`'s URL parameter.
    pub fn remove_url(&self, tenant: &Tenant) {
        self.save_url(&[], tenant);
    }

    /// Decode `tenant`'s URL parameter. Absent or invalid tokens read as empty.
    #[must_use]
    pub fn load_url(&self, tenant: &Tenant) -> Vec<CartItem> {
        let Some(url) = self.current_url() else {
            return Vec::new();
        };

        query_param(&url, &self.keys.url_param(tenant))
            .map(|token| codec::decode_at(&token, self.clock.now()))
            .unwrap_or_default()
    }

    /// Resolve `tenant`'s cart: a shared link wins over durable storage,
    /// which wins over an empty cart.
    ///
    /// Adopting a shared link does not write it to durable storage here;
    /// the store does that once the cart is live.
    #[must_use]
    pub fn load_initial(&self, tenant: &Tenant) -> InitialCart {
        let from_url = self.load_url(tenant);
        if !from_url.is_empty() {
            tracing::info!(%tenant, items = from_url.len(), "Loading cart from shared link");
            return InitialCart {
                items: from_url,
                origin: LoadOrigin::FromSharedLink,
            };
        }

        let from_storage = self.load_durable(tenant);
        if !from_storage.is_empty() {
            tracing::debug!(%tenant, items = from_storage.len(), "Loading cart from durable storage");
            return InitialCart {
                items: from_storage,
                origin: LoadOrigin::FromDurable,
            };
        }

        tracing::debug!(%tenant, "No stored cart, starting empty");
        InitialCart::default()
    }

    fn try_save_durable(&self, items: &[CartItem], tenant: &Tenant) -> Result<(), PersistenceError> {
        let key = self.keys.storage_key(tenant);
        let record = SerializedCart::from_items(items, self.clock.now()).to_json()?;
        self.storage.set_item(&key, &record)?;
        tracing::trace!(%tenant, %key, items = items.len(), "Saved durable cart");
        Ok(())
    }

    fn try_load_durable(&self, tenant: &Tenant) -> Result<Vec<CartItem>, PersistenceError> {
        let key = self.keys.storage_key(tenant);
        let Some(record) = self.storage.get_item(&key)? else {
            return Ok(Vec::new());
        };

        SerializedCart::parse(&record)
            .map(|cart| cart.into_items(self.clock.now()))
            .map_err(|error: CodecError| {
                metrics::counter!(CART_DECODE_FAILURES).increment(1);
                error.into()
            })
    }

    fn try_save_url(&self, items: &[CartItem], tenant: &Tenant) -> Result<(), PersistenceError> {
        let url = self.location.current()?;
        let token = codec::encode_at(items, self.clock.now());
        let value = (!token.is_empty()).then_some(token.as_str());

        let next = with_query_param(&url, &self.keys.url_param(tenant), value);
        self.location.replace(next)?;
        tracing::trace!(%tenant, token_len = token.len(), "Rewrote cart URL parameter");
        Ok(())
    }

    fn report(operation: &'static str, tenant: &Tenant, error: &PersistenceError) {
        match error {
            PersistenceError::Serialize(_) => {
                tracing::error!(operation, %tenant, %error, "Cart persistence failed");
            },
            PersistenceError::Location(LocationError::Unavailable) => {
                tracing::debug!(operation, %tenant, "Location unavailable, skipping");
            },
            _ => tracing::warn!(operation, %tenant, %error, "Cart persistence failed"),
        }
        metrics::counter!(CART_PERSISTENCE_FAILURES, "operation" => operation).increment(1);
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// First value of query parameter `name` in `url`.
#[must_use]
pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Copy of `url` with parameter `name` set to `value`, or removed when
/// `value` is `None`.
///
/// An existing parameter keeps its position; other parameters are untouched.
#[must_use]
pub fn with_query_param(url: &Url, name: &str, value: Option<&str>) -> Url {
    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, existing) in url.query_pairs() {
        if key != name {
            pairs.push((key.into_owned(), existing.into_owned()));
        } else if let (Some(value), false) = (value, replaced) {
            pairs.push((key.into_owned(), value.to_string()));
            replaced = true;
        }
    }
    if let (Some(value), false) = (value, replaced) {
        pairs.push((name.to_string(), value.to_string()));
    }

    let mut next = url.clone();
    if pairs.is_empty() {
        next.set_query(None);
    } else {
        next.query_pairs_mut().clear().extend_pairs(&pairs);
    }
    next
}
