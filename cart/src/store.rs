//! The live cart.
//!
//! [`CartStore`] wraps the runtime [`Store`] with the cart reducer and gives
//! the UI a method per operation. It is cheap to clone; clones share the
//! same cart.
//!
//! # Example
//!
//! ```
//! use storefront_cart::prelude::*;
//!
//! let location = InMemoryLocation::parse("https://shop.test/services").unwrap();
//! let env = CartEnvironment::in_memory(InMemoryStorage::new(), location);
//! let cart = CartStore::open(env);
//!
//! cart.add_item(Service::new("ps4-2h", "Gaming PS4", 45_000));
//! cart.add_item(Service::new("ps4-2h", "Gaming PS4", 45_000));
//!
//! assert_eq!(cart.count(), 2);
//! assert_eq!(cart.total(), 90_000);
//! ```

use crate::metrics::CART_ITEMS;
use crate::persistence::PersistenceAdapter;
use crate::providers::{DurableStorage, InMemoryLocation, InMemoryStorage, Location};
use crate::reducer::{CartAction, CartEnvironment, CartReducer};
use crate::selectors;
use crate::types::{CartState, LoadOrigin, Service, ServiceId, Tenant};
use std::sync::Arc;
use storefront_core::environment::{Clock, SystemClock};
use storefront_runtime::{Store, Subscription};

type Inner = Store<CartState, CartAction, CartEnvironment, CartReducer>;

impl CartEnvironment {
    /// Build an environment over the given providers.
    #[must_use]
    pub fn with_providers(
        storage: Arc<dyn DurableStorage>,
        location: Arc<dyn Location>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let persistence = PersistenceAdapter::new(storage, location, Arc::clone(&clock));
        Self::new(Arc::new(persistence), clock)
    }

    /// Build an environment over in-memory providers and the system clock.
    #[must_use]
    pub fn in_memory(storage: InMemoryStorage, location: InMemoryLocation) -> Self {
        Self::with_providers(Arc::new(storage), Arc::new(location), Arc::new(SystemClock))
    }
}

/// Handle to the live cart.
#[derive(Clone, Debug)]
pub struct CartStore {
    inner: Inner,
}

impl CartStore {
    /// Open the main tenant's cart.
    #[must_use]
    pub fn open(env: CartEnvironment) -> Self {
        Self::open_for(env, Tenant::main())
    }

    /// Open `tenant`'s cart, loading it from the URL or durable storage.
    #[must_use]
    pub fn open_for(env: CartEnvironment, tenant: Tenant) -> Self {
        let store = Self {
            inner: Store::new(CartState::new(tenant.clone()), CartReducer::new(), env),
        };
        store.dispatch(CartAction::Initialize { tenant });
        store
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.snapshot()
    }

    /// Read the current cart through a closure, without cloning it.
    pub fn read<T>(&self, f: impl FnOnce(&CartState) -> T) -> T {
        self.inner.state(f)
    }

    /// Call `listener` with the new cart after every transition.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartState) + Send + Sync + 'static,
    {
        self.inner.subscribe(listener)
    }

    /// Add one unit of `service`.
    pub fn add_item(&self, service: Service) {
        self.dispatch(CartAction::AddItem { service });
    }

    /// Remove the line for `id`, if present.
    pub fn remove_item(&self, id: impl Into<ServiceId>) {
        self.dispatch(CartAction::RemoveItem { id: id.into() });
    }

    /// Set the quantity of the line for `id`. Zero or less removes it.
    pub fn update_quantity(&self, id: impl Into<ServiceId>, quantity: i64) {
        self.dispatch(CartAction::UpdateQuantity {
            id: id.into(),
            quantity,
        });
    }

    /// Empty the cart and drop its stored copies.
    pub fn clear(&self) {
        self.dispatch(CartAction::Clear);
    }

    /// Switch to `tenant`'s cart and report where it came from.
    ///
    /// Switching to the live tenant changes nothing and reports the origin
    /// of the current cart.
    pub fn switch_tenant(&self, tenant: impl Into<Tenant>) -> LoadOrigin {
        self.dispatch(CartAction::SwitchTenant {
            tenant: tenant.into(),
        });
        self.read(|state| state.load_origin)
    }

    /// Re-read the live tenant's URL parameter and adopt it if it holds a cart.
    ///
    /// Returns `false`, leaving the cart untouched, when the URL has no cart
    /// for this tenant.
    pub fn restore_from_url(&self) -> bool {
        let tenant = self.tenant();
        let items = self.inner.environment().persistence.load_url(&tenant);
        if items.is_empty() {
            return false;
        }

        tracing::info!(%tenant, items = items.len(), "Restoring cart from URL");
        self.dispatch(CartAction::Loaded {
            tenant,
            items,
            origin: LoadOrigin::FromSharedLink,
        });
        true
    }

    /// Live tenant.
    #[must_use]
    pub fn tenant(&self) -> Tenant {
        self.read(|state| state.tenant.clone())
    }

    /// Units in the cart.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.read(selectors::count)
    }

    /// Cart total.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.read(selectors::total)
    }

    /// How the live cart was obtained.
    #[must_use]
    pub fn load_origin(&self) -> LoadOrigin {
        self.read(|state| state.load_origin)
    }

    /// The environment the cart runs against.
    #[must_use]
    pub fn environment(&self) -> &CartEnvironment {
        self.inner.environment()
    }

    fn dispatch(&self, action: CartAction) {
        self.inner.send(action);

        // Precision loss is irrelevant for a gauge
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(CART_ITEMS).set(self.count() as f64);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use std::sync::Mutex;
    use storefront_testing::test_clock;

    fn open(href: &str) -> (CartStore, InMemoryStorage, InMemoryLocation) {
        let storage = InMemoryStorage::new();
        let location = InMemoryLocation::parse(href).unwrap();
        let env = CartEnvironment::with_providers(
            Arc::new(storage.clone()),
            Arc::new(location.clone()),
            Arc::new(test_clock()),
        );
        (CartStore::open(env), storage, location)
    }

    #[test]
    fn opens_empty() {
        let (cart, storage, _) = open("https://shop.test/");

        assert!(cart.state().is_empty());
        assert_eq!(cart.tenant(), Tenant::main());
        assert_eq!(cart.load_origin(), LoadOrigin::FreshEmpty);
        assert!(storage.is_empty());
    }

    #[test]
    fn subscribers_see_each_transition() {
        let (cart, _, _) = open("https://shop.test/");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let subscription = cart.subscribe(move |state| {
            sink.lock().unwrap().push(selectors::count(state));
        });

        cart.add_item(Service::new("x", "Kopi", 1000));
        cart.update_quantity("x", 5);
        subscription.unsubscribe();
        cart.clear();

        assert_eq!(*seen.lock().unwrap(), vec![1, 5]);
    }

    #[test]
    fn restore_from_url_without_param_keeps_cart() {
        let (cart, _, _) = open("https://shop.test/");
        cart.add_item(Service::new("x", "Kopi", 1000));
        cart.clear();

        assert!(!cart.restore_from_url());
        assert!(cart.state().is_empty());
    }
}
