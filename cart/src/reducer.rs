//! Cart reducer.
//!
//! All cart business rules live here. The reducer mutates [`CartState`] and
//! returns persistence effects; the store runs them in the same `send` call,
//! after subscribers have seen the new state.
//!
//! # Flow
//!
//! 1. `Initialize` / `SwitchTenant` return an effect that resolves the
//!    tenant's cart (URL, then durable storage, then empty)
//! 2. The effect feeds back `Loaded`, which replaces the live cart wholesale
//! 3. A cart adopted from a shared link is written to durable storage
//! 4. Every mutation writes the resulting cart to both channels
//!
//! Write effects take their persistence version during `reduce`, so one that
//! runs after a newer transition has been written is skipped.
//!
//! Actions that change nothing (removing an absent line, setting a quantity
//! to its current value) return no effects.

use crate::persistence::PersistenceAdapter;
use crate::types::{CartItem, CartState, LoadOrigin, Service, ServiceId, Tenant};
use std::sync::Arc;
use storefront_core::effect::Effect;
use storefront_core::environment::Clock;
use storefront_core::reducer::Reducer;
use storefront_core::{SmallVec, smallvec};

/// Cart environment.
///
/// Contains the dependencies the cart reducer needs.
#[derive(Clone)]
pub struct CartEnvironment {
    /// Durable storage and URL channels.
    pub persistence: Arc<PersistenceAdapter>,

    /// Clock for `added_at` and the animation trigger.
    pub clock: Arc<dyn Clock>,
}

impl CartEnvironment {
    /// Create a cart environment.
    #[must_use]
    pub fn new(persistence: Arc<PersistenceAdapter>, clock: Arc<dyn Clock>) -> Self {
        Self { persistence, clock }
    }
}

impl std::fmt::Debug for CartEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEnvironment")
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

/// Cart action.
///
/// Every input to the cart reducer. `Loaded` is produced by the reducer's own
/// load effect; the others come from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════
    /// Load `tenant`'s cart, replacing whatever is live.
    Initialize {
        /// Tenant to load.
        tenant: Tenant,
    },

    /// Switch to `tenant`. A no-op if it is already the live tenant.
    SwitchTenant {
        /// Tenant to switch to.
        tenant: Tenant,
    },

    /// A tenant's cart has been resolved.
    Loaded {
        /// Owner of the cart.
        tenant: Tenant,
        /// Resolved lines.
        items: Vec<CartItem>,
        /// Channel they came from.
        origin: LoadOrigin,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════════════
    /// Add one unit of `service`.
    AddItem {
        /// Catalog snapshot to add.
        service: Service,
    },

    /// Remove the line for `id`.
    RemoveItem {
        /// Line to remove.
        id: ServiceId,
    },

    /// Set the quantity of the line for `id`. Zero or less removes it.
    UpdateQuantity {
        /// Line to update.
        id: ServiceId,
        /// New absolute quantity.
        quantity: i64,
    },

    /// Empty the cart, keeping the tenant.
    Clear,
}

/// Cart reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Create a cart reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn load(env: &CartEnvironment, tenant: Tenant) -> Effect<CartAction> {
        let persistence = Arc::clone(&env.persistence);
        Effect::run(move || {
            let initial = persistence.load_initial(&tenant);
            Some(CartAction::Loaded {
                tenant,
                items: initial.items,
                origin: initial.origin,
            })
        })
    }

    fn persist(env: &CartEnvironment, state: &CartState) -> Effect<CartAction> {
        let persistence = Arc::clone(&env.persistence);
        let version = persistence.next_version();
        let items = state.items.clone();
        let tenant = state.tenant.clone();
        Effect::run(move || {
            persistence.persist(&items, &tenant, version);
            None
        })
    }

    fn remove_line(state: &mut CartState, id: &ServiceId) -> bool {
        let before = state.items.len();
        state.items.retain(|item| item.id() != id);
        state.items.len() != before
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::Initialize { tenant } => {
                tracing::debug!(%tenant, "Initializing cart");
                smallvec![Self::load(env, tenant)]
            },

            CartAction::SwitchTenant { tenant } => {
                if tenant == state.tenant {
                    return smallvec![Effect::None];
                }
                tracing::info!(from = %state.tenant, to = %tenant, "Switching tenant");
                smallvec![Self::load(env, tenant)]
            },

            CartAction::Loaded {
                tenant,
                items,
                origin,
            } => {
                *state = CartState {
                    load_origin: origin,
                    ..CartState::with_items(tenant, items)
                };

                if origin == LoadOrigin::FromSharedLink {
                    // A shared link becomes the tenant's durable cart.
                    let persistence = Arc::clone(&env.persistence);
                    let version = persistence.next_version();
                    let items = state.items.clone();
                    let tenant = state.tenant.clone();
                    return smallvec![Effect::run(move || {
                        persistence.persist_durable(&items, &tenant, version);
                        None
                    })];
                }
                smallvec![Effect::None]
            },

            CartAction::AddItem { service } => {
                let now = env.clock.now();
                let id = service.id.clone();

                if let Some(line) = state.items.iter_mut().find(|item| item.id() == &id) {
                    line.quantity = line.quantity.saturating_add(1);
                    line.added_at = now;
                } else {
                    state.items.push(CartItem::new(service, 1, now));
                }

                tracing::debug!(%id, tenant = %state.tenant, "Added to cart");
                state.last_added_item = Some(id);
                state.animation_trigger = Some(now);
                smallvec![Self::persist(env, state)]
            },

            CartAction::RemoveItem { id } => {
                if !Self::remove_line(state, &id) {
                    return smallvec![Effect::None];
                }
                tracing::debug!(%id, tenant = %state.tenant, "Removed from cart");
                smallvec![Self::persist(env, state)]
            },

            CartAction::UpdateQuantity { id, quantity } => {
                if quantity <= 0 {
                    if !Self::remove_line(state, &id) {
                        return smallvec![Effect::None];
                    }
                    tracing::debug!(%id, quantity, "Quantity floor reached, removed line");
                    return smallvec![Self::persist(env, state)];
                }

                let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                match state.items.iter_mut().find(|item| item.id() == &id) {
                    Some(line) if line.quantity != quantity => {
                        line.quantity = quantity;
                        tracing::debug!(%id, quantity, "Updated quantity");
                        smallvec![Self::persist(env, state)]
                    },
                    Some(_) => smallvec![Effect::None],
                    None => {
                        tracing::debug!(%id, quantity, "Quantity update for absent line ignored");
                        smallvec![Effect::None]
                    },
                }
            },

            CartAction::Clear => {
                let tenant = state.tenant.clone();
                *state = CartState::new(tenant.clone());
                tracing::debug!(%tenant, "Cleared cart");

                let persistence = Arc::clone(&env.persistence);
                let version = persistence.next_version();
                smallvec![Effect::run(move || {
                    persistence.clear(&tenant, version);
                    None
                })]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::providers::{InMemoryLocation, InMemoryStorage};
    use storefront_testing::{ReducerTest, assertions, test_clock, test_time};

    fn test_env() -> CartEnvironment {
        let clock: Arc<dyn Clock> = Arc::new(test_clock());
        let persistence = PersistenceAdapter::new(
            Arc::new(InMemoryStorage::new()),
            Arc::new(InMemoryLocation::parse("https://shop.test/").unwrap()),
            Arc::clone(&clock),
        );
        CartEnvironment::new(Arc::new(persistence), clock)
    }

    fn coffee() -> Service {
        Service::new("x", "Kopi Susu", 1000)
    }

    fn cart_with(quantity: u32) -> CartState {
        CartState::with_items(Tenant::main(), vec![CartItem::new(coffee(), quantity, test_time())])
    }

    #[test]
    fn add_appends_new_line() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(CartState::default())
            .when_action(CartAction::AddItem { service: coffee() })
            .then_state(|state| {
                assert_eq!(state.items, vec![CartItem::new(coffee(), 1, test_time())]);
                assert_eq!(state.last_added_item, Some(ServiceId::new("x")));
                assert_eq!(state.animation_trigger, Some(test_time()));
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_run_effect(effects);
            })
            .run();
    }

    #[test]
    fn add_twice_increments() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(CartState::default())
            .when_action(CartAction::AddItem { service: coffee() })
            .when_action(CartAction::AddItem { service: coffee() })
            .then_state(|state| {
                assert_eq!(state.items.len(), 1);
                assert_eq!(state.items[0].quantity, 2);
            })
            .run();
    }

    #[test]
    fn non_positive_quantity_removes_line() {
        for quantity in [0, -1, i64::MIN] {
            ReducerTest::new(CartReducer::new())
                .with_env(test_env())
                .given_state(cart_with(3))
                .when_action(CartAction::UpdateQuantity {
                    id: ServiceId::new("x"),
                    quantity,
                })
                .then_state(|state| assert!(!state.contains(&ServiceId::new("x"))))
                .then_effects(assertions::assert_has_run_effect)
                .run();
        }
    }

    #[test]
    fn quantity_is_absolute_and_clamped() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(cart_with(3))
            .when_action(CartAction::UpdateQuantity {
                id: ServiceId::new("x"),
                quantity: 7,
            })
            .then_state(|state| assert_eq!(state.items[0].quantity, 7))
            .run();

        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(cart_with(3))
            .when_action(CartAction::UpdateQuantity {
                id: ServiceId::new("x"),
                quantity: i64::MAX,
            })
            .then_state(|state| assert_eq!(state.items[0].quantity, u32::MAX))
            .run();
    }

    #[test]
    fn updating_absent_line_is_a_no_op() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(cart_with(1))
            .when_action(CartAction::UpdateQuantity {
                id: ServiceId::new("missing"),
                quantity: 4,
            })
            .then_state(|state| assert_eq!(*state, cart_with(1)))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn removing_absent_line_is_a_no_op() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(cart_with(1))
            .when_action(CartAction::RemoveItem {
                id: ServiceId::new("missing"),
            })
            .then_state(|state| assert_eq!(*state, cart_with(1)))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn clear_keeps_tenant_and_drops_feedback() {
        let mut given = CartState::with_items(
            Tenant::new("runa"),
            vec![CartItem::new(coffee(), 2, test_time())],
        );
        given.last_added_item = Some(ServiceId::new("x"));

        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(CartAction::Clear)
            .then_state(|state| {
                assert!(state.is_empty());
                assert_eq!(state.tenant, Tenant::new("runa"));
                assert_eq!(state.last_added_item, None);
            })
            .then_effects(assertions::assert_has_run_effect)
            .run();
    }

    #[test]
    fn switching_to_same_tenant_does_nothing() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(cart_with(2))
            .when_action(CartAction::SwitchTenant {
                tenant: Tenant::main(),
            })
            .then_state(|state| assert_eq!(*state, cart_with(2)))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn loaded_replaces_state_wholesale() {
        let mut given = cart_with(2);
        given.last_added_item = Some(ServiceId::new("x"));

        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(given)
            .when_action(CartAction::Loaded {
                tenant: Tenant::new("runa"),
                items: Vec::new(),
                origin: LoadOrigin::FreshEmpty,
            })
            .then_state(|state| {
                assert!(state.is_empty());
                assert_eq!(state.tenant, Tenant::new("runa"));
                assert_eq!(state.last_added_item, None);
                assert_eq!(state.load_origin, LoadOrigin::FreshEmpty);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn shared_link_load_is_persisted() {
        ReducerTest::new(CartReducer::new())
            .with_env(test_env())
            .given_state(CartState::default())
            .when_action(CartAction::Loaded {
                tenant: Tenant::main(),
                items: vec![CartItem::new(coffee(), 3, test_time())],
                origin: LoadOrigin::FromSharedLink,
            })
            .then_state(|state| assert_eq!(state.load_origin, LoadOrigin::FromSharedLink))
            .then_effects(assertions::assert_has_run_effect)
            .run();
    }

    #[test]
    fn load_effect_feeds_back_loaded() {
        let env = test_env();
        let mut state = CartState::default();

        let mut effects = CartReducer::new()
            .reduce(
                &mut state,
                CartAction::Initialize {
                    tenant: Tenant::new("runa"),
                },
                &env,
            )
            .into_iter();

        let Some(Effect::Run(task)) = effects.next() else {
            unreachable!("initialize returns a load effect");
        };
        assert_eq!(
            task(),
            Some(CartAction::Loaded {
                tenant: Tenant::new("runa"),
                items: Vec::new(),
                origin: LoadOrigin::FreshEmpty,
            })
        );
    }
}
