//! # Storefront Runtime
//!
//! Runtime implementation for the storefront state architecture.
//!
//! This crate provides the [`Store`]: a typed, observable state holder that
//! coordinates reducer execution, effect handling and subscriber notification.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, the reducer and the environment
//! - **Effect Executor**: Runs effect descriptions and feeds produced actions back to the reducer
//! - **Subscribers**: Listeners invoked synchronously after every state transition
//!
//! Everything runs on the caller's thread. `send` returns once the action,
//! every effect it produced and every follow-up action have been processed.
//!
//! ## Example
//!
//! ```ignore
//! use storefront_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! let subscription = store.subscribe(|state| println!("{state:?}"));
//!
//! // Send an action
//! store.send(Action::DoSomething);
//!
//! // Read state
//! let value = store.state(|s| s.some_field);
//!
//! subscription.unsubscribe();
//! ```

use storefront_core::{effect::Effect, reducer::Reducer};

/// Metric names and descriptions recorded by the store
pub mod metrics;

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{Effect, Reducer};
    use crate::metrics::{
        STORE_ACTIONS_TOTAL, STORE_EFFECTS_COUNT, STORE_LISTENER_CALLS_TOTAL,
        STORE_REDUCER_DURATION, STORE_STATE_UPDATES_TOTAL,
    };
    use std::collections::VecDeque;
    use std::marker::PhantomData;
    use std::sync::{
        Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
    };

    type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

    struct Listeners<S> {
        next_id: u64,
        entries: Vec<(u64, Listener<S>)>,
    }

    impl<S> Default for Listeners<S> {
        fn default() -> Self {
            Self {
                next_id: 0,
                entries: Vec::new(),
            }
        }
    }

    fn lock_listeners<S>(listeners: &Mutex<Listeners<S>>) -> MutexGuard<'_, Listeners<S>> {
        listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle returned by [`Store::subscribe`]
    ///
    /// Dropping the handle leaves the listener registered. Call
    /// [`Subscription::unsubscribe`] to remove it.
    #[must_use = "call `unsubscribe` to remove the listener"]
    pub struct Subscription {
        id: u64,
        remove: Option<Box<dyn FnOnce() + Send + Sync>>,
    }

    impl Subscription {
        /// Identifier of the registered listener
        #[must_use]
        pub const fn id(&self) -> u64 {
            self.id
        }

        /// Remove the listener from the store
        ///
        /// A no-op if the store has already been dropped.
        pub fn unsubscribe(mut self) {
            if let Some(remove) = self.remove.take() {
                remove();
            }
        }
    }

    impl std::fmt::Debug for Subscription {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Subscription").field("id", &self.id).finish()
        }
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    /// 5. Subscribers notified after every transition
    ///
    /// Cloning a store yields another handle onto the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        listeners: Arc<Mutex<Listeners<S>>>,
        _action: PhantomData<fn() -> A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
        S: Clone + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// # Arguments
        ///
        /// - `initial_state`: The starting state for the store
        /// - `reducer`: The reducer implementation (business logic)
        /// - `environment`: Injected dependencies
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                listeners: Arc::new(Mutex::new(Listeners::default())),
                _action: PhantomData,
            }
        }

        /// The environment the reducer runs against
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Releases the lock and notifies subscribers
        /// 4. Executes returned effects in order
        /// 5. Actions produced by effects are processed the same way, FIFO
        ///
        /// Listeners and effects run without any lock held, so they may read
        /// the store or send further actions.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub fn send(&self, action: A) {
            let mut pending = VecDeque::from([action]);

            while let Some(action) = pending.pop_front() {
                tracing::debug!("Processing action");
                metrics::counter!(STORE_ACTIONS_TOTAL).increment(1);

                let effects = {
                    let mut state = self.write();

                    let start = std::time::Instant::now();
                    let effects = self.reducer.reduce(&mut state, action, &self.environment);
                    metrics::histogram!(STORE_REDUCER_DURATION)
                        .record(start.elapsed().as_secs_f64());

                    tracing::trace!("Reducer completed, returned {} effects", effects.len());

                    // Note: Precision loss acceptable for metrics (effect counts < 2^52)
                    #[allow(clippy::cast_precision_loss)]
                    metrics::histogram!(STORE_EFFECTS_COUNT).record(effects.len() as f64);

                    effects
                };

                self.notify();

                for effect in effects {
                    Self::execute_effect(effect, &mut pending);
                }
            }
        }

        /// Replace or modify state directly, bypassing the reducer
        ///
        /// Subscribers are notified afterwards. No effects run.
        pub fn set_state<F>(&self, update: F)
        where
            F: FnOnce(&mut S),
        {
            {
                let mut state = self.write();
                update(&mut state);
            }
            metrics::counter!(STORE_STATE_UPDATES_TOTAL).increment(1);
            self.notify();
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let item_count = store.state(|s| s.items.len());
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.read();
            f(&state)
        }

        /// Clone of the current state
        #[must_use]
        pub fn snapshot(&self) -> S {
            self.read().clone()
        }

        /// Register a listener invoked with the new state after every transition
        ///
        /// Listeners run synchronously, in registration order, on the thread
        /// that caused the transition.
        pub fn subscribe<F>(&self, listener: F) -> Subscription
        where
            F: Fn(&S) + Send + Sync + 'static,
            S: Send,
        {
            let id = {
                let mut listeners = lock_listeners(&self.listeners);
                let id = listeners.next_id;
                listeners.next_id += 1;
                listeners.entries.push((id, Arc::new(listener)));
                id
            };

            let registry: Weak<Mutex<Listeners<S>>> = Arc::downgrade(&self.listeners);
            Subscription {
                id,
                remove: Some(Box::new(move || {
                    if let Some(listeners) = registry.upgrade() {
                        lock_listeners(&listeners)
                            .entries
                            .retain(|(entry_id, _)| *entry_id != id);
                    }
                })),
            }
        }

        /// Number of registered listeners
        #[must_use]
        pub fn listener_count(&self) -> usize {
            lock_listeners(&self.listeners).entries.len()
        }

        fn notify(&self) {
            let listeners: Vec<Listener<S>> = lock_listeners(&self.listeners)
                .entries
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();

            if listeners.is_empty() {
                return;
            }

            let snapshot = self.snapshot();
            for listener in &listeners {
                listener(&snapshot);
            }
            metrics::counter!(STORE_LISTENER_CALLS_TOTAL).increment(listeners.len() as u64);
        }

        fn execute_effect(effect: Effect<A>, pending: &mut VecDeque<A>) {
            match effect {
                Effect::None => {},
                Effect::Sequential(effects) => {
                    for effect in effects {
                        Self::execute_effect(effect, pending);
                    }
                },
                Effect::Run(task) => {
                    if let Some(action) = task() {
                        tracing::trace!("Effect produced an action, queueing it");
                        pending.push_back(action);
                    }
                },
            }
        }

        fn read(&self) -> RwLockReadGuard<'_, S> {
            self.state.read().unwrap_or_else(PoisonError::into_inner)
        }

        fn write(&self) -> RwLockWriteGuard<'_, S> {
            self.state.write().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                listeners: Arc::clone(&self.listeners),
                _action: PhantomData,
            }
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
        S: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("state", &self.state)
                .finish_non_exhaustive()
        }
    }
}

// Re-export for convenience
pub use store::{Store, Subscription};
