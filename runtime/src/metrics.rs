//! Metric descriptions for the store runtime.
//!
//! The store records through the `metrics` facade; whichever recorder the
//! host installs receives the values. Without a recorder every call is a
//! no-op, which is what tests and non-browser hosts get.
//!
//! # Example
//!
//! ```
//! storefront_runtime::metrics::register_metrics();
//! ```

use metrics::{describe_counter, describe_histogram};

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Actions dispatched through [`crate::Store::send`], including feedback actions
pub const STORE_ACTIONS_TOTAL: &str = "store.actions.total";

/// Time spent inside the reducer per action
pub const STORE_REDUCER_DURATION: &str = "store.reducer.duration_seconds";

/// Number of effects a reducer returned for one action
pub const STORE_EFFECTS_COUNT: &str = "store.effects.count";

/// Direct state replacements through [`crate::Store::set_state`]
pub const STORE_STATE_UPDATES_TOTAL: &str = "store.state_updates.total";

/// Listener invocations after a state transition
pub const STORE_LISTENER_CALLS_TOTAL: &str = "store.listener_calls.total";

/// Register all store metric descriptions.
///
/// Safe to call more than once.
pub fn register_metrics() {
    describe_counter!(
        STORE_ACTIONS_TOTAL,
        "Total number of actions processed by the store"
    );
    describe_histogram!(
        STORE_REDUCER_DURATION,
        "Time taken to execute the reducer for one action"
    );
    describe_histogram!(
        STORE_EFFECTS_COUNT,
        "Number of effects returned by the reducer for one action"
    );
    describe_counter!(
        STORE_STATE_UPDATES_TOTAL,
        "Total number of direct state updates"
    );
    describe_counter!(
        STORE_LISTENER_CALLS_TOTAL,
        "Total number of subscriber notifications"
    );
}
