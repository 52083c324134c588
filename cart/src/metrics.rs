//! Metric names recorded by the cart.
//!
//! Recorded through the `metrics` facade, like the store runtime's own
//! metrics. Nothing is exported unless the host installs a recorder.

use metrics::{describe_counter, describe_gauge};

/// Persistence operations that failed and were swallowed, labelled by `operation`
pub const CART_PERSISTENCE_FAILURES: &str = "cart.persistence.failures";

/// Persistence writes dropped because a newer cart was already written
pub const CART_SUPERSEDED_WRITES: &str = "cart.persistence.superseded";

/// Cart tokens rejected while loading from a URL or storage record
pub const CART_DECODE_FAILURES: &str = "cart.decode.failures";

/// Clipboard copy attempts, labelled by `outcome` (`primary`, `fallback`, `failed`)
pub const CART_SHARE_COPIES: &str = "cart.share.copies";

/// Orders handed off to the messaging app
pub const CART_ORDERS_PLACED: &str = "cart.orders.placed";

/// Number of units in the live cart after the last transition
pub const CART_ITEMS: &str = "cart.items";

/// Register descriptions for the cart metrics and the store runtime metrics.
///
/// Safe to call more than once.
pub fn register_metrics() {
    storefront_runtime::metrics::register_metrics();

    describe_counter!(
        CART_PERSISTENCE_FAILURES,
        "Durable storage or URL writes that failed and were ignored"
    );
    describe_counter!(
        CART_SUPERSEDED_WRITES,
        "Out-of-order cart writes skipped in favour of a newer one"
    );
    describe_counter!(
        CART_DECODE_FAILURES,
        "Cart tokens or storage records discarded as undecodable"
    );
    describe_counter!(CART_SHARE_COPIES, "Share link clipboard copy attempts");
    describe_counter!(CART_ORDERS_PLACED, "Orders handed off to WhatsApp");
    describe_gauge!(CART_ITEMS, "Units in the live cart");
}
