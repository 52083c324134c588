//! Derived values over a cart.
//!
//! Recomputed from `items` on every call. Arithmetic saturates instead of
//! wrapping.

use crate::types::{CartItem, CartState};

/// Total number of units across all lines.
#[must_use]
pub fn count(state: &CartState) -> u64 {
    state
        .items
        .iter()
        .fold(0u64, |acc, item| acc.saturating_add(u64::from(item.quantity)))
}

/// Price of one line: unit price times quantity.
#[must_use]
pub fn line_total(item: &CartItem) -> u64 {
    item.service.price.saturating_mul(u64::from(item.quantity))
}

/// Sum of all line totals.
#[must_use]
pub fn total(state: &CartState) -> u64 {
    state
        .items
        .iter()
        .fold(0u64, |acc, item| acc.saturating_add(line_total(item)))
}
