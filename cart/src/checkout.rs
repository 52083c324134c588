//! WhatsApp checkout.
//!
//! Orders are not submitted to a backend. The cart is rendered as a chat
//! message, the customer is sent to a `wa.me` link prefilled with it, and the
//! cart is cleared.

use crate::config::WhatsAppConfig;
use crate::metrics::CART_ORDERS_PLACED;
use crate::selectors;
use crate::store::CartStore;
use crate::types::CartState;

/// Format `amount` as Indonesian rupiah: `Rp 100.000`.
#[must_use]
pub fn format_price(amount: u64) -> String {
    format!("Rp {}", group_thousands(amount))
}

fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}

/// Normalize a phone number for `wa.me`: digits only, with the `62` country
/// code in place of a leading `0` or prepended when missing.
#[must_use]
pub fn format_whatsapp_number(number: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();

    if let Some(local) = digits.strip_prefix('0') {
        format!("62{local}")
    } else if digits.starts_with("62") {
        digits
    } else {
        format!("62{digits}")
    }
}

/// `wa.me` deep link opening a chat with `phone`, prefilled with `message`.
#[must_use]
pub fn whatsapp_url(phone: &str, message: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        format_whatsapp_number(phone),
        urlencoding::encode(message)
    )
}

/// Order message for a cart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderMessage(String);

impl OrderMessage {
    /// Closing line of every order
    pub const CLOSING: &'static str =
        "Mohon informasi lebih lanjut untuk proses pemesanan. Terima kasih! 🙏";

    /// Render `state` with the configured greeting.
    ///
    /// ```text
    /// Halo, saya ingin memesan layanan berikut:
    ///
    /// • Gaming PS4 (2x) - Rp 90.000
    ///
    /// *Total: Rp 90.000*
    ///
    /// Mohon informasi lebih lanjut untuk proses pemesanan. Terima kasih! 🙏
    /// ```
    #[must_use]
    pub fn compose(state: &CartState, config: &WhatsAppConfig) -> Self {
        let lines: Vec<String> = state
            .items
            .iter()
            .map(|item| {
                format!(
                    "• {} ({}x) - {}",
                    item.service.name,
                    item.quantity,
                    format_price(selectors::line_total(item))
                )
            })
            .collect();

        Self(format!(
            "{}\n\n{}\n\n*Total: {}*\n\n{}",
            config.greeting,
            lines.join("\n"),
            format_price(selectors::total(state)),
            Self::CLOSING
        ))
    }

    /// Message text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands a cart off to WhatsApp.
#[derive(Clone, Debug)]
pub struct Checkout {
    config: WhatsAppConfig,
}

impl Checkout {
    /// Create a checkout for the configured business number.
    #[must_use]
    pub const fn new(config: WhatsAppConfig) -> Self {
        Self { config }
    }

    /// Order message for the live cart.
    #[must_use]
    pub fn message(&self, cart: &CartStore) -> OrderMessage {
        cart.read(|state| OrderMessage::compose(state, &self.config))
    }

    /// Link to open for the live cart.
    #[must_use]
    pub fn link(&self, cart: &CartStore) -> String {
        whatsapp_url(&self.config.phone_number, self.message(cart).as_str())
    }

    /// Build the order link and clear the cart.
    ///
    /// Returns `None`, leaving the cart alone, when it is empty.
    pub fn place_order(&self, cart: &CartStore) -> Option<String> {
        if cart.read(CartState::is_empty) {
            tracing::debug!("Checkout with empty cart ignored");
            return None;
        }

        let link = self.link(cart);
        tracing::info!(
            tenant = %cart.tenant(),
            units = cart.count(),
            total = cart.total(),
            business = %self.config.business_name,
            "Placing WhatsApp order"
        );
        cart.clear();
        metrics::counter!(CART_ORDERS_PLACED).increment(1);
        Some(link)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::providers::{InMemoryLocation, InMemoryStorage};
    use crate::reducer::CartEnvironment;
    use crate::types::{CartItem, Service, Tenant};
    use storefront_testing::test_time;

    #[test]
    fn prices_use_dot_grouping() {
        assert_eq!(format_price(0), "Rp 0");
        assert_eq!(format_price(999), "Rp 999");
        assert_eq!(format_price(1_000), "Rp 1.000");
        assert_eq!(format_price(100_000), "Rp 100.000");
        assert_eq!(format_price(12_345_678), "Rp 12.345.678");
    }

    #[test]
    fn phone_numbers_get_country_code() {
        assert_eq!(format_whatsapp_number("0831-0490-4353"), "6283104904353");
        assert_eq!(format_whatsapp_number("+62 831 0490 4353"), "6283104904353");
        assert_eq!(format_whatsapp_number("83104904353"), "6283104904353");
    }

    #[test]
    fn message_lists_lines_and_total() {
        let state = CartState::with_items(
            Tenant::main(),
            vec![
                CartItem::new(Service::new("ps4", "Gaming PS4", 45_000), 2, test_time()),
                CartItem::new(Service::new("kopi", "Kopi Susu", 15_000), 1, test_time()),
            ],
        );

        let message = OrderMessage::compose(&state, &WhatsAppConfig::default());

        assert_eq!(
            message.as_str(),
            "Halo, saya ingin memesan layanan berikut:\n\n\
             • Gaming PS4 (2x) - Rp 90.000\n\
             • Kopi Susu (1x) - Rp 15.000\n\n\
             *Total: Rp 105.000*\n\n\
             Mohon informasi lebih lanjut untuk proses pemesanan. Terima kasih! 🙏"
        );
    }

    #[test]
    fn link_is_percent_encoded() {
        let link = whatsapp_url("6283104904353", "Halo *Total*\n🙏");

        assert_eq!(
            link,
            "https://wa.me/6283104904353?text=Halo%20%2ATotal%2A%0A%F0%9F%99%8F"
        );
    }

    #[test]
    fn placing_an_order_clears_the_cart() {
        let env = CartEnvironment::in_memory(
            InMemoryStorage::new(),
            InMemoryLocation::parse("https://shop.test/").unwrap(),
        );
        let cart = CartStore::open(env);
        let checkout = Checkout::new(WhatsAppConfig::default());

        assert_eq!(checkout.place_order(&cart), None);

        cart.add_item(Service::new("ps4", "Gaming PS4", 45_000));
        let link = checkout.place_order(&cart).unwrap();

        assert!(link.starts_with("https://wa.me/6283104904353?text="));
        assert!(link.contains("Gaming%20PS4%20%281x%29"));
        assert!(cart.state().is_empty());
    }
}
