//! Cart token codec.
//!
//! A token is the JSON record `{items: [{id, name, price, quantity,
//! description?}], timestamp}` encoded with the URL-safe base64 alphabet and
//! no padding, so it can sit in a query string untouched.
//!
//! Decoding is fail-soft: anything that is not a well-formed record yields an
//! empty cart. Individual malformed entries are dropped rather than failing
//! the whole record, and a repeated id keeps its first occurrence.

use std::collections::HashSet;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::metrics::CART_DECODE_FAILURES;
use crate::types::{CartItem, Service, ServiceId};

/// One line as written to a token or to durable storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedCartItem {
    /// Service id
    pub id: String,
    /// Service name
    pub name: String,
    /// Unit price in the smallest currency unit
    pub price: u64,
    /// Units, at least 1
    pub quantity: u32,
    /// Service description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&CartItem> for SerializedCartItem {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.service.id.as_str().to_string(),
            name: item.service.name.clone(),
            price: item.service.price,
            quantity: item.quantity,
            description: item.service.description.clone(),
        }
    }
}

/// Record shared by the URL token and the durable storage value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializedCart {
    /// Lines in cart order
    pub items: Vec<SerializedCartItem>,
    /// Encode time in milliseconds since the Unix epoch; advisory only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl SerializedCart {
    /// Builds the record for a list of lines
    #[must_use]
    pub fn from_items(items: &[CartItem], timestamp: DateTime<Utc>) -> Self {
        Self {
            items: items.iter().map(SerializedCartItem::from).collect(),
            timestamp: Some(timestamp.timestamp_millis()),
        }
    }

    /// Serializes the record to JSON text
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which plain data like this does not produce in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a record, dropping entries that do not validate
    ///
    /// # Errors
    ///
    /// - [`CodecError::Json`] if the text is not JSON
    /// - [`CodecError::MissingItems`] if there is no `items` array
    pub fn parse(json: &str) -> Result<Self, CodecError> {
        let mut record: serde_json::Value = serde_json::from_str(json)?;
        let timestamp = record.get("timestamp").and_then(serde_json::Value::as_i64);

        let Some(serde_json::Value::Array(entries)) =
            record.get_mut("items").map(serde_json::Value::take)
        else {
            return Err(CodecError::MissingItems);
        };

        let mut seen = HashSet::new();
        let items = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                match serde_json::from_value::<SerializedCartItem>(entry) {
                    Ok(item) if item.quantity > 0 && !item.id.is_empty() => Some(item),
                    Ok(item) => {
                        tracing::debug!(index, id = %item.id, "Dropping cart entry with empty id or zero quantity");
                        None
                    },
                    Err(error) => {
                        tracing::debug!(index, %error, "Dropping malformed cart entry");
                        None
                    },
                }
            })
            .filter(|item| {
                let first = seen.insert(item.id.clone());
                if !first {
                    tracing::debug!(id = %item.id, "Dropping duplicate cart entry");
                }
                first
            })
            .collect();

        Ok(Self { items, timestamp })
    }

    /// Converts the record back into cart lines
    ///
    /// Every line gets the record timestamp as `added_at`, or `fallback` when
    /// the record has none.
    #[must_use]
    pub fn into_items(self, fallback: DateTime<Utc>) -> Vec<CartItem> {
        let added_at = self
            .timestamp
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or(fallback);

        self.items
            .into_iter()
            .map(|item| {
                let service = Service {
                    id: ServiceId::new(item.id),
                    name: item.name,
                    price: item.price,
                    description: item.description,
                };
                CartItem::new(service, item.quantity, added_at)
            })
            .collect()
    }
}

/// Encodes lines into a URL-safe token stamped with the current time
///
/// Returns an empty string for an empty cart.
#[must_use]
pub fn encode(items: &[CartItem]) -> String {
    encode_at(items, Utc::now())
}

/// Encodes lines into a URL-safe token with an explicit timestamp
///
/// Deterministic for a given input.
#[must_use]
pub fn encode_at(items: &[CartItem], timestamp: DateTime<Utc>) -> String {
    if items.is_empty() {
        return String::new();
    }

    match SerializedCart::from_items(items, timestamp).to_json() {
        Ok(json) => URL_SAFE_NO_PAD.encode(json),
        Err(error) => {
            tracing::error!(%error, items = items.len(), "Failed to serialize cart");
            String::new()
        },
    }
}

/// Decodes a token, returning an empty list for anything invalid
#[must_use]
pub fn decode(token: &str) -> Vec<CartItem> {
    decode_at(token, Utc::now())
}

/// Decodes a token, using `fallback` as `added_at` when the token has no timestamp
#[must_use]
pub fn decode_at(token: &str, fallback: DateTime<Utc>) -> Vec<CartItem> {
    match try_decode(token, fallback) {
        Ok(items) => items,
        Err(CodecError::Empty) => Vec::new(),
        Err(error) => {
            tracing::warn!(%error, token_len = token.len(), "Discarding undecodable cart token");
            metrics::counter!(CART_DECODE_FAILURES).increment(1);
            Vec::new()
        },
    }
}

/// Decodes a token, reporting why it was rejected
///
/// Accepts tokens in the URL-safe alphabet and, for links created before the
/// switch to it, the standard alphabet with or without padding. A `+` that a
/// query-string decoder turned into a space is restored.
///
/// # Errors
///
/// Returns a [`CodecError`] describing the first failing stage.
pub fn try_decode(token: &str, fallback: DateTime<Utc>) -> Result<Vec<CartItem>, CodecError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CodecError::Empty);
    }

    let bytes = decode_base64(token)?;
    let json = String::from_utf8(bytes)?;
    Ok(SerializedCart::parse(&json)?.into_items(fallback))
}

fn decode_base64(token: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let unpadded = token.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(unpadded)
        .or_else(|_| STANDARD_NO_PAD.decode(unpadded.replace(' ', "+")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use storefront_testing::test_time;

    fn sample_items() -> Vec<CartItem> {
        vec![
            CartItem::new(
                Service::new("service-1", "Test Service", 100_000)
                    .with_description("Test description"),
                2,
                test_time(),
            ),
            CartItem::new(Service::new("ps4-2h", "Gaming PS4", 45_000), 1, test_time()),
        ]
    }

    #[test]
    fn empty_cart_encodes_to_empty_string() {
        assert_eq!(encode(&[]), "");
        assert!(decode("").is_empty());
    }

    #[test]
    fn token_uses_url_safe_alphabet() {
        let token = encode_at(&sample_items(), test_time());

        assert!(!token.is_empty());
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "unexpected character in {token}"
        );
    }

    #[test]
    fn encode_at_is_deterministic() {
        assert_eq!(
            encode_at(&sample_items(), test_time()),
            encode_at(&sample_items(), test_time())
        );
    }

    #[test]
    fn decode_restores_lines_and_timestamp() {
        let token = encode_at(&sample_items(), test_time());
        let decoded = decode(&token);

        assert_eq!(decoded, sample_items());
        assert!(decoded.iter().all(|item| item.added_at == test_time()));
    }

    #[test]
    fn invalid_tokens_decode_to_empty() {
        assert!(decode("not-valid-base64!!").is_empty());
        assert!(decode("invalid-data").is_empty());
        assert!(decode(&URL_SAFE_NO_PAD.encode("{not json")).is_empty());
        assert!(decode(&URL_SAFE_NO_PAD.encode(r#"{"items": "nope"}"#)).is_empty());
        assert!(decode(&URL_SAFE_NO_PAD.encode("[]")).is_empty());
    }

    #[test]
    fn try_decode_reports_the_failing_stage() {
        assert!(matches!(try_decode("", test_time()), Err(CodecError::Empty)));
        assert!(matches!(
            try_decode("@@@", test_time()),
            Err(CodecError::Base64(_))
        ));
        assert!(matches!(
            try_decode(&URL_SAFE_NO_PAD.encode(r#"{"timestamp": 1}"#), test_time()),
            Err(CodecError::MissingItems)
        ));
    }

    #[test]
    fn legacy_standard_alphabet_tokens_are_accepted() {
        let json = SerializedCart::from_items(&sample_items(), test_time())
            .to_json()
            .unwrap_or_default();
        let legacy = STANDARD.encode(&json);

        assert_eq!(decode(&legacy), sample_items());
        assert_eq!(decode(&legacy.replace('+', " ")), sample_items());
    }

    #[test]
    fn malformed_and_duplicate_entries_are_dropped() {
        let record = r#"{
            "items": [
                {"id": "a", "name": "A", "price": 1000, "quantity": 2},
                {"id": "b", "name": "B", "price": -5, "quantity": 1},
                {"id": "c", "name": "C", "price": 10.5, "quantity": 1},
                {"id": "d", "name": "D", "price": 10, "quantity": 0},
                {"id": "e", "price": 10, "quantity": 1},
                {"id": "a", "name": "A again", "price": 1, "quantity": 9},
                {"id": "", "name": "blank", "price": 1, "quantity": 1},
                "garbage"
            ],
            "timestamp": 1735689600000
        }"#;

        let items = decode(&URL_SAFE_NO_PAD.encode(record));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].service.name, "A");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].added_at, test_time());
    }

    #[test]
    fn missing_timestamp_uses_fallback() {
        let record = r#"{"items": [{"id": "a", "name": "A", "price": 1, "quantity": 1}]}"#;

        let items = decode_at(&URL_SAFE_NO_PAD.encode(record), test_time());

        assert_eq!(items[0].added_at, test_time());
    }

    #[test]
    fn record_omits_absent_description() {
        let items = vec![CartItem::new(Service::new("x", "X", 1), 1, test_time())];
        let json = SerializedCart::from_items(&items, test_time())
            .to_json()
            .unwrap_or_default();

        assert!(!json.contains("description"));
        assert!(json.contains(r#""timestamp":1735689600000"#));
    }
}
