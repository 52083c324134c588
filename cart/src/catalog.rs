//! Read-only product catalog.
//!
//! The cart never holds a catalog entry directly. [`CatalogEntry::snapshot`]
//! copies the fields a cart line needs, so later price or stock changes do not
//! touch carts already holding the entry.

use crate::types::{Service, ServiceId};
use serde::{Deserialize, Serialize};

/// Availability of a catalog entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    /// Can be ordered
    #[default]
    Available,
    /// Temporarily out of stock
    SoldOut,
    /// Announced but not yet on sale
    ComingSoon,
}

impl StockStatus {
    /// Whether entries with this status may be added to a cart
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// One product or service offered by a storefront
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Catalog identifier
    pub id: ServiceId,
    /// Display name
    pub name: String,
    /// Unit price in the smallest currency unit
    pub price: u64,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Selling points shown on the product card
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Availability
    #[serde(default, rename = "stockStatus")]
    pub stock: StockStatus,
}

impl CatalogEntry {
    /// Creates an available entry without description or features
    #[must_use]
    pub fn new(id: impl Into<ServiceId>, name: impl Into<String>, price: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            description: None,
            features: Vec::new(),
            stock: StockStatus::Available,
        }
    }

    /// Attaches a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a feature line
    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    /// Sets the stock status
    #[must_use]
    pub const fn with_stock(mut self, stock: StockStatus) -> Self {
        self.stock = stock;
        self
    }

    /// The cart-side copy of this entry
    #[must_use]
    pub fn snapshot(&self) -> Service {
        Service {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            description: self.description.clone(),
        }
    }
}

/// Source of catalog entries
pub trait Catalog: Send + Sync {
    /// All entries in display order
    fn entries(&self) -> &[CatalogEntry];

    /// Entry with the given id
    fn find(&self, id: &ServiceId) -> Option<&CatalogEntry> {
        self.entries().iter().find(|entry| &entry.id == id)
    }

    /// Snapshot of the entry if it exists and can be ordered
    fn orderable(&self, id: &ServiceId) -> Option<Service> {
        self.find(id)
            .filter(|entry| entry.stock.is_orderable())
            .map(CatalogEntry::snapshot)
    }
}

/// Catalog held in memory
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    /// Creates a catalog, dropping entries whose id repeats an earlier one
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut unique: Vec<CatalogEntry> = Vec::new();
        for entry in entries {
            if unique.iter().any(|existing| existing.id == entry.id) {
                tracing::warn!(id = %entry.id, "Duplicate catalog entry dropped");
                continue;
            }
            unique.push(entry);
        }
        Self { entries: unique }
    }

    /// Parses a catalog from a JSON array of entries
    ///
    /// # Errors
    ///
    /// Returns error if `json` is not an array of catalog entries
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    fn catalog() -> StaticCatalog {
        StaticCatalog::new([
            CatalogEntry::new("gaming-package", "Paket Gaming", 45_000)
                .with_description("PS4 + Snack + Minuman")
                .with_feature("2 jam gaming PS4"),
            CatalogEntry::new("photo-session", "Sesi Foto", 350_000)
                .with_stock(StockStatus::SoldOut),
            CatalogEntry::new("gaming-package", "Duplicate", 1),
        ])
    }

    #[test]
    fn duplicates_are_dropped() {
        let catalog = catalog();

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.find(&ServiceId::new("gaming-package")).unwrap().name,
            "Paket Gaming"
        );
    }

    #[test]
    fn snapshot_copies_cart_fields() {
        let catalog = catalog();
        let service = catalog.orderable(&ServiceId::new("gaming-package")).unwrap();

        assert_eq!(service.price, 45_000);
        assert_eq!(service.description.as_deref(), Some("PS4 + Snack + Minuman"));
    }

    #[test]
    fn only_available_entries_are_orderable() {
        let catalog = catalog();

        assert!(catalog.orderable(&ServiceId::new("photo-session")).is_none());
        assert!(catalog.orderable(&ServiceId::new("missing")).is_none());
        assert!(!StockStatus::ComingSoon.is_orderable());
    }

    #[test]
    fn parses_wire_format() {
        let catalog = StaticCatalog::from_json(
            r#"[
                {"id": "kopi", "name": "Kopi Susu", "price": 15000, "stockStatus": "coming-soon"},
                {"id": "teh", "name": "Es Teh", "price": 5000}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.entries()[0].stock, StockStatus::ComingSoon);
        assert_eq!(catalog.entries()[1].stock, StockStatus::Available);
        assert!(catalog.entries()[1].features.is_empty());
    }
}
