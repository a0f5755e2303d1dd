//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product in the shop catalog
///
/// `quantity` is the cached balance derived from the movement ledger. It is
/// a read shortcut: every write to it goes through the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    /// Cached quantity on hand, derived from the ledger
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    /// Recorded as an initial-stock movement, not written directly
    pub initial_quantity: i64,
}

/// Metadata-only update; there is intentionally no quantity field here —
/// quantity changes go through the movement ledger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
}

/// One row of a product import file, carrying an absolute quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImportRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub quantity: i64,
}
