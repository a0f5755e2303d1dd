//! Sale and invoice models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a sale
///
/// `Finalized` and `Cancelled` are terminal. Only a finalized sale emits
/// stock movements; a cancelled sale emits nothing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Open,
    Finalized,
    Cancelled,
}

/// One line of a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl SaleItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A sale, accumulating items while open, immutable once finalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub customer_name: String,
    pub items: Vec<SaleItem>,
    pub status: SaleStatus,
    pub date: NaiveDate,
}

impl Sale {
    pub fn total(&self) -> Decimal {
        self.items.iter().map(SaleItem::line_total).sum()
    }

    pub fn is_open(&self) -> bool {
        self.status == SaleStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_sale_total() {
        let sale = Sale {
            id: Uuid::new_v4(),
            customer_name: "Client 1".to_string(),
            items: vec![
                SaleItem {
                    product_id: Uuid::new_v4(),
                    product_name: "Produit 1".to_string(),
                    quantity: 2,
                    unit_price: Decimal::from(1000),
                },
                SaleItem {
                    product_id: Uuid::new_v4(),
                    product_name: "Produit 2".to_string(),
                    quantity: 1,
                    unit_price: Decimal::from(2000),
                },
            ],
            status: SaleStatus::Open,
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        };
        assert_eq!(sale.total(), Decimal::from(4000));
    }
}
