//! Common types used across the platform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Storage scope: each persisted collection is partitioned either per shop
/// (local mode) or under the shared central store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "mode", content = "shop_id")]
pub enum Scope {
    Local(String),
    Central,
}

impl Scope {
    fn id(&self) -> &str {
        match self {
            Scope::Local(shop_id) => shop_id,
            Scope::Central => "central",
        }
    }

    /// Key under which a collection is persisted for this scope,
    /// e.g. `movements_shop-01` or `products_central`.
    pub fn collection_key(&self, kind: CollectionKind) -> String {
        format!("{}_{}", kind.prefix(), self.id())
    }
}

/// The persisted collections the engine owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Movements,
    Products,
    Sales,
}

impl CollectionKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            CollectionKind::Movements => "movements",
            CollectionKind::Products => "products",
            CollectionKind::Sales => "sales",
        }
    }
}

/// Inclusive date range for queries and reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_keys() {
        let local = Scope::Local("shop-01".to_string());
        assert_eq!(local.collection_key(CollectionKind::Movements), "movements_shop-01");
        assert_eq!(local.collection_key(CollectionKind::Products), "products_shop-01");

        let central = Scope::Central;
        assert_eq!(central.collection_key(CollectionKind::Sales), "sales_central");
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        };
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }
}
