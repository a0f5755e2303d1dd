//! Read-only reporting over the ledger, catalog and sales
//!
//! Pure derived views with no invariants of their own. Reports read
//! without locking: movements are immutable once appended and the cached
//! quantity read tolerates eventual consistency.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{DateRange, Movement, MovementType, Product};
use uuid::Uuid;

use crate::error::AppResult;
use crate::ledger::{MovementFilter, MovementLedger};
use crate::registry::ProductRegistry;
use crate::sales::SaleService;

/// One product line of the stock report, carrying both the fast cached
/// quantity and the authoritative ledger balance
#[derive(Debug, Clone, Serialize)]
pub struct StockReportRow {
    pub product_id: Uuid,
    pub name: String,
    pub cached_quantity: i64,
    pub ledger_balance: i64,
    /// `cached_quantity - ledger_balance`; zero when reconciled
    pub drift: i64,
    /// Purchase value of the ledger balance
    pub stock_value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementReport {
    pub movements: Vec<Movement>,
    pub total_incoming: i64,
    pub total_outgoing: i64,
    pub net: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub sale_count: usize,
    pub units_sold: i64,
    pub revenue: Decimal,
}

pub struct ReportingService {
    ledger: Arc<MovementLedger>,
    registry: Arc<ProductRegistry>,
    sales: Arc<SaleService>,
}

impl ReportingService {
    pub fn new(
        ledger: Arc<MovementLedger>,
        registry: Arc<ProductRegistry>,
        sales: Arc<SaleService>,
    ) -> Self {
        Self { ledger, registry, sales }
    }

    /// Stock levels per product, cached and recomputed side by side
    pub async fn stock_report(&self) -> AppResult<Vec<StockReportRow>> {
        let products = self.registry.list().await?;
        let mut rows = Vec::with_capacity(products.len());
        for product in products {
            let ledger_balance = self.ledger.reconcile_balance(product.id).await?;
            rows.push(stock_row(&product, ledger_balance));
        }
        Ok(rows)
    }

    /// Movements within a date range with in/out totals
    pub async fn movement_report(&self, range: &DateRange) -> AppResult<MovementReport> {
        let filter = MovementFilter {
            date_range: Some(range.clone()),
            ..Default::default()
        };
        let movements = self.ledger.query_movements(&filter).await?;

        let total_incoming = movements
            .iter()
            .filter(|m| m.movement_type == MovementType::Incoming)
            .map(|m| m.quantity)
            .sum();
        let total_outgoing = movements
            .iter()
            .filter(|m| m.movement_type == MovementType::Outgoing)
            .map(|m| m.quantity)
            .sum::<i64>();

        Ok(MovementReport {
            total_incoming,
            total_outgoing,
            net: total_incoming - total_outgoing,
            movements,
        })
    }

    /// Finalized sales within a date range
    pub async fn sales_report(&self, range: &DateRange) -> AppResult<SalesReport> {
        let sales = self.sales.sales_between(range).await?;
        let units_sold = sales
            .iter()
            .flat_map(|sale| sale.items.iter())
            .map(|item| item.quantity)
            .sum();
        let revenue = sales.iter().map(|sale| sale.total()).sum();

        Ok(SalesReport {
            sale_count: sales.len(),
            units_sold,
            revenue,
        })
    }
}

fn stock_row(product: &Product, ledger_balance: i64) -> StockReportRow {
    StockReportRow {
        product_id: product.id,
        name: product.name.clone(),
        cached_quantity: product.quantity,
        ledger_balance,
        drift: product.quantity - ledger_balance,
        stock_value: product.purchase_price * Decimal::from(ledger_balance),
    }
}
