//! Bulk product import and export
//!
//! Import rows carry absolute quantities. Merging never overwrites the
//! cached quantity: the difference against the current balance is recorded
//! through the ledger as a single import movement, so imports pass the same
//! invariant checks as every other quantity change.

use std::io::Read;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    validate_product_name, CreateProductInput, MovementReason, MovementType, NewMovement, Product,
    ProductImportRecord, UpdateProductInput, MAX_QUANTITY,
};

use crate::error::{AppError, AppResult};
use crate::ledger::MovementLedger;
use crate::registry::ProductRegistry;

/// Counts reported back to the import caller
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ImportOutcome {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

pub struct ImportService {
    registry: Arc<ProductRegistry>,
    ledger: Arc<MovementLedger>,
}

impl ImportService {
    pub fn new(registry: Arc<ProductRegistry>, ledger: Arc<MovementLedger>) -> Self {
        Self { registry, ledger }
    }

    /// Merge imported rows into the catalog
    ///
    /// Known products (matched by name, as import files carry no ids) get
    /// their metadata refreshed and one import movement for the quantity
    /// delta — none when the quantity is unchanged. Unknown products are
    /// created through the registry's initial-stock path. A failing row
    /// aborts the merge with its row number; rows already merged stay
    /// applied and are visible in the ledger.
    pub async fn bulk_merge(&self, records: Vec<ProductImportRecord>) -> AppResult<ImportOutcome> {
        let mut outcome = ImportOutcome::default();

        for (index, record) in records.into_iter().enumerate() {
            self.merge_record(record, &mut outcome)
                .await
                .map_err(|err| AppError::Import(format!("row {}: {}", index + 1, err)))?;
        }

        tracing::info!(
            created = outcome.created,
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            "import merge completed"
        );
        Ok(outcome)
    }

    async fn merge_record(
        &self,
        record: ProductImportRecord,
        outcome: &mut ImportOutcome,
    ) -> AppResult<()> {
        validate_product_name(&record.name).map_err(|message| {
            AppError::validation("name", message, "Nom de produit invalide")
        })?;
        if record.quantity < 0 || record.quantity > MAX_QUANTITY {
            return Err(AppError::validation(
                "quantity",
                "Imported quantity is out of range",
                "La quantité importée est hors limites",
            ));
        }

        let existing = self
            .registry
            .list()
            .await?
            .into_iter()
            .find(|p| p.name == record.name);

        let Some(product) = existing else {
            self.registry
                .create(CreateProductInput {
                    name: record.name,
                    description: record.description,
                    category: record.category,
                    brand: record.brand,
                    purchase_price: record.purchase_price,
                    selling_price: record.selling_price,
                    initial_quantity: record.quantity,
                })
                .await?;
            outcome.created += 1;
            return Ok(());
        };

        self.registry
            .update_metadata(
                product.id,
                UpdateProductInput {
                    description: Some(record.description),
                    category: Some(record.category),
                    brand: Some(record.brand),
                    purchase_price: Some(record.purchase_price),
                    selling_price: Some(record.selling_price),
                    ..Default::default()
                },
            )
            .await?;

        let delta = record.quantity.checked_sub(product.quantity).ok_or_else(|| {
            AppError::validation(
                "quantity",
                "Quantity overflows the stock balance",
                "La quantité dépasse la capacité du stock",
            )
        })?;
        if delta == 0 {
            outcome.unchanged += 1;
            return Ok(());
        }

        let movement_type = if delta > 0 {
            MovementType::Incoming
        } else {
            MovementType::Outgoing
        };
        let mut input = NewMovement::new(product.id, movement_type, delta.abs(), MovementReason::Import);
        input.note = Some("Import de stock".to_string());
        self.ledger.record_movement(input).await?;
        outcome.updated += 1;
        Ok(())
    }

    /// Parse a product CSV in the export header format
    /// (`name,description,category,brand,purchasePrice,sellingPrice,quantity`)
    pub fn parse_csv<R: Read>(&self, reader: R) -> AppResult<Vec<ProductImportRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();
        for row in csv_reader.deserialize() {
            let record: ProductImportRecord = row?;
            records.push(record);
        }
        Ok(records)
    }

    /// Parse a JSON array of import records
    pub fn from_json(&self, json: &str) -> AppResult<Vec<ProductImportRecord>> {
        serde_json::from_str(json).map_err(|e| AppError::Import(e.to_string()))
    }

    /// Export the catalog as CSV in the import-compatible header format
    pub fn export_products_csv(&self, products: &[Product]) -> AppResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "name",
            "description",
            "category",
            "brand",
            "purchasePrice",
            "sellingPrice",
            "quantity",
        ])?;
        for product in products {
            writer.write_record([
                product.name.as_str(),
                product.description.as_str(),
                product.category.as_str(),
                product.brand.as_str(),
                &product.purchase_price.to_string(),
                &product.selling_price.to_string(),
                &product.quantity.to_string(),
            ])?;
        }
        finish_csv(writer)
    }

    /// Export current stock with purchase value per product
    pub fn export_stock_csv(&self, products: &[Product]) -> AppResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["name", "brand", "quantity", "purchasePrice", "totalValue"])?;
        for product in products {
            let total_value = product.purchase_price * Decimal::from(product.quantity);
            writer.write_record([
                product.name.as_str(),
                product.brand.as_str(),
                &product.quantity.to_string(),
                &product.purchase_price.to_string(),
                &total_value.to_string(),
            ])?;
        }
        finish_csv(writer)
    }
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Import(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Import(e.to_string()))
}
