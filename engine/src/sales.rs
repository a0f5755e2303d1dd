//! Sale workflow
//!
//! A sale accumulates line items while open, then either finalizes —
//! emitting exactly one outgoing movement per line through the ledger —
//! or is cancelled and emits nothing. Finalization is all-or-nothing:
//! every line is re-validated against current balances before any
//! movement is recorded, and an unexpected mid-loop failure is undone
//! with offsetting movements before the error propagates.

use std::sync::Arc;

use chrono::Utc;
use shared::{
    validate_quantity, validate_sale_for_finalize, CollectionKind, DateRange, Movement,
    MovementReason, MovementType, NewMovement, Sale, SaleItem, SaleStatus, Scope,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ledger::MovementLedger;
use crate::registry::ProductRegistry;
use crate::store::{load_collection, save_collection, CollectionStore};

pub struct SaleService {
    store: Arc<dyn CollectionStore>,
    scope: Scope,
    ledger: Arc<MovementLedger>,
    registry: Arc<ProductRegistry>,
}

impl SaleService {
    pub fn new(
        store: Arc<dyn CollectionStore>,
        scope: Scope,
        ledger: Arc<MovementLedger>,
        registry: Arc<ProductRegistry>,
    ) -> Self {
        Self { store, scope, ledger, registry }
    }

    fn sales_key(&self) -> String {
        self.scope.collection_key(CollectionKind::Sales)
    }

    /// Start a new open sale
    pub fn new_sale(&self, customer_name: &str) -> Sale {
        Sale {
            id: Uuid::new_v4(),
            customer_name: customer_name.to_string(),
            items: Vec::new(),
            status: SaleStatus::Open,
            date: Utc::now().date_naive(),
        }
    }

    /// Add a product to an open sale, merging with an existing line
    ///
    /// Availability is pre-checked against the cached balance so the
    /// cashier is told immediately; the authoritative check still happens
    /// at finalization.
    pub async fn add_item(&self, sale: &mut Sale, product_id: Uuid, quantity: i64) -> AppResult<()> {
        self.ensure_open(sale)?;
        validate_quantity(quantity).map_err(|message| {
            AppError::validation("quantity", message, "La quantité doit être un entier positif")
        })?;

        let product = self.registry.get_by_id(product_id).await?;
        let already_in_sale = sale
            .items
            .iter()
            .find(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .unwrap_or(0);

        let requested = already_in_sale.checked_add(quantity).ok_or_else(|| {
            AppError::validation(
                "quantity",
                "Quantity overflows the stock balance",
                "La quantité dépasse la capacité du stock",
            )
        })?;
        if requested > product.quantity {
            return Err(AppError::InsufficientStock {
                product_id,
                requested,
                available: product.quantity,
            });
        }

        match sale.items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => item.quantity = requested,
            None => sale.items.push(SaleItem {
                product_id,
                product_name: product.name,
                quantity,
                unit_price: product.selling_price,
            }),
        }
        Ok(())
    }

    pub async fn update_item_quantity(
        &self,
        sale: &mut Sale,
        product_id: Uuid,
        new_quantity: i64,
    ) -> AppResult<()> {
        self.ensure_open(sale)?;
        validate_quantity(new_quantity).map_err(|message| {
            AppError::validation("quantity", message, "La quantité doit être un entier positif")
        })?;

        let product = self.registry.get_by_id(product_id).await?;
        if new_quantity > product.quantity {
            return Err(AppError::InsufficientStock {
                product_id,
                requested: new_quantity,
                available: product.quantity,
            });
        }

        let item = sale
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| AppError::NotFound("Sale item".to_string()))?;
        item.quantity = new_quantity;
        Ok(())
    }

    pub fn remove_item(&self, sale: &mut Sale, product_id: Uuid) -> AppResult<()> {
        self.ensure_open(sale)?;
        let before = sale.items.len();
        sale.items.retain(|item| item.product_id != product_id);
        if sale.items.len() == before {
            return Err(AppError::NotFound("Sale item".to_string()));
        }
        Ok(())
    }

    /// Finalize the sale: validate every line, then record one outgoing
    /// movement per line and persist the sale record
    pub async fn finalize(&self, sale: &mut Sale) -> AppResult<()> {
        validate_sale_for_finalize(sale).map_err(|message| AppError::SaleState(message.to_string()))?;

        // All-or-nothing: check the full sale before recording anything,
        // so a late line cannot leave earlier lines half-applied.
        for item in &sale.items {
            let product = self.registry.get_by_id(item.product_id).await?;
            if item.quantity > product.quantity {
                return Err(AppError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: product.quantity,
                });
            }
        }

        let mut recorded: Vec<Movement> = Vec::with_capacity(sale.items.len());
        for item in &sale.items {
            let mut input = NewMovement::new(
                item.product_id,
                MovementType::Outgoing,
                item.quantity,
                MovementReason::Sale,
            );
            input.note = Some(format!("Vente {}", sale.id));
            match self.ledger.record_movement(input).await {
                Ok(movement) => recorded.push(movement),
                Err(err) => {
                    self.roll_back(&recorded).await;
                    return Err(err);
                }
            }
        }

        sale.status = SaleStatus::Finalized;
        if let Err(err) = self.persist_sale(sale).await {
            sale.status = SaleStatus::Open;
            self.roll_back(&recorded).await;
            return Err(err);
        }

        tracing::info!(sale_id = %sale.id, items = sale.items.len(), total = %sale.total(), "sale finalized");
        Ok(())
    }

    /// Cancel an open sale; terminal, emits no movements
    pub fn cancel(&self, sale: &mut Sale) -> AppResult<()> {
        self.ensure_open(sale)?;
        sale.status = SaleStatus::Cancelled;
        tracing::info!(sale_id = %sale.id, "sale cancelled");
        Ok(())
    }

    pub async fn list_sales(&self) -> AppResult<Vec<Sale>> {
        load_collection(self.store.as_ref(), &self.sales_key()).await
    }

    pub async fn sales_between(&self, range: &DateRange) -> AppResult<Vec<Sale>> {
        let mut sales = self.list_sales().await?;
        sales.retain(|sale| range.contains(sale.date));
        Ok(sales)
    }

    fn ensure_open(&self, sale: &Sale) -> AppResult<()> {
        if !sale.is_open() {
            return Err(AppError::SaleState("Sale is not open".to_string()));
        }
        Ok(())
    }

    async fn persist_sale(&self, sale: &Sale) -> AppResult<()> {
        let mut sales: Vec<Sale> = self.list_sales().await?;
        sales.push(sale.clone());
        save_collection(self.store.as_ref(), &self.sales_key(), &sales).await
    }

    /// Compensate already-recorded sale movements with offsetting entries
    async fn roll_back(&self, recorded: &[Movement]) {
        for movement in recorded {
            let mut input = NewMovement::new(
                movement.product_id,
                MovementType::Incoming,
                movement.quantity,
                MovementReason::ManualAdjustment,
            );
            input.note = Some(format!("Annulation du mouvement {}", movement.id));
            if let Err(err) = self.ledger.record_movement(input).await {
                tracing::warn!(
                    movement_id = %movement.id,
                    %err,
                    "could not compensate movement during sale rollback"
                );
            }
        }
    }
}
