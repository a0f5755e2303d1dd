//! Stock movement ledger
//!
//! Append-only log of quantity-changing events. Every change to a product
//! quantity — sale, manual adjustment, import, initial stock — is recorded
//! here as an immutable movement carrying a before/after balance snapshot,
//! and the product's cached quantity is only ever written from the
//! resulting `stock_after`. Balances can always be recomputed from the log
//! and reconciled against the cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shared::{
    validate_quantity, CollectionKind, DateRange, Movement, MovementReason, MovementType,
    NewMovement, Product, Scope,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{load_collection, save_collection, CollectionStore};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Filter for movement queries; all criteria are optional and combined
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub date_range: Option<DateRange>,
    /// Case-insensitive match over product name, reason, and note
    pub search: Option<String>,
}

impl MovementFilter {
    fn matches(&self, movement: &Movement) -> bool {
        if let Some(product_id) = self.product_id {
            if movement.product_id != product_id {
                return false;
            }
        }
        if let Some(movement_type) = self.movement_type {
            if movement.movement_type != movement_type {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(movement.date) {
                return false;
            }
        }
        if let Some(query) = &self.search {
            let query = query.to_lowercase();
            let note_match = movement
                .note
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&query));
            if !movement.product_name.to_lowercase().contains(&query)
                && !movement.reason.as_str().contains(&query)
                && !note_match
            {
                return false;
            }
        }
        true
    }
}

/// The movement ledger service
///
/// The read-validate-append-save unit runs under a single ledger-wide
/// writer lock: the store contract persists the movements collection as a
/// whole, so the collection itself is the shared write unit. Two
/// concurrent outgoing movements can therefore never both read the same
/// stale balance and both pass the non-negativity check.
pub struct MovementLedger {
    store: Arc<dyn CollectionStore>,
    scope: Scope,
    write_lock: Mutex<()>,
    lock_timeout: Duration,
}

impl MovementLedger {
    pub fn new(store: Arc<dyn CollectionStore>, scope: Scope) -> Self {
        Self {
            store,
            scope,
            write_lock: Mutex::new(()),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    fn movements_key(&self) -> String {
        self.scope.collection_key(CollectionKind::Movements)
    }

    fn products_key(&self) -> String {
        self.scope.collection_key(CollectionKind::Products)
    }

    async fn load_movements(&self) -> AppResult<Vec<Movement>> {
        load_collection(self.store.as_ref(), &self.movements_key()).await
    }

    async fn load_products(&self) -> AppResult<Vec<Product>> {
        load_collection(self.store.as_ref(), &self.products_key()).await
    }

    /// Acquire the writer lock, converting a timeout into a reported error
    /// rather than a hang
    ///
    /// Crate-internal so the registry can serialize its own writes to the
    /// products collection with ledger appends.
    pub(crate) async fn acquire_write_lock(&self) -> AppResult<tokio::sync::MutexGuard<'_, ()>> {
        tokio::time::timeout(self.lock_timeout, self.write_lock.lock())
            .await
            .map_err(|_| AppError::LockTimeout)
    }

    /// Record a movement and write the new balance back to the product's
    /// cached quantity, as one atomic unit
    ///
    /// This is the only sanctioned path for changing a product quantity.
    /// Returns the created movement, including its assigned id, sequence
    /// number and `stock_after`.
    pub async fn record_movement(&self, input: NewMovement) -> AppResult<Movement> {
        validate_quantity(input.quantity).map_err(|message| {
            AppError::validation(
                "quantity",
                message,
                "La quantité doit être un entier positif",
            )
        })?;

        let _guard = self.acquire_write_lock().await?;
        self.record_locked(input).await
    }

    pub(crate) async fn record_locked(&self, input: NewMovement) -> AppResult<Movement> {
        let mut movements = self.load_movements().await?;

        // A replayed request with a known idempotency key must not
        // double-apply; hand back the movement recorded the first time.
        if let Some(key) = input.idempotency_key {
            if let Some(existing) = movements
                .iter()
                .find(|m| m.idempotency_key == Some(key))
            {
                tracing::debug!(%key, movement_id = %existing.id, "idempotent replay suppressed");
                return Ok(existing.clone());
            }
        }

        let mut products = self.load_products().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == input.product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let stock_before = product.quantity;
        let stock_after = stock_before
            .checked_add(input.movement_type.signum() * input.quantity)
            .ok_or_else(balance_overflow)?;
        if stock_after < 0 {
            return Err(AppError::InsufficientStock {
                product_id: product.id,
                requested: input.quantity,
                available: stock_before,
            });
        }

        let movement = Movement {
            id: Uuid::new_v4(),
            product_id: product.id,
            product_name: product.name.clone(),
            movement_type: input.movement_type,
            quantity: input.quantity,
            stock_before,
            stock_after,
            date: Utc::now().date_naive(),
            seq: next_seq(&movements),
            reason: input.reason,
            note: input.note,
            idempotency_key: input.idempotency_key,
        };

        product.quantity = stock_after;

        let previous = movements.clone();
        movements.push(movement.clone());
        save_collection(self.store.as_ref(), &self.movements_key(), &movements).await?;

        if let Err(err) = save_collection(self.store.as_ref(), &self.products_key(), &products).await
        {
            // The movement went in but the balance write failed: restore the
            // ledger so no partial unit is left behind, then report failure.
            if let Err(restore_err) =
                save_collection(self.store.as_ref(), &self.movements_key(), &previous).await
            {
                tracing::warn!(%restore_err, "could not restore ledger after balance write failure");
            }
            return Err(err);
        }

        tracing::info!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            movement_type = movement.movement_type.as_str(),
            quantity = movement.quantity,
            stock_after = movement.stock_after,
            reason = movement.reason.as_str(),
            "movement recorded"
        );

        Ok(movement)
    }

    /// Recompute a product balance purely from its movement history,
    /// folding in `(date, seq)` order
    pub async fn reconcile_balance(&self, product_id: Uuid) -> AppResult<i64> {
        let movements = self.load_movements().await?;
        Ok(fold_balance(&movements, product_id))
    }

    /// Compare the authoritative ledger balance with the cached product
    /// quantity and, on drift, append one reconciliation adjustment that
    /// accounts for the unexplained difference
    ///
    /// The adjustment takes the ledger balance as its `stock_before` so
    /// that after it, the fold again equals the cached quantity. Returns
    /// `None` when ledger and cache already agree.
    pub async fn correct_drift(&self, product_id: Uuid) -> AppResult<Option<Movement>> {
        let _guard = self.acquire_write_lock().await?;

        let mut movements = self.load_movements().await?;
        let products = self.load_products().await?;
        let product = products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let ledger_balance = fold_balance(&movements, product_id);
        let cached = product.quantity;
        let delta = cached.checked_sub(ledger_balance).ok_or_else(balance_overflow)?;
        if delta == 0 {
            return Ok(None);
        }

        tracing::warn!(
            %product_id,
            cached,
            ledger_balance,
            delta,
            "balance drift detected, recording reconciliation adjustment"
        );

        let movement = Movement {
            id: Uuid::new_v4(),
            product_id,
            product_name: product.name.clone(),
            movement_type: if delta > 0 {
                MovementType::Incoming
            } else {
                MovementType::Outgoing
            },
            quantity: delta.checked_abs().ok_or_else(balance_overflow)?,
            stock_before: ledger_balance,
            stock_after: cached,
            date: Utc::now().date_naive(),
            seq: next_seq(&movements),
            reason: MovementReason::ReconciliationAdjustment,
            note: None,
            idempotency_key: None,
        };

        movements.push(movement.clone());
        save_collection(self.store.as_ref(), &self.movements_key(), &movements).await?;

        Ok(Some(movement))
    }

    /// Query movements; the result is a finite snapshot ordered by
    /// `(date, seq)` so that folds over it are deterministic
    pub async fn query_movements(&self, filter: &MovementFilter) -> AppResult<Vec<Movement>> {
        let mut movements = self.load_movements().await?;
        movements.retain(|m| filter.matches(m));
        movements.sort_by_key(|m| (m.date, m.seq));
        Ok(movements)
    }

    /// Most recent movements first
    pub async fn recent_movements(&self, limit: usize) -> AppResult<Vec<Movement>> {
        let mut movements = self.load_movements().await?;
        movements.sort_by(|a, b| (b.date, b.seq).cmp(&(a.date, a.seq)));
        movements.truncate(limit);
        Ok(movements)
    }

    /// Total quantity received across all products
    pub async fn total_incoming(&self) -> AppResult<i64> {
        let movements = self.load_movements().await?;
        Ok(movements
            .iter()
            .filter(|m| m.movement_type == MovementType::Incoming)
            .map(|m| m.quantity)
            .sum())
    }

    /// Total quantity shipped out across all products
    pub async fn total_outgoing(&self) -> AppResult<i64> {
        let movements = self.load_movements().await?;
        Ok(movements
            .iter()
            .filter(|m| m.movement_type == MovementType::Outgoing)
            .map(|m| m.quantity)
            .sum())
    }

    /// Net stock across all products, derived from the ledger
    pub async fn total_balance(&self) -> AppResult<i64> {
        let movements = self.load_movements().await?;
        Ok(movements.iter().map(Movement::signed_quantity).sum())
    }
}

fn balance_overflow() -> AppError {
    AppError::validation(
        "quantity",
        "Quantity overflows the stock balance",
        "La quantité dépasse la capacité du stock",
    )
}

fn next_seq(movements: &[Movement]) -> u64 {
    movements.iter().map(|m| m.seq).max().unwrap_or(0) + 1
}

fn fold_balance(movements: &[Movement], product_id: Uuid) -> i64 {
    let mut for_product: Vec<&Movement> = movements
        .iter()
        .filter(|m| m.product_id == product_id)
        .collect();
    for_product.sort_by_key(|m| (m.date, m.seq));
    for_product.iter().map(|m| m.signed_quantity()).sum()
}
