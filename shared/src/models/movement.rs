//! Stock movement ledger models
//!
//! A movement is the only sanctioned record of a product quantity change.
//! Movements are immutable once recorded: corrections are made by appending
//! offsetting movements, never by editing history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a stock movement
///
/// Older exports used `entry`/`exit` for the same two values; those are
/// accepted on deserialization and collapse to the canonical members.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    #[serde(alias = "entry")]
    Incoming,
    #[serde(alias = "exit")]
    Outgoing,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Incoming => "incoming",
            MovementType::Outgoing => "outgoing",
        }
    }

    /// Sign applied to the quantity when folding a balance
    pub fn signum(&self) -> i64 {
        match self {
            MovementType::Incoming => 1,
            MovementType::Outgoing => -1,
        }
    }
}

/// Cause of a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MovementReason {
    Sale,
    ManualAdjustment,
    Import,
    InitialStock,
    Restock,
    ReconciliationAdjustment,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::Sale => "sale",
            MovementReason::ManualAdjustment => "manual-adjustment",
            MovementReason::Import => "import",
            MovementReason::InitialStock => "initial-stock",
            MovementReason::Restock => "restock",
            MovementReason::ReconciliationAdjustment => "reconciliation-adjustment",
        }
    }
}

/// One recorded stock movement with its balance snapshot
///
/// Stored with the camelCase field names legacy exports already use
/// (`productId`, `stockBefore`, `type`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Denormalized product name, kept for free-text search and audit
    /// after product deletion
    pub product_name: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Magnitude of the change; always positive, sign carried by the type
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub date: NaiveDate,
    /// Monotonic creation sequence; `(date, seq)` is the fold order
    pub seq: u64,
    pub reason: MovementReason,
    pub note: Option<String>,
    /// Supplied by transports that retry, to suppress duplicate application
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<Uuid>,
}

impl Movement {
    /// Signed contribution of this movement to a balance fold
    pub fn signed_quantity(&self) -> i64 {
        self.movement_type.signum() * self.quantity
    }
}

/// Input for recording a movement through the ledger
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovement {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: MovementReason,
    pub note: Option<String>,
    pub idempotency_key: Option<Uuid>,
}

impl NewMovement {
    pub fn new(product_id: Uuid, movement_type: MovementType, quantity: i64, reason: MovementReason) -> Self {
        Self {
            product_id,
            movement_type,
            quantity,
            reason,
            note: None,
            idempotency_key: None,
        }
    }
}
