//! Error handling for the Shopstock engine
//!
//! Provides structured errors with consistent French and English messages.
//! The engine never swallows an error: on any error return, no partial
//! movement has been durably recorded.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Engine error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business rule errors
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i64,
        available: i64,
    },

    #[error("Sale state error: {0}")]
    SaleState(String),

    // Concurrency errors
    #[error("Could not acquire the ledger write lock in time")]
    LockTimeout,

    // Persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Import errors
    #[error("Import error: {0}")]
    Import(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Import(err.to_string())
    }
}

/// Error detail handed to UI collaborators, which own user-facing messaging
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn detail(&self) -> ErrorDetail {
        match self {
            AppError::Validation { field, message, message_fr } => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message_en: message.clone(),
                message_fr: message_fr.clone(),
                field: Some(field.clone()),
            },
            AppError::NotFound(resource) => ErrorDetail {
                code: "NOT_FOUND".to_string(),
                message_en: format!("{} not found", resource),
                message_fr: format!("{} non trouvé", resource),
                field: None,
            },
            AppError::InsufficientStock { product_id, requested, available } => ErrorDetail {
                code: "INSUFFICIENT_STOCK".to_string(),
                message_en: format!(
                    "Insufficient stock for product {}: requested {}, available {}",
                    product_id, requested, available
                ),
                message_fr: format!(
                    "Quantité insuffisante en stock pour le produit {} : demandé {}, disponible {}",
                    product_id, requested, available
                ),
                field: None,
            },
            AppError::SaleState(msg) => ErrorDetail {
                code: "SALE_STATE_ERROR".to_string(),
                message_en: msg.clone(),
                message_fr: format!("État de vente invalide : {}", msg),
                field: None,
            },
            AppError::LockTimeout => ErrorDetail {
                code: "CONCURRENCY_ERROR".to_string(),
                message_en: "The operation could not acquire the ledger in time; retry the whole operation".to_string(),
                message_fr: "L'opération n'a pas pu obtenir le registre à temps ; réessayez l'opération complète".to_string(),
                field: None,
            },
            AppError::Storage(msg) => ErrorDetail {
                code: "STORAGE_ERROR".to_string(),
                message_en: format!("Storage error: {}", msg),
                message_fr: format!("Erreur de stockage : {}", msg),
                field: None,
            },
            AppError::Import(msg) => ErrorDetail {
                code: "IMPORT_ERROR".to_string(),
                message_en: format!("Import error: {}", msg),
                message_fr: format!("Erreur d'importation : {}", msg),
                field: None,
            },
            AppError::Internal(_) => ErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message_en: "An internal error occurred".to_string(),
                message_fr: "Une erreur interne s'est produite".to_string(),
                field: None,
            },
        }
    }

    /// Build a validation error from a shared validation helper message
    pub fn validation(field: &str, message: &'static str, message_fr: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_fr: message_fr.to_string(),
        }
    }
}

/// Result type alias for engine services
pub type AppResult<T> = Result<T, AppError>;
