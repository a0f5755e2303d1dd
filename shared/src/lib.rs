//! Shared types and models for the Shopstock inventory platform
//!
//! This crate contains the domain types shared between the engine and any
//! frontends (local single-shop mode or the central backend).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
