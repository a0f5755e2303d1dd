//! Shopstock engine
//!
//! Inventory core for the Shopstock platform: the append-only stock
//! movement ledger, the product registry built on top of it, the sale
//! workflow, bulk import merging, and read-only reporting. Persistence is
//! abstracted behind the [`store::CollectionStore`] contract so the same
//! engine runs against a local store or the shared central one.

pub mod config;
pub mod error;
pub mod import;
pub mod ledger;
pub mod registry;
pub mod reporting;
pub mod sales;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use import::{ImportOutcome, ImportService};
pub use ledger::{MovementFilter, MovementLedger};
pub use registry::ProductRegistry;
pub use reporting::ReportingService;
pub use sales::SaleService;
pub use store::{CollectionStore, MemoryStore};
