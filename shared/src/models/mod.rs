//! Domain models for the Shopstock inventory platform

mod movement;
mod product;
mod sale;

pub use movement::*;
pub use product::*;
pub use sale::*;
