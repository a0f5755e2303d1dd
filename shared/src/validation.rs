//! Validation utilities for the Shopstock inventory platform

use rust_decimal::Decimal;

use crate::models::{CreateProductInput, Sale};

// ============================================================================
// Stock Validations
// ============================================================================

/// Largest quantity a single movement or import row may carry. Keeps
/// balance arithmetic far away from `i64` limits.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Validate a movement quantity: a strictly positive integer magnitude,
/// bounded by [`MAX_QUANTITY`]. The sign of a change is carried by the
/// movement type, never by the quantity itself.
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    if quantity > MAX_QUANTITY {
        return Err("Quantity exceeds the supported maximum");
    }
    Ok(())
}

/// Validate a low-stock threshold
pub fn validate_threshold(threshold: i64) -> Result<(), &'static str> {
    if threshold < 0 {
        return Err("Threshold cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Product Validations
// ============================================================================

pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Product name is required");
    }
    if name.len() > 200 {
        return Err("Product name must be at most 200 characters");
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

pub fn validate_new_product(input: &CreateProductInput) -> Result<(), &'static str> {
    validate_product_name(&input.name)?;
    validate_price(input.purchase_price)?;
    validate_price(input.selling_price)?;
    if input.initial_quantity < 0 {
        return Err("Initial quantity cannot be negative");
    }
    if input.initial_quantity > MAX_QUANTITY {
        return Err("Initial quantity exceeds the supported maximum");
    }
    Ok(())
}

// ============================================================================
// Sale Validations
// ============================================================================

pub fn validate_customer_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Customer name is required");
    }
    Ok(())
}

/// A sale can only be finalized when open, non-empty, and attributed
pub fn validate_sale_for_finalize(sale: &Sale) -> Result<(), &'static str> {
    if !sale.is_open() {
        return Err("Sale is not open");
    }
    if sale.items.is_empty() {
        return Err("Sale has no items");
    }
    validate_customer_name(&sale.customer_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
        assert!(validate_quantity(i64::MAX).is_err());
    }

    #[test]
    fn test_validate_threshold() {
        assert!(validate_threshold(0).is_ok());
        assert!(validate_threshold(10).is_ok());
        assert!(validate_threshold(-1).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Produit 1").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::from(1500)).is_ok());
        assert!(validate_price(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("Client 1").is_ok());
        assert!(validate_customer_name("  ").is_err());
    }

    proptest! {
        #[test]
        fn prop_quantity_validation_matches_sign(q in i64::MIN / 2..i64::MAX / 2) {
            prop_assert_eq!(validate_quantity(q).is_ok(), q > 0 && q <= MAX_QUANTITY);
        }
    }
}
