//! Validation utilities for the Property Back Office
//!
//! These checks run at the HTTP boundary and in the browser bundle, so both
//! reject the same input with the same message.

use rust_decimal::Decimal;

use crate::types::{MAX_YEAR, MIN_YEAR};

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate an inventory quantity (zero is allowed, it records "none supplied")
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity must be a non-negative number");
    }
    Ok(())
}

/// Validate a restock quantity (must add something)
pub fn validate_restock_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Restock quantity must be greater than zero");
    }
    Ok(())
}

/// Validate a monetary amount such as month-end revenue
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Period Validations
// ============================================================================

/// Validate a calendar month number
pub fn validate_month_number(month: i32) -> Result<(), &'static str> {
    if !(1..=12).contains(&month) {
        return Err("Month must be between 1 and 12");
    }
    Ok(())
}

/// Validate an accounting year
pub fn validate_year(year: i32) -> Result<(), &'static str> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err("Year must be between 2000 and 2100");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate an external file identifier (Drive ids are URL-safe tokens)
pub fn validate_file_id(file_id: &str) -> Result<(), &'static str> {
    if file_id.trim().is_empty() {
        return Err("File id is required");
    }
    if !file_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("File id may only contain letters, digits, '-' and '_'");
    }
    Ok(())
}
