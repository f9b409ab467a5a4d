//! WebAssembly module for the Property Back Office
//!
//! Provides client-side computation for:
//! - Inventory quantity and status validation
//! - Month key arithmetic
//! - Effective stock merging
//! - Month-end status tallies

use std::str::FromStr;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Check an inventory quantity typed into the grid.
///
/// Returns `None` when valid, otherwise the message the server would return.
#[wasm_bindgen]
pub fn check_inventory_quantity(input: &str) -> Option<String> {
    let message = match Decimal::from_str(input.trim()) {
        Ok(quantity) => validate_quantity(quantity).err()?,
        Err(_) => "Quantity must be a non-negative number",
    };
    Some(message.to_string())
}

/// Whether a string is one of the accepted month-end statuses
#[wasm_bindgen]
pub fn is_valid_invoice_status(status: &str) -> bool {
    InvoiceStatus::from_str(status).is_ok()
}

/// Month key for the month before `month` (`YYYY-MM`)
#[wasm_bindgen]
pub fn previous_month_key(month: &str) -> Result<String, JsValue> {
    let key = MonthKey::from_str(month).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(key.previous().to_string())
}

/// Month key for the browser's current local date
#[wasm_bindgen]
pub fn current_month_key() -> Result<String, JsValue> {
    let now = js_sys::Date::new_0();
    let key = MonthKey::new(now.get_full_year() as i32, now.get_month() + 1)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(key.to_string())
}

/// Merge catalog and stock JSON arrays into products with effective quantity
#[wasm_bindgen]
pub fn merge_product_stock(products_json: &str, stock_json: &str) -> Result<String, JsValue> {
    let products: Vec<Product> = serde_json::from_str(products_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid products JSON: {}", e)))?;
    let stock: Vec<StockLevel> = serde_json::from_str(stock_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid stock JSON: {}", e)))?;

    serde_json::to_string(&merge_stock(products, &stock))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Tally a JSON array of status strings; unknown values are counted as `none`
#[wasm_bindgen]
pub fn tally_statuses(statuses_json: &str) -> Result<String, JsValue> {
    let raw: Vec<Option<String>> = serde_json::from_str(statuses_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid statuses JSON: {}", e)))?;

    let counts = tally_raw_statuses(&raw);
    serde_json::to_string(&counts).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn tally_raw_statuses(raw: &[Option<String>]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for value in raw {
        match value.as_deref().map(InvoiceStatus::from_str) {
            Some(Ok(status)) => counts.add(status, 1),
            _ => counts.none += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_status_check() {
        assert!(is_valid_invoice_status("draft"));
        assert!(is_valid_invoice_status("complete"));
        assert!(!is_valid_invoice_status("sent"));
    }

    #[test]
    fn test_check_inventory_quantity() {
        assert_eq!(check_inventory_quantity("3.5"), None);
        assert_eq!(check_inventory_quantity(" 0 "), None);
        assert!(check_inventory_quantity("-1").is_some());
        assert_eq!(
            check_inventory_quantity("lots").as_deref(),
            Some("Quantity must be a non-negative number")
        );
    }

    #[test]
    fn test_previous_month_key() {
        assert_eq!(previous_month_key("2024-01").unwrap(), "2023-12");
        assert_eq!(previous_month_key("2024-10").unwrap(), "2024-09");
    }

    #[test]
    fn test_tally_raw_statuses() {
        let raw = vec![
            Some("draft".to_string()),
            Some("ready".to_string()),
            None,
            Some("bogus".to_string()),
        ];
        let counts = tally_raw_statuses(&raw);
        assert_eq!(counts.draft, 1);
        assert_eq!(counts.ready, 1);
        assert_eq!(counts.complete, 0);
        assert_eq!(counts.none, 2);
    }

    #[test]
    fn test_merge_product_stock_json() {
        let products = r#"[{"id":1,"name":"Towels","unit_price":"3.50","sort_order":1,"active":true}]"#;
        let merged = merge_product_stock(products, "[]").unwrap();
        let value: serde_json::Value = serde_json::from_str(&merged).unwrap();
        assert_eq!(value[0]["name"], "Towels");
        assert_eq!(value[0]["quantity"], "0");
    }
}
