//! Inventory management models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::InvoiceStatus;
use crate::types::MonthKey;

/// Stock supplied to one property for one product in one month.
///
/// At most one record exists per `(property_id, product_id, month)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    pub property_id: String,
    pub product_id: i32,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub month: MonthKey,
    pub quantity: Decimal,
    /// Drive file id of the generated invoice, if any
    pub invoice_file_id: Option<String>,
    pub invoice_status: Option<InvoiceStatus>,
    /// Filled in by listing queries that join the catalog
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub product_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A planned inventory line: what the generator intends to write for a product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryLine {
    pub product_id: i32,
    pub quantity: Decimal,
}
