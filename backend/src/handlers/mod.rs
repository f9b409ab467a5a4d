//! HTTP handlers
//!
//! Successful responses share the `{ "success": true, ... }` envelope; the
//! payload fields are flattened next to `success`.

use axum::Json;
use serde::Serialize;

pub mod health;
pub mod inventory;
pub mod month_end;
pub mod products;
pub mod properties;

pub use health::health_check;
pub use inventory::{
    attach_invoice, auto_generate_inventory, delete_inventory, get_inventory,
    reset_invoice_status, sync_inventory_to_sheet, upsert_inventory, verify_sheet,
};
pub use month_end::{
    export_month_end, get_status_counts, list_month_end, record_summary, set_status,
    set_status_batch,
};
pub use products::{get_products_with_stock, list_products, submit_restock};
pub use properties::list_properties;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

/// Wrap a payload in the success envelope
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}
