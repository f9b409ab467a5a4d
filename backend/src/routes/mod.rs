//! Route definitions for the Property Back Office

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/properties", property_routes())
        .nest("/products", product_routes())
        .nest("/inventory", inventory_routes())
        .nest("/month-end", month_end_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .merge(protected)
}

/// Property listing routes
fn property_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_properties))
}

/// Catalog and warehouse stock routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products))
        .route("/stock", get(handlers::get_products_with_stock))
        .route("/restock", post(handlers::submit_restock))
}

/// Inventory routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", put(handlers::upsert_inventory))
        .route("/auto-generate", post(handlers::auto_generate_inventory))
        .route("/attach-invoice", post(handlers::attach_invoice))
        .route("/reset-invoice-status", post(handlers::reset_invoice_status))
        .route("/sync-sheet", post(handlers::sync_inventory_to_sheet))
        .route("/verify-sheet", post(handlers::verify_sheet))
        .route("/:property_id", get(handlers::get_inventory))
        .route(
            "/:property_id/:product_id/:month",
            delete(handlers::delete_inventory),
        )
}

/// Month-end status routes
fn month_end_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_month_end))
        .route("/export", get(handlers::export_month_end))
        .route("/status", put(handlers::set_status))
        .route("/status/batch", post(handlers::set_status_batch))
        .route("/status-counts", get(handlers::get_status_counts))
        .route("/summary", put(handlers::record_summary))
}
