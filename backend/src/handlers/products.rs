//! HTTP handlers for the product catalog and warehouse stock

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared::{Product, ProductWithStock, RestockItem};
use validator::Validate;

use super::{ok, ApiResponse};
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::{require_role, CurrentUser};
use crate::services::stock::RestockResult;
use crate::services::StockService;
use crate::AppState;

/// Roles allowed to add stock
const RESTOCK_ROLES: [&str; 2] = ["admin", "inventory"];

#[derive(Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

#[derive(Serialize)]
pub struct ProductStockList {
    pub products: Vec<ProductWithStock>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RestockRequest {
    #[validate(length(min = 1, message = "At least one restock item is required"))]
    pub items: Vec<RestockItem>,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// List the catalog
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let service = StockService::new(state.store);
    let products = service.get_all_products().await?;
    Ok(ok(ProductList { products }))
}

/// List the catalog with effective stock
pub async fn get_products_with_stock(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductStockList>>> {
    let service = StockService::new(state.store);
    let products = service.get_products_with_stock().await?;
    Ok(ok(ProductStockList { products }))
}

/// Submit a restock
pub async fn submit_restock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    AppJson(input): AppJson<RestockRequest>,
) -> AppResult<Json<ApiResponse<RestockResult>>> {
    require_role(&current_user.0, &RESTOCK_ROLES)?;
    input.validate()?;

    let service = StockService::new(state.store);
    let result = service
        .submit_restock(&input.items, input.note.as_deref(), &current_user.0.subject)
        .await?;
    Ok(ok(result))
}
