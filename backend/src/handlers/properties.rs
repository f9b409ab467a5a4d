//! HTTP handlers for property listing

use axum::{extract::State, Json};
use serde::Serialize;
use shared::Property;

use super::{ok, ApiResponse};
use crate::error::AppResult;
use crate::services::PropertyService;
use crate::AppState;

#[derive(Serialize)]
pub struct PropertyList {
    pub properties: Vec<Property>,
}

/// List all properties
pub async fn list_properties(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PropertyList>>> {
    let service = PropertyService::new(state.store);
    let properties = service.list_properties().await?;
    Ok(ok(PropertyList { properties }))
}
