//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use super::{ok, ApiResponse};
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database = if state.store.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    ok(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
