//! Property Back Office - Backend
//!
//! Month-end inventory and invoice reconciliation for a property-management
//! back office: per-property monthly inventory, auto-generation, the month-end
//! status lifecycle, and cross-checks against Google Sheets.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use db::Store;
pub use error::{AppError, AppResult};
pub use external::GoogleSheetsClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<Config>,
    pub sheets: GoogleSheetsClient,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> AppResult<Self> {
        let sheets = GoogleSheetsClient::new(&config.sheets)?;
        Ok(Self {
            store,
            config: Arc::new(config),
            sheets,
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Property Back Office API v1"
}
