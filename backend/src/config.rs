//! Configuration management for the Property Back Office
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PBO_ prefix

use config::{builder::DefaultState, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::services::generator::GenerationConfig;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Bearer token verification
    pub auth: AuthConfig,

    /// Google Sheets API configuration
    pub sheets: SheetsConfig,

    /// Inventory generation policy
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Log output format
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection before failing the request
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared secret the upstream identity gateway signs tokens with
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetsConfig {
    /// Google Sheets REST endpoint
    pub api_base_url: String,

    /// OAuth access token for the service account
    pub access_token: String,

    /// A1 range scanned when reconciling invoice file ids
    pub reconciliation_range: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InventoryConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PBO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::builder_with_defaults(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PBO_ prefix)
            .add_source(
                Environment::with_prefix("PBO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Builder pre-populated with every default, without files or environment.
    ///
    /// `database.url` and `auth.jwt_secret` have no default and must be supplied.
    pub fn builder_with_defaults(
        environment: &str,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("sheets.api_base_url", "https://sheets.googleapis.com/v4")?
            .set_default("sheets.access_token", "")?
            .set_default("sheets.reconciliation_range", "Invoices!A:Z")?
            .set_default("sheets.timeout_secs", 15)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
