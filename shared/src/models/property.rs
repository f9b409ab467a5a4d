//! Property models

use serde::{Deserialize, Serialize};

/// A managed property. Rows are owned by the property-sync job and read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Property {
    /// Identifier assigned by the booking channel
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub unit_count: i32,
}
