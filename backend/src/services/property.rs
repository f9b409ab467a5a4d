//! Property listing service

use shared::Property;

use crate::db::Store;
use crate::error::AppResult;

#[derive(Clone)]
pub struct PropertyService {
    store: Store,
}

impl PropertyService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// All properties ordered by name
    pub async fn list_properties(&self) -> AppResult<Vec<Property>> {
        let properties = sqlx::query_as::<_, Property>(
            "SELECT id, name, address, unit_count FROM properties ORDER BY name, id",
        )
        .fetch_all(self.store.pool())
        .await?;

        Ok(properties)
    }
}
