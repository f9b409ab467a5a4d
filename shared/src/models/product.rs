//! Product catalog and stock models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A consumable supplied to properties (linen packs, toiletries, cleaning stock)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub unit_price: Decimal,
    /// Row order in catalog listings and spreadsheet projections
    pub sort_order: i32,
    pub active: bool,
}

/// Global warehouse quantity for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub product_id: i32,
    pub quantity: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Catalog entry with its effective warehouse quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductWithStock {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: Decimal,
}

/// One line of a restock submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockItem {
    pub product_id: i32,
    pub quantity: Decimal,
}

/// Merge the catalog with stock levels.
///
/// Products without a stock row get a quantity of zero. Catalog order is kept.
pub fn merge_stock(products: Vec<Product>, stock: &[StockLevel]) -> Vec<ProductWithStock> {
    let by_product: HashMap<i32, Decimal> = stock
        .iter()
        .map(|level| (level.product_id, level.quantity))
        .collect();

    products
        .into_iter()
        .map(|product| {
            let quantity = by_product
                .get(&product.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            ProductWithStock { product, quantity }
        })
        .collect()
}
