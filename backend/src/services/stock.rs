//! Product catalog and warehouse stock service

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{merge_stock, Product, ProductWithStock, RestockItem, StockLevel};
use uuid::Uuid;

use crate::db::Store;
use crate::error::{AppError, AppResult};

/// Stock service for the product catalog and global stock levels
#[derive(Clone)]
pub struct StockService {
    store: Store,
}

/// Outcome of a restock submission
#[derive(Debug, Clone, Serialize)]
pub struct RestockResult {
    pub submission_ids: Vec<Uuid>,
    pub stock: Vec<StockLevel>,
}

/// Collapse repeated products into one line each, summing quantities.
///
/// Every quantity must be positive; the first offending line is reported.
pub fn consolidate_restock(items: &[RestockItem]) -> AppResult<Vec<RestockItem>> {
    if items.is_empty() {
        return Err(AppError::field("items", "At least one restock item is required"));
    }

    let mut totals: BTreeMap<i32, Decimal> = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        shared::validate_restock_quantity(item.quantity)
            .map_err(|m| AppError::field(&format!("items[{}].quantity", index), m))?;
        *totals.entry(item.product_id).or_insert(Decimal::ZERO) += item.quantity;
    }

    Ok(totals
        .into_iter()
        .map(|(product_id, quantity)| RestockItem {
            product_id,
            quantity,
        })
        .collect())
}

impl StockService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// All catalog products in catalog order
    pub async fn get_all_products(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, unit_price, sort_order, active
            FROM products
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(self.store.pool())
        .await?;

        Ok(products)
    }

    /// All stock rows
    pub async fn get_all_product_stock(&self) -> AppResult<Vec<StockLevel>> {
        let stock = sqlx::query_as::<_, StockLevel>(
            "SELECT product_id, quantity, updated_at FROM product_stock ORDER BY product_id",
        )
        .fetch_all(self.store.pool())
        .await?;

        Ok(stock)
    }

    /// Catalog with effective stock, zero where no stock row exists
    pub async fn get_products_with_stock(&self) -> AppResult<Vec<ProductWithStock>> {
        let products = self.get_all_products().await?;
        let stock = self.get_all_product_stock().await?;
        Ok(merge_stock(products, &stock))
    }

    /// Record a restock and add its quantities to global stock
    pub async fn submit_restock(
        &self,
        items: &[RestockItem],
        note: Option<&str>,
        submitted_by: &str,
    ) -> AppResult<RestockResult> {
        let lines = consolidate_restock(items)?;
        let product_ids: Vec<i32> = lines.iter().map(|l| l.product_id).collect();

        let mut tx = self.store.begin().await?;

        let known: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1) ORDER BY id")
                .bind(&product_ids)
                .fetch_all(&mut *tx)
                .await?;
        if let Some(missing) = product_ids.iter().find(|id| !known.contains(id)) {
            return Err(AppError::NotFound(format!("Product {}", missing)));
        }

        let mut submission_ids = Vec::with_capacity(lines.len());
        let mut stock = Vec::with_capacity(lines.len());

        for line in &lines {
            let id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO restock_submissions (id, product_id, quantity, note, submitted_by)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(note)
            .bind(submitted_by)
            .execute(&mut *tx)
            .await?;
            submission_ids.push(id);

            let level = sqlx::query_as::<_, StockLevel>(
                r#"
                INSERT INTO product_stock (product_id, quantity)
                VALUES ($1, $2)
                ON CONFLICT (product_id)
                DO UPDATE SET quantity = product_stock.quantity + EXCLUDED.quantity,
                              updated_at = NOW()
                RETURNING product_id, quantity, updated_at
                "#,
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            stock.push(level);
        }

        tx.commit().await?;

        tracing::info!(
            submitted_by,
            products = lines.len(),
            "Restock submitted"
        );

        Ok(RestockResult {
            submission_ids,
            stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: i32, quantity: i64) -> RestockItem {
        RestockItem {
            product_id,
            quantity: Decimal::from(quantity),
        }
    }

    #[test]
    fn test_consolidate_sums_repeated_products() {
        let lines = consolidate_restock(&[item(2, 5), item(1, 3), item(2, 4)]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, 1);
        assert_eq!(lines[0].quantity, Decimal::from(3));
        assert_eq!(lines[1].product_id, 2);
        assert_eq!(lines[1].quantity, Decimal::from(9));
    }

    #[test]
    fn test_consolidate_rejects_non_positive_quantity() {
        let err = consolidate_restock(&[item(1, 3), item(2, 0)]).unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "items[1].quantity"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_consolidate_rejects_empty_submission() {
        assert!(matches!(
            consolidate_restock(&[]),
            Err(AppError::Validation { .. })
        ));
    }
}
