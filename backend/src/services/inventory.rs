//! Inventory store service for per-property monthly stock and invoice references

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{InventoryLine, InventoryRecord, InvoiceStatus, MonthKey, Product};
use sqlx::PgConnection;
use validator::Validate;

use crate::db::{product_exists, property_exists, Store};
use crate::error::{AppError, AppResult};
use crate::external::GoogleSheetsClient;

const RECORD_COLUMNS: &str =
    "property_id, product_id, month, quantity, invoice_file_id, invoice_status, updated_at";

/// Inventory service for managing monthly inventory records
#[derive(Clone)]
pub struct InventoryService {
    store: Store,
}

/// Result of attaching a generated invoice to a property-month
#[derive(Debug, Clone, Serialize)]
pub struct AttachInvoiceResult {
    pub property_id: String,
    pub month: MonthKey,
    pub file_id: String,
    pub status: InvoiceStatus,
    pub records_updated: u64,
    /// Earlier invoice files for the month that are no longer referenced
    pub replaced_file_ids: Vec<String>,
}

/// Placement of a property-month's quantities in a spreadsheet column
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SheetTarget {
    #[validate(length(min = 1, message = "Sheet id is required"))]
    pub sheet_id: String,
    #[validate(length(min = 1, message = "Sheet name is required"))]
    pub sheet_name: String,
    /// 0-based column index, at most ZZZ
    #[validate(range(max = 18277, message = "Column is beyond the last sheet column (ZZZ)"))]
    pub column_index: usize,
    /// 1-based row of the first catalog product
    #[validate(range(min = 1, max = 10000000, message = "Rows are numbered from 1 to 10000000"))]
    pub start_row: usize,
}

/// Result of projecting inventory into a spreadsheet
#[derive(Debug, Clone, Serialize)]
pub struct SheetSyncResult {
    pub property_id: String,
    pub month: MonthKey,
    pub rows: usize,
    pub cells_updated: usize,
}

/// Upsert planned lines for a property-month and return the stored records.
///
/// One statement: quantities are replaced, invoice fields are kept.
pub async fn upsert_lines(
    conn: &mut PgConnection,
    property_id: &str,
    month: MonthKey,
    lines: &[InventoryLine],
) -> Result<Vec<InventoryRecord>, sqlx::Error> {
    let product_ids: Vec<i32> = lines.iter().map(|l| l.product_id).collect();
    let quantities: Vec<Decimal> = lines.iter().map(|l| l.quantity).collect();

    let mut records = sqlx::query_as::<_, InventoryRecord>(&format!(
        r#"
        INSERT INTO inventory (property_id, product_id, month, quantity)
        SELECT $1, t.product_id, $2, t.quantity
        FROM UNNEST($3::int4[], $4::numeric[]) AS t(product_id, quantity)
        ON CONFLICT (property_id, product_id, month)
        DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
        RETURNING {}
        "#,
        RECORD_COLUMNS
    ))
    .bind(property_id)
    .bind(month.to_string())
    .bind(&product_ids)
    .bind(&quantities)
    .fetch_all(conn)
    .await?;

    records.sort_by_key(|r| r.product_id);
    Ok(records)
}

/// Quantities aligned to catalog order; products without a record get zero
pub fn align_to_catalog(products: &[Product], records: &[InventoryRecord]) -> Vec<Decimal> {
    products
        .iter()
        .map(|product| {
            records
                .iter()
                .find(|r| r.product_id == product.id)
                .map(|r| r.quantity)
                .unwrap_or(Decimal::ZERO)
        })
        .collect()
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Get a property's inventory for a month, in catalog order
    pub async fn get_inventory_by_property(
        &self,
        property_id: &str,
        month: MonthKey,
    ) -> AppResult<Vec<InventoryRecord>> {
        let records = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT i.property_id, i.product_id, i.month, i.quantity, i.invoice_file_id,
                   i.invoice_status, p.name AS product_name, i.updated_at
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            WHERE i.property_id = $1 AND i.month = $2
            ORDER BY p.sort_order, p.id
            "#,
        )
        .bind(property_id)
        .bind(month.to_string())
        .fetch_all(self.store.pool())
        .await?;

        Ok(records)
    }

    /// Insert or update one inventory record
    pub async fn add_or_update_inventory(
        &self,
        property_id: &str,
        product_id: i32,
        month: MonthKey,
        quantity: Decimal,
    ) -> AppResult<InventoryRecord> {
        shared::validate_quantity(quantity).map_err(|m| AppError::field("quantity", m))?;

        let mut tx = self.store.begin().await?;

        if !property_exists(&mut *tx, property_id).await? {
            return Err(AppError::NotFound(format!("Property {}", property_id)));
        }
        if !product_exists(&mut *tx, product_id).await? {
            return Err(AppError::NotFound(format!("Product {}", product_id)));
        }

        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            r#"
            INSERT INTO inventory (property_id, product_id, month, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (property_id, product_id, month)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(property_id)
        .bind(product_id)
        .bind(month.to_string())
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            property_id,
            product_id,
            month = %month,
            quantity = %quantity,
            "Inventory record saved"
        );

        Ok(record)
    }

    /// Delete one inventory record. Returns whether a record existed.
    pub async fn delete_inventory(
        &self,
        property_id: &str,
        product_id: i32,
        month: MonthKey,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM inventory WHERE property_id = $1 AND product_id = $2 AND month = $3",
        )
        .bind(property_id)
        .bind(product_id)
        .bind(month.to_string())
        .execute(self.store.pool())
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(property_id, product_id, month = %month, "Inventory record deleted");
        } else {
            tracing::debug!(property_id, product_id, month = %month, "No inventory record to delete");
        }

        Ok(deleted)
    }

    /// Point every record of a property-month at a generated invoice file
    pub async fn attach_invoice(
        &self,
        property_id: &str,
        month: MonthKey,
        file_id: &str,
        sheet_id: Option<&str>,
        status: Option<InvoiceStatus>,
    ) -> AppResult<AttachInvoiceResult> {
        let status = status.unwrap_or(InvoiceStatus::Draft);
        let mut tx = self.store.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE inventory
            SET invoice_file_id = $3, invoice_status = $4, updated_at = NOW()
            WHERE property_id = $1 AND month = $2
            "#,
        )
        .bind(property_id)
        .bind(month.to_string())
        .bind(file_id)
        .bind(status)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound(format!(
                "Inventory for property {} in {}",
                property_id, month
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO invoice_files (file_id, property_id, month, sheet_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (file_id)
            DO UPDATE SET property_id = EXCLUDED.property_id, month = EXCLUDED.month,
                          sheet_id = EXCLUDED.sheet_id
            "#,
        )
        .bind(file_id)
        .bind(property_id)
        .bind(month.to_string())
        .bind(sheet_id)
        .execute(&mut *tx)
        .await?;

        let replaced_file_ids = delete_orphaned_invoice_files(&mut *tx, property_id, month)
            .await?
            .into_iter()
            .map(|(file_id, _)| file_id)
            .collect::<Vec<_>>();

        tx.commit().await?;

        tracing::info!(
            property_id,
            month = %month,
            file_id,
            records = updated,
            replaced = replaced_file_ids.len(),
            "Invoice attached to inventory"
        );

        Ok(AttachInvoiceResult {
            property_id: property_id.to_string(),
            month,
            file_id: file_id.to_string(),
            status,
            records_updated: updated,
            replaced_file_ids,
        })
    }

    /// Write a property-month's quantities into one spreadsheet column
    pub async fn sync_inventory_to_sheet(
        &self,
        sheets: &GoogleSheetsClient,
        property_id: &str,
        month: MonthKey,
        target: &SheetTarget,
    ) -> AppResult<SheetSyncResult> {
        target.validate()?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, unit_price, sort_order, active
            FROM products
            WHERE active = TRUE
            ORDER BY sort_order, id
            "#,
        )
        .fetch_all(self.store.pool())
        .await?;

        let records = self.get_inventory_by_property(property_id, month).await?;
        let updates = align_to_catalog(&products, &records);

        let cells_updated = sheets
            .update_non_zero_values(
                &target.sheet_id,
                &target.sheet_name,
                target.column_index,
                target.start_row,
                &updates,
            )
            .await?;

        tracing::info!(
            property_id,
            month = %month,
            sheet_id = %target.sheet_id,
            cells_updated,
            "Inventory projected to sheet"
        );

        Ok(SheetSyncResult {
            property_id: property_id.to_string(),
            month,
            rows: updates.len(),
            cells_updated,
        })
    }
}

/// Remove invoice file rows of a property-month that no inventory record references.
///
/// Returns `(file_id, sheet_id)` of every removed row.
pub async fn delete_orphaned_invoice_files(
    conn: &mut PgConnection,
    property_id: &str,
    month: MonthKey,
) -> Result<Vec<(String, Option<String>)>, sqlx::Error> {
    sqlx::query_as::<_, (String, Option<String>)>(
        r#"
        DELETE FROM invoice_files f
        WHERE f.property_id = $1 AND f.month = $2
          AND NOT EXISTS (SELECT 1 FROM inventory i WHERE i.invoice_file_id = f.file_id)
        RETURNING f.file_id, f.sheet_id
        "#,
    )
    .bind(property_id)
    .bind(month.to_string())
    .fetch_all(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i32, sort_order: i32) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            unit_price: Decimal::ONE,
            sort_order,
            active: true,
        }
    }

    fn record(product_id: i32, quantity: i64) -> InventoryRecord {
        InventoryRecord {
            property_id: "prop-1".into(),
            product_id,
            month: MonthKey::new(2024, 5).unwrap(),
            quantity: Decimal::from(quantity),
            invoice_file_id: None,
            invoice_status: None,
            product_name: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_align_to_catalog_fills_gaps_with_zero() {
        let products = vec![product(3, 1), product(1, 2), product(2, 3)];
        let records = vec![record(1, 5), record(2, 7)];
        let aligned = align_to_catalog(&products, &records);
        assert_eq!(
            aligned,
            vec![Decimal::ZERO, Decimal::from(5), Decimal::from(7)]
        );
    }

    #[test]
    fn test_align_to_catalog_ignores_unknown_records() {
        let aligned = align_to_catalog(&[product(1, 1)], &[record(9, 4)]);
        assert_eq!(aligned, vec![Decimal::ZERO]);
    }
}
