//! Month-end invoice status service
//!
//! Status is a direct-set tag per property and period: any of draft, ready and
//! complete may be written over any other. Resetting an inventory invoice is a
//! separate operation on inventory records and never touches this status.

use std::future::Future;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{InvoiceStatus, MonthEndRecord, MonthKey, StatusCounts};

use crate::db::{property_exists, Store};
use crate::error::{AppError, AppResult};
use crate::services::inventory::delete_orphaned_invoice_files;
use crate::services::reconciler::SheetReconciler;

const CSV_HEADER: [&str; 7] = [
    "property_id",
    "property_name",
    "year",
    "month",
    "status",
    "revenue",
    "booking_count",
];

/// Month-end service for invoice status and period summaries
#[derive(Clone)]
pub struct MonthEndService {
    store: Store,
}

/// Outcome of one element of a batch
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchItemResult {
    pub property_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole batch, results in input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<BatchItemResult>,
    pub succeeded: usize,
    pub failed: usize,
}

/// Cleanup summary of an invoice reset
#[derive(Debug, Clone, Serialize, Default)]
pub struct ResetSummary {
    pub property_id: String,
    pub month: String,
    pub records_cleared: u64,
    /// Invoice file ids the cleared records pointed at
    pub file_ids: Vec<String>,
    /// Invoice file rows deleted because nothing references them any more
    pub artifacts_removed: usize,
    pub sheet_cells_cleared: usize,
    /// Sheet cleanup failures; the store reset is already committed when these occur
    pub sheet_cleanup_errors: Vec<String>,
}

/// Run `op` for every property in order, collecting a result per property.
///
/// A failure is recorded and the batch moves on.
pub async fn run_batch<F, Fut, T>(property_ids: &[String], mut op: F) -> BatchOutcome
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut results = Vec::with_capacity(property_ids.len());
    let mut succeeded = 0;
    let mut failed = 0;

    for property_id in property_ids {
        match op(property_id.clone()).await {
            Ok(_) => {
                succeeded += 1;
                results.push(BatchItemResult {
                    property_id: property_id.clone(),
                    success: true,
                    error: None,
                });
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(property_id = %property_id, error = %e, "Batch item failed");
                results.push(BatchItemResult {
                    property_id: property_id.clone(),
                    success: false,
                    error: Some(e.public_message()),
                });
            }
        }
    }

    BatchOutcome {
        results,
        succeeded,
        failed,
    }
}

/// Render month-end records as CSV with a header row
pub fn render_csv(records: &[MonthEndRecord]) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| AppError::Internal(format!("Failed to write CSV: {}", e));

    writer.write_record(CSV_HEADER).map_err(csv_err)?;
    for record in records {
        let row: [String; 7] = [
            record.property_id.clone(),
            record.property_name.clone().unwrap_or_default(),
            record.year.to_string(),
            record.month.to_string(),
            record.status.to_string(),
            record.revenue.to_string(),
            record.booking_count.to_string(),
        ];
        writer.write_record(&row).map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV is not UTF-8: {}", e)))
}

fn validate_period(year: i32, month: i32) -> AppResult<()> {
    shared::validate_year(year).map_err(|m| AppError::field("year", m))?;
    shared::validate_month_number(month).map_err(|m| AppError::field("month", m))?;
    Ok(())
}

impl MonthEndService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Set the status of one property's month-end record, creating it if needed
    pub async fn set_status(
        &self,
        property_id: &str,
        year: i32,
        month: i32,
        status: InvoiceStatus,
    ) -> AppResult<MonthEndRecord> {
        validate_period(year, month)?;

        let mut tx = self.store.begin().await?;

        if !property_exists(&mut *tx, property_id).await? {
            return Err(AppError::NotFound(format!("Property {}", property_id)));
        }

        let record = sqlx::query_as::<_, MonthEndRecord>(
            r#"
            INSERT INTO month_end (property_id, year, month, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (property_id, year, month)
            DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()
            RETURNING property_id, year, month, status, revenue, booking_count, updated_at
            "#,
        )
        .bind(property_id)
        .bind(year)
        .bind(month)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(property_id, year, month, status = %status, "Month-end status set");

        Ok(record)
    }

    /// Set the same status for many properties, each in its own transaction
    pub async fn set_status_batch(
        &self,
        property_ids: &[String],
        year: i32,
        month: i32,
        status: InvoiceStatus,
    ) -> AppResult<BatchOutcome> {
        validate_period(year, month)?;

        let outcome = run_batch(property_ids, |property_id| async move {
            self.set_status(&property_id, year, month, status).await
        })
        .await;

        tracing::info!(
            year,
            month,
            status = %status,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Batch status update finished"
        );

        Ok(outcome)
    }

    /// Count properties per status for a period
    pub async fn get_status_counts(&self, year: i32, month: i32) -> AppResult<StatusCounts> {
        validate_period(year, month)?;

        let rows = sqlx::query_as::<_, (InvoiceStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM month_end
            WHERE year = $1 AND month = $2
            GROUP BY status
            "#,
        )
        .bind(year)
        .bind(month)
        .fetch_all(self.store.pool())
        .await?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            counts.add(status, n);
        }

        counts.none = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM properties p
            WHERE NOT EXISTS (
                SELECT 1 FROM month_end m
                WHERE m.property_id = p.id AND m.year = $1 AND m.month = $2
            )
            "#,
        )
        .bind(year)
        .bind(month)
        .fetch_one(self.store.pool())
        .await?;

        Ok(counts)
    }

    /// Record revenue and booking count for a period. New records start as draft.
    pub async fn record_summary(
        &self,
        property_id: &str,
        year: i32,
        month: i32,
        revenue: Decimal,
        booking_count: i32,
    ) -> AppResult<MonthEndRecord> {
        validate_period(year, month)?;
        shared::validate_amount(revenue).map_err(|m| AppError::field("revenue", m))?;
        if booking_count < 0 {
            return Err(AppError::field(
                "booking_count",
                "Booking count cannot be negative",
            ));
        }

        let mut tx = self.store.begin().await?;

        if !property_exists(&mut *tx, property_id).await? {
            return Err(AppError::NotFound(format!("Property {}", property_id)));
        }

        let record = sqlx::query_as::<_, MonthEndRecord>(
            r#"
            INSERT INTO month_end (property_id, year, month, revenue, booking_count)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (property_id, year, month)
            DO UPDATE SET revenue = EXCLUDED.revenue,
                          booking_count = EXCLUDED.booking_count,
                          updated_at = NOW()
            RETURNING property_id, year, month, status, revenue, booking_count, updated_at
            "#,
        )
        .bind(property_id)
        .bind(year)
        .bind(month)
        .bind(revenue)
        .bind(booking_count)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(property_id, year, month, revenue = %revenue, booking_count, "Month-end summary recorded");

        Ok(record)
    }

    /// Month-end records of a period with property names
    pub async fn list_records(&self, year: i32, month: i32) -> AppResult<Vec<MonthEndRecord>> {
        validate_period(year, month)?;

        let records = sqlx::query_as::<_, MonthEndRecord>(
            r#"
            SELECT m.property_id, m.year, m.month, m.status, m.revenue, m.booking_count,
                   p.name AS property_name, m.updated_at
            FROM month_end m
            JOIN properties p ON p.id = m.property_id
            WHERE m.year = $1 AND m.month = $2
            ORDER BY p.name, m.property_id
            "#,
        )
        .bind(year)
        .bind(month)
        .fetch_all(self.store.pool())
        .await?;

        Ok(records)
    }

    /// The period listing as CSV
    pub async fn export_csv(&self, year: i32, month: i32) -> AppResult<String> {
        let records = self.list_records(year, month).await?;
        render_csv(&records)
    }

    /// Return a property-month's inventory to "no invoice" and clean up.
    ///
    /// The store reset commits first. Sheet cleanup runs afterwards and its
    /// failures are reported in the summary, not returned as errors.
    pub async fn reset_inventory_invoice_status(
        &self,
        reconciler: &SheetReconciler,
        property_id: &str,
        month: u32,
        year: i32,
    ) -> AppResult<ResetSummary> {
        let period = MonthKey::new(year, month)?;
        let mut summary = ResetSummary {
            property_id: property_id.to_string(),
            month: period.to_string(),
            ..Default::default()
        };

        let mut tx = self.store.begin().await?;

        let locked = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT invoice_file_id
            FROM inventory
            WHERE property_id = $1 AND month = $2
              AND (invoice_file_id IS NOT NULL OR invoice_status IS NOT NULL)
            FOR UPDATE
            "#,
        )
        .bind(property_id)
        .bind(period.to_string())
        .fetch_all(&mut *tx)
        .await?;

        let mut file_ids: Vec<String> = locked.into_iter().flatten().collect();
        file_ids.sort();
        file_ids.dedup();

        summary.records_cleared = sqlx::query(
            r#"
            UPDATE inventory
            SET invoice_file_id = NULL, invoice_status = NULL, updated_at = NOW()
            WHERE property_id = $1 AND month = $2
              AND (invoice_file_id IS NOT NULL OR invoice_status IS NOT NULL)
            "#,
        )
        .bind(property_id)
        .bind(period.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Files detached earlier (records deleted or re-pointed) are swept here too
        let removed = delete_orphaned_invoice_files(&mut *tx, property_id, period).await?;

        tx.commit().await?;

        if summary.records_cleared == 0 && removed.is_empty() {
            tracing::debug!(property_id, month = %period, "No invoice to reset");
            return Ok(summary);
        }

        summary.file_ids = file_ids;
        summary.artifacts_removed = removed.len();

        for (file_id, sheet_id) in &removed {
            let Some(sheet_id) = sheet_id else {
                continue;
            };
            match reconciler.clear_invoice_references(sheet_id, file_id).await {
                Ok(cleared) => summary.sheet_cells_cleared += cleared.len(),
                Err(e) => {
                    tracing::warn!(
                        property_id,
                        file_id = %file_id,
                        sheet_id = %sheet_id,
                        error = %e,
                        "Sheet cleanup failed after invoice reset"
                    );
                    summary
                        .sheet_cleanup_errors
                        .push(format!("{}: {}", file_id, e.public_message()));
                }
            }
        }

        tracing::info!(
            property_id,
            month = %period,
            records = summary.records_cleared,
            artifacts = summary.artifacts_removed,
            cells = summary.sheet_cells_cleared,
            "Invoice status reset"
        );

        Ok(summary)
    }
}
