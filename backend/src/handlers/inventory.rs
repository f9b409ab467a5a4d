//! HTTP handlers for inventory management endpoints

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{InventoryRecord, InvoiceStatus, MonthKey};
use validator::{Validate, ValidationError};

use super::{ok, ApiResponse};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::generator::{GenerateParams, GenerationSummary};
use crate::services::inventory::{AttachInvoiceResult, SheetSyncResult, SheetTarget};
use crate::services::month_end::ResetSummary;
use crate::services::reconciler::VerificationResult;
use crate::services::{GeneratorService, InventoryService, MonthEndService, SheetReconciler};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: MonthKey,
}

#[derive(Serialize)]
pub struct InventoryList {
    pub property_id: String,
    pub month: MonthKey,
    pub inventory: Vec<InventoryRecord>,
}

#[derive(Serialize)]
pub struct SavedRecord {
    pub record: InventoryRecord,
}

#[derive(Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertInventoryRequest {
    #[validate(length(min = 1, message = "Property id is required"))]
    pub property_id: String,
    pub product_id: i32,
    pub month: MonthKey,
    pub quantity: Option<Decimal>,
}

/// Fields are optional so a missing one is reported by name
#[derive(Debug, Deserialize)]
pub struct AutoGenerateRequest {
    pub property_id: Option<String>,
    pub property_name: Option<String>,
    pub month: Option<String>,
    pub year: Option<i32>,
    pub month_number: Option<i32>,
}

fn validate_file_id(file_id: &str) -> Result<(), ValidationError> {
    shared::validate_file_id(file_id).map_err(|m| {
        let mut err = ValidationError::new("file_id");
        err.message = Some(m.into());
        err
    })
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachInvoiceRequest {
    #[validate(length(min = 1, message = "Property id is required"))]
    pub property_id: String,
    pub month: MonthKey,
    #[validate(custom = "validate_file_id")]
    pub file_id: String,
    pub sheet_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetInvoiceRequest {
    #[validate(length(min = 1, message = "Property id is required"))]
    pub property_id: String,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: u32,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SyncSheetRequest {
    #[validate(length(min = 1, message = "Property id is required"))]
    pub property_id: String,
    pub month: MonthKey,
    #[serde(flatten)]
    pub target: SheetTarget,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifySheetRequest {
    #[validate(length(min = 1, message = "Sheet id is required"))]
    pub sheet_id: String,
    #[validate(custom = "validate_file_id")]
    pub file_id: String,
}

/// Get a property's inventory for a month
pub async fn get_inventory(
    State(state): State<AppState>,
    AppPath(property_id): AppPath<String>,
    AppQuery(query): AppQuery<MonthQuery>,
) -> AppResult<Json<ApiResponse<InventoryList>>> {
    let service = InventoryService::new(state.store);
    let inventory = service
        .get_inventory_by_property(&property_id, query.month)
        .await?;
    Ok(ok(InventoryList {
        property_id,
        month: query.month,
        inventory,
    }))
}

/// Create or update one inventory record
pub async fn upsert_inventory(
    State(state): State<AppState>,
    AppJson(input): AppJson<UpsertInventoryRequest>,
) -> AppResult<Json<ApiResponse<SavedRecord>>> {
    input.validate()?;
    let quantity = input.quantity.ok_or_else(|| {
        AppError::field("quantity", "Quantity must be a non-negative number")
    })?;

    let service = InventoryService::new(state.store);
    let record = service
        .add_or_update_inventory(&input.property_id, input.product_id, input.month, quantity)
        .await?;
    Ok(ok(SavedRecord { record }))
}

/// Delete one inventory record; deleting a missing record succeeds
pub async fn delete_inventory(
    State(state): State<AppState>,
    AppPath((property_id, product_id, month)): AppPath<(String, i32, MonthKey)>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let service = InventoryService::new(state.store);
    let deleted = service
        .delete_inventory(&property_id, product_id, month)
        .await?;
    Ok(ok(Deleted { deleted }))
}

/// Generate a property's inventory for a month
pub async fn auto_generate_inventory(
    State(state): State<AppState>,
    AppJson(input): AppJson<AutoGenerateRequest>,
) -> AppResult<Json<ApiResponse<GenerationSummary>>> {
    let params = GenerateParams::from_parts(
        input.property_id,
        input.property_name,
        input.month,
        input.year,
        input.month_number,
    )?;

    let service = GeneratorService::new(state.store, state.config.inventory.generation.clone());
    let summary = service.auto_generate_inventory(&params).await?;
    Ok(ok(summary))
}

/// Record a generated invoice file against a property-month
pub async fn attach_invoice(
    State(state): State<AppState>,
    AppJson(input): AppJson<AttachInvoiceRequest>,
) -> AppResult<Json<ApiResponse<AttachInvoiceResult>>> {
    input.validate()?;
    let status = input
        .status
        .as_deref()
        .map(str::parse::<InvoiceStatus>)
        .transpose()?;

    let service = InventoryService::new(state.store);
    let result = service
        .attach_invoice(
            &input.property_id,
            input.month,
            &input.file_id,
            input.sheet_id.as_deref(),
            status,
        )
        .await?;
    Ok(ok(result))
}

/// Clear a property-month's invoice data and clean up orphaned references
pub async fn reset_invoice_status(
    State(state): State<AppState>,
    AppJson(input): AppJson<ResetInvoiceRequest>,
) -> AppResult<Json<ApiResponse<ResetSummary>>> {
    input.validate()?;

    let reconciler = SheetReconciler::new(
        state.sheets.clone(),
        state.config.sheets.reconciliation_range.clone(),
    );
    let service = MonthEndService::new(state.store);
    let summary = service
        .reset_inventory_invoice_status(&reconciler, &input.property_id, input.month, input.year)
        .await?;
    Ok(ok(summary))
}

/// Project a property-month's quantities into a spreadsheet column
pub async fn sync_inventory_to_sheet(
    State(state): State<AppState>,
    AppJson(input): AppJson<SyncSheetRequest>,
) -> AppResult<Json<ApiResponse<SheetSyncResult>>> {
    input.validate()?;
    input.target.validate()?;

    let service = InventoryService::new(state.store);
    let result = service
        .sync_inventory_to_sheet(&state.sheets, &input.property_id, input.month, &input.target)
        .await?;
    Ok(ok(result))
}

/// Check whether an invoice file id appears in a spreadsheet
pub async fn verify_sheet(
    State(state): State<AppState>,
    AppJson(input): AppJson<VerifySheetRequest>,
) -> AppResult<Json<ApiResponse<VerificationResult>>> {
    input.validate()?;

    let reconciler = SheetReconciler::new(
        state.sheets.clone(),
        state.config.sheets.reconciliation_range.clone(),
    );
    let result = reconciler
        .verify_invoice_in_sheet(&input.sheet_id, &input.file_id)
        .await?;
    Ok(ok(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_request_rejects_malformed_month() {
        let parsed = serde_json::from_value::<UpsertInventoryRequest>(serde_json::json!({
            "property_id": "p-1",
            "product_id": 1,
            "month": "2024-13",
            "quantity": 2
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_upsert_request_allows_missing_quantity() {
        let parsed = serde_json::from_value::<UpsertInventoryRequest>(serde_json::json!({
            "property_id": "p-1",
            "product_id": 1,
            "month": "2024-03"
        }))
        .unwrap();
        assert!(parsed.quantity.is_none());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_attach_request_rejects_unsafe_file_id() {
        let request = AttachInvoiceRequest {
            property_id: "p-1".into(),
            month: "2024-03".parse().unwrap(),
            file_id: "../etc/passwd".into(),
            sheet_id: None,
            status: None,
        };
        let err: AppError = request.validate().unwrap_err().into();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "file_id"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_reset_request_range_checks() {
        let request = ResetInvoiceRequest {
            property_id: "p-1".into(),
            month: 0,
            year: 2024,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_sync_request_flattens_target() {
        let parsed = serde_json::from_value::<SyncSheetRequest>(serde_json::json!({
            "property_id": "p-1",
            "month": "2024-03",
            "sheet_id": "abc",
            "sheet_name": "March",
            "column_index": 3,
            "start_row": 2
        }))
        .unwrap();
        assert_eq!(parsed.target.column_index, 3);
        assert_eq!(parsed.target.sheet_name, "March");
        assert!(parsed.target.validate().is_ok());
    }

    #[test]
    fn test_sync_target_is_bounded_to_the_grid() {
        let target = |column_index: usize, start_row: usize| SheetTarget {
            sheet_id: "abc".into(),
            sheet_name: "March".into(),
            column_index,
            start_row,
        };

        let err: AppError = target(usize::MAX, 2).validate().unwrap_err().into();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "column_index"));

        let err: AppError = target(0, usize::MAX).validate().unwrap_err().into();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "start_row"));

        assert!(target(18_277, 1).validate().is_ok());
        assert!(target(0, 0).validate().is_err());
    }
}
