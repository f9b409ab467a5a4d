//! HTTP handlers for month-end status and summaries

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{InvoiceStatus, MonthEndRecord, StatusCounts};
use validator::Validate;

use super::{ok, ApiResponse};
use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::services::month_end::BatchOutcome;
use crate::services::MonthEndService;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct PeriodQuery {
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetStatusRequest {
    #[validate(length(min = 1, message = "Property id is required"))]
    pub property_id: String,
    pub year: i32,
    pub month: i32,
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BatchStatusRequest {
    #[validate(length(min = 1, message = "At least one property id is required"))]
    pub property_ids: Vec<String>,
    pub year: i32,
    pub month: i32,
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SummaryRequest {
    #[validate(length(min = 1, message = "Property id is required"))]
    pub property_id: String,
    pub year: i32,
    pub month: i32,
    pub revenue: Decimal,
    #[validate(range(min = 0, message = "Booking count cannot be negative"))]
    pub booking_count: i32,
}

#[derive(Serialize)]
pub struct MonthEndList {
    pub year: i32,
    pub month: i32,
    pub records: Vec<MonthEndRecord>,
}

#[derive(Serialize)]
pub struct SavedMonthEnd {
    pub record: MonthEndRecord,
}

#[derive(Serialize)]
pub struct PeriodCounts {
    pub year: i32,
    pub month: i32,
    pub counts: StatusCounts,
}

/// List month-end records for a period
pub async fn list_month_end(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> AppResult<Json<ApiResponse<MonthEndList>>> {
    query.validate()?;

    let service = MonthEndService::new(state.store);
    let records = service.list_records(query.year, query.month).await?;
    Ok(ok(MonthEndList {
        year: query.year,
        month: query.month,
        records,
    }))
}

/// Download a period's month-end records as CSV
pub async fn export_month_end(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> AppResult<Response> {
    query.validate()?;

    let service = MonthEndService::new(state.store);
    let csv = service.export_csv(query.year, query.month).await?;
    let disposition = format!(
        "attachment; filename=\"month-end-{:04}-{:02}.csv\"",
        query.year, query.month
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// Set one property's month-end status
pub async fn set_status(
    State(state): State<AppState>,
    AppJson(input): AppJson<SetStatusRequest>,
) -> AppResult<Json<ApiResponse<SavedMonthEnd>>> {
    input.validate()?;
    let status: InvoiceStatus = input.status.parse()?;

    let service = MonthEndService::new(state.store);
    let record = service
        .set_status(&input.property_id, input.year, input.month, status)
        .await?;
    Ok(ok(SavedMonthEnd { record }))
}

/// Set one status for many properties, reporting each outcome
pub async fn set_status_batch(
    State(state): State<AppState>,
    AppJson(input): AppJson<BatchStatusRequest>,
) -> AppResult<Json<ApiResponse<BatchOutcome>>> {
    input.validate()?;
    let status: InvoiceStatus = input.status.parse()?;

    let service = MonthEndService::new(state.store);
    let outcome = service
        .set_status_batch(&input.property_ids, input.year, input.month, status)
        .await?;
    Ok(ok(outcome))
}

/// Count properties per status for a period
pub async fn get_status_counts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PeriodQuery>,
) -> AppResult<Json<ApiResponse<PeriodCounts>>> {
    query.validate()?;

    let service = MonthEndService::new(state.store);
    let counts = service.get_status_counts(query.year, query.month).await?;
    Ok(ok(PeriodCounts {
        year: query.year,
        month: query.month,
        counts,
    }))
}

/// Record revenue and booking count for a period
pub async fn record_summary(
    State(state): State<AppState>,
    AppJson(input): AppJson<SummaryRequest>,
) -> AppResult<Json<ApiResponse<SavedMonthEnd>>> {
    input.validate()?;

    let service = MonthEndService::new(state.store);
    let record = service
        .record_summary(
            &input.property_id,
            input.year,
            input.month,
            input.revenue,
            input.booking_count,
        )
        .await?;
    Ok(ok(SavedMonthEnd { record }))
}
