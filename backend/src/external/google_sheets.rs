//! Google Sheets API client
//!
//! Thin wrapper over the Sheets v4 `values` endpoints. The store stays the
//! source of truth; sheets are only read for reconciliation and written as a
//! projection. Nothing here retries.

use std::time::Duration;

use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SheetsConfig;
use crate::error::{AppError, AppResult};

/// Google Sheets API client
#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: Client,
    access_token: String,
    base_url: String,
}

/// Range payload used by `values:batchUpdate`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValueRange {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateRequest<'a> {
    value_input_option: &'static str,
    data: &'a [ValueRange],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateResponse {
    #[serde(default)]
    total_updated_cells: Option<usize>,
}

#[derive(Debug, Serialize)]
struct BatchClearRequest<'a> {
    ranges: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl GoogleSheetsClient {
    /// Create a new client from configuration
    pub fn new(config: &SheetsConfig) -> AppResult<Self> {
        Self::with_base_url(
            config.access_token.clone(),
            config.api_base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a client against a custom base URL (for testing)
    pub fn with_base_url(
        access_token: String,
        base_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn values_url(&self, sheet_id: &str, tail: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Configuration(format!("Invalid Sheets base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration("Sheets base URL cannot be a base".to_string()))?
            .extend(["spreadsheets", sheet_id, "values", tail]);
        Ok(url)
    }

    fn batch_url(&self, sheet_id: &str, action: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Configuration(format!("Invalid Sheets base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration("Sheets base URL cannot be a base".to_string()))?
            .extend(["spreadsheets", sheet_id])
            .push(&format!("values:{}", action));
        Ok(url)
    }

    /// Read a range as rows of cell text.
    ///
    /// Formulas are returned as written so hyperlink targets stay visible.
    pub async fn get_sheet_data(&self, sheet_id: &str, range: &str) -> AppResult<Vec<Vec<String>>> {
        let url = self.values_url(sheet_id, range)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueRenderOption", "FORMULA"), ("majorDimension", "ROWS")])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Google Sheets request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Google Sheets API returned {}: {}",
                status, body
            )));
        }

        let data: ValuesResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse Google Sheets response: {}", e))
        })?;

        Ok(data
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Write the non-zero entries of `updates` down one column.
    ///
    /// `updates[i]` lands in row `start_row + i` (1-based) of `column_index`
    /// (0-based). Zero entries are skipped so existing cells are left alone.
    /// Returns the number of cells written.
    pub async fn update_non_zero_values(
        &self,
        sheet_id: &str,
        sheet_name: &str,
        column_index: usize,
        start_row: usize,
        updates: &[Decimal],
    ) -> AppResult<usize> {
        let data = non_zero_value_ranges(sheet_name, column_index, start_row, updates)?;
        if data.is_empty() {
            return Ok(0);
        }

        let url = self.batch_url(sheet_id, "batchUpdate")?;
        let body = BatchUpdateRequest {
            value_input_option: "USER_ENTERED",
            data: &data,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Google Sheets request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Google Sheets API returned {}: {}",
                status, body
            )));
        }

        let result: BatchUpdateResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse Google Sheets response: {}", e))
        })?;

        Ok(result.total_updated_cells.unwrap_or(data.len()))
    }

    /// Clear the given A1 ranges
    pub async fn clear_ranges(&self, sheet_id: &str, ranges: &[String]) -> AppResult<()> {
        if ranges.is_empty() {
            return Ok(());
        }

        let url = self.batch_url(sheet_id, "batchClear")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&BatchClearRequest { ranges })
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Google Sheets request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Google Sheets API returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

/// Render a JSON cell value as the text a user would see in the grid
fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Last addressable column, ZZZ
pub const MAX_COLUMN_INDEX: usize = 18_277;

/// Last addressable row of a Sheets grid
pub const MAX_ROW: usize = 10_000_000;

/// Column letters for a 0-based index (0 -> A, 25 -> Z, 26 -> AA)
pub fn column_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// 0-based index for column letters (A -> 0, AA -> 26); `None` if not letters
/// or past `usize`
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// Quote a sheet name for A1 notation (`My Sheet` -> `'My Sheet'`)
pub fn quote_sheet_name(sheet_name: &str) -> String {
    format!("'{}'", sheet_name.replace('\'', "''"))
}

/// A1 reference of a single cell; `row` is 1-based, `column` 0-based
pub fn a1_cell(sheet_name: &str, column: usize, row: usize) -> String {
    format!("{}!{}{}", quote_sheet_name(sheet_name), column_letter(column), row)
}

/// Build one single-cell update per non-zero value.
///
/// Fails when the column or any written row falls outside the grid.
pub fn non_zero_value_ranges(
    sheet_name: &str,
    column_index: usize,
    start_row: usize,
    updates: &[Decimal],
) -> AppResult<Vec<ValueRange>> {
    if column_index > MAX_COLUMN_INDEX {
        return Err(AppError::field(
            "column_index",
            "Column is beyond the last sheet column (ZZZ)",
        ));
    }

    updates
        .iter()
        .enumerate()
        .filter(|(_, value)| !value.is_zero())
        .map(|(offset, value)| {
            let row = start_row
                .checked_add(offset)
                .filter(|row| (1..=MAX_ROW).contains(row))
                .ok_or_else(|| {
                    AppError::field("start_row", "Rows fall outside the sheet grid")
                })?;
            Ok(ValueRange {
                range: a1_cell(sheet_name, column_index, row),
                values: vec![vec![value.normalize().to_string()]],
            })
        })
        .collect()
}
