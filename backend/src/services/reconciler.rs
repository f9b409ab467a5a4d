//! Sheet reconciliation
//!
//! Cross-checks invoice file ids recorded in the store against the
//! reconciliation range of an external spreadsheet, and clears stale
//! references when an invoice is reset.

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::external::google_sheets::{a1_cell, column_index};
use crate::external::GoogleSheetsClient;

/// Top-left corner of an A1 range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOrigin {
    pub sheet_name: String,
    /// 0-based
    pub column: usize,
    /// 1-based
    pub row: usize,
}

/// Position of a matching cell inside the fetched grid (both 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMatch {
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub sheet_id: String,
    pub file_id: String,
    pub exists: bool,
}

#[derive(Clone)]
pub struct SheetReconciler {
    client: GoogleSheetsClient,
    range: String,
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | '?' | '&' | '=' | '#' | '"' | '(' | ')' | ',' | ';')
}

/// Whether a cell refers to `file_id`.
///
/// Either the trimmed cell is the id itself, or the id is one whole segment of
/// a link or formula (`https://drive.google.com/file/d/<id>/view`,
/// `=HYPERLINK("...?id=<id>")`). A longer id that merely contains `file_id`
/// does not match.
pub fn cell_references_file(cell: &str, file_id: &str) -> bool {
    if file_id.is_empty() {
        return false;
    }
    let cell = cell.trim();
    cell == file_id || cell.split(is_separator).any(|segment| segment == file_id)
}

/// Every cell of `rows` that refers to `file_id`, in row-major order
pub fn find_file_references(rows: &[Vec<String>], file_id: &str) -> Vec<CellMatch> {
    rows.iter()
        .enumerate()
        .flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell_references_file(cell, file_id))
                .map(move |(column, _)| CellMatch { row, column })
        })
        .collect()
}

/// Parse the origin of an A1 range such as `Invoices!B2:F` or `'Q1 Owners'!A:Z`.
///
/// Returns `None` when the range has no sheet name or its start is not a cell
/// or column reference.
pub fn parse_range_origin(range: &str) -> Option<RangeOrigin> {
    let (sheet, cells) = range.rsplit_once('!')?;
    let sheet_name = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => sheet.to_string(),
    };
    if sheet_name.is_empty() {
        return None;
    }

    let start = cells.split(':').next()?;
    let digits_at = start
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(start.len());
    let (letters, digits) = start.split_at(digits_at);

    let column = column_index(letters)?;
    let row = if digits.is_empty() {
        1
    } else {
        digits.parse::<usize>().ok().filter(|r| *r > 0)?
    };

    Some(RangeOrigin {
        sheet_name,
        column,
        row,
    })
}

impl SheetReconciler {
    pub fn new(client: GoogleSheetsClient, range: impl Into<String>) -> Self {
        Self {
            client,
            range: range.into(),
        }
    }

    /// Check whether `file_id` appears in the reconciliation range.
    ///
    /// Any failure to read the sheet is reported as
    /// [`AppError::SheetVerificationFailed`], never as `exists: false`.
    pub async fn verify_invoice_in_sheet(
        &self,
        sheet_id: &str,
        file_id: &str,
    ) -> AppResult<VerificationResult> {
        let rows = self
            .client
            .get_sheet_data(sheet_id, &self.range)
            .await
            .map_err(|e| match e {
                AppError::ExternalService(msg) | AppError::Configuration(msg) => {
                    AppError::SheetVerificationFailed(msg)
                }
                other => AppError::SheetVerificationFailed(other.to_string()),
            })?;

        let exists = rows
            .iter()
            .flatten()
            .any(|cell| cell_references_file(cell, file_id));

        tracing::debug!(sheet_id, file_id, exists, "Invoice sheet verification");

        Ok(VerificationResult {
            sheet_id: sheet_id.to_string(),
            file_id: file_id.to_string(),
            exists,
        })
    }

    /// Clear every cell of the reconciliation range that refers to `file_id`.
    ///
    /// Returns the A1 references that were cleared.
    pub async fn clear_invoice_references(
        &self,
        sheet_id: &str,
        file_id: &str,
    ) -> AppResult<Vec<String>> {
        let origin = parse_range_origin(&self.range).ok_or_else(|| {
            AppError::Configuration(format!(
                "Reconciliation range '{}' must name a sheet and a start column",
                self.range
            ))
        })?;

        let rows = self.client.get_sheet_data(sheet_id, &self.range).await?;
        let ranges: Vec<String> = find_file_references(&rows, file_id)
            .into_iter()
            .map(|m| a1_cell(&origin.sheet_name, origin.column + m.column, origin.row + m.row))
            .collect();

        if ranges.is_empty() {
            tracing::debug!(sheet_id, file_id, "No sheet references to clear");
            return Ok(ranges);
        }

        self.client.clear_ranges(sheet_id, &ranges).await?;
        tracing::info!(sheet_id, file_id, cells = ranges.len(), "Cleared invoice references");

        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_cell_matches() {
        assert!(cell_references_file("1AbC_def-9", "1AbC_def-9"));
        assert!(cell_references_file("  1AbC_def-9 \n", "1AbC_def-9"));
    }

    #[test]
    fn test_drive_links_match() {
        let id = "1AbC_def-9";
        assert!(cell_references_file(
            "https://drive.google.com/file/d/1AbC_def-9/view?usp=sharing",
            id
        ));
        assert!(cell_references_file(
            "https://drive.google.com/open?id=1AbC_def-9",
            id
        ));
        assert!(cell_references_file(
            r#"=HYPERLINK("https://drive.google.com/file/d/1AbC_def-9/view","Invoice")"#,
            id
        ));
    }

    #[test]
    fn test_partial_ids_do_not_match() {
        assert!(!cell_references_file("1AbC_def-99", "1AbC_def-9"));
        assert!(!cell_references_file("x1AbC_def-9", "1AbC_def-9"));
        assert!(!cell_references_file("", "1AbC_def-9"));
        assert!(!cell_references_file("anything", ""));
    }

    #[test]
    fn test_find_file_references_positions() {
        let rows = vec![
            vec!["Property".to_string(), "Invoice".to_string()],
            vec!["Sea View".to_string(), "abc123".to_string()],
            vec![],
            vec!["abc123".to_string()],
        ];
        let found = find_file_references(&rows, "abc123");
        assert_eq!(
            found,
            vec![
                CellMatch { row: 1, column: 1 },
                CellMatch { row: 3, column: 0 }
            ]
        );
    }

    #[test]
    fn test_parse_range_origin() {
        assert_eq!(
            parse_range_origin("Invoices!A:Z"),
            Some(RangeOrigin {
                sheet_name: "Invoices".into(),
                column: 0,
                row: 1
            })
        );
        assert_eq!(
            parse_range_origin("'Owner''s Q1'!C4:F"),
            Some(RangeOrigin {
                sheet_name: "Owner's Q1".into(),
                column: 2,
                row: 4
            })
        );
        assert_eq!(parse_range_origin("A1:B2"), None);
        assert_eq!(parse_range_origin("Invoices!12:14"), None);
        assert_eq!(parse_range_origin("Invoices!A0"), None);
    }

    #[test]
    fn test_matches_map_to_absolute_cells() {
        let origin = parse_range_origin("Invoices!B2:F").unwrap();
        let m = CellMatch { row: 1, column: 1 };
        assert_eq!(
            a1_cell(&origin.sheet_name, origin.column + m.column, origin.row + m.row),
            "'Invoices'!C3"
        );
    }
}
