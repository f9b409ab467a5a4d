//! Sheet reconciliation tests
//!
//! The spreadsheet is never authoritative: an unreachable sheet must surface
//! as a verification failure, never as "not found".

use std::time::Duration;

use pbo_backend::external::google_sheets::non_zero_value_ranges;
use pbo_backend::services::reconciler::{
    cell_references_file, find_file_references, parse_range_origin,
};
use pbo_backend::services::SheetReconciler;
use pbo_backend::{AppError, GoogleSheetsClient};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Nothing listens on port 1, so every request fails fast
fn unreachable_client() -> GoogleSheetsClient {
    GoogleSheetsClient::with_base_url(
        "test-token".into(),
        "http://127.0.0.1:1/v4".into(),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn test_unreachable_sheet_is_a_verification_failure() {
    let reconciler = SheetReconciler::new(unreachable_client(), "Invoices!A:Z");
    let err = reconciler
        .verify_invoice_in_sheet("sheet-1", "file-1")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SheetVerificationFailed(_)));
    assert_eq!(err.code(), "SHEET_VERIFICATION_FAILED");
    assert_eq!(err.status_code().as_u16(), 500);
}

#[tokio::test]
async fn test_cleanup_against_unreachable_sheet_is_an_external_error() {
    let reconciler = SheetReconciler::new(unreachable_client(), "Invoices!A:Z");
    let err = reconciler
        .clear_invoice_references("sheet-1", "file-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ExternalService(_)));
}

#[tokio::test]
async fn test_cleanup_needs_a_named_range() {
    let reconciler = SheetReconciler::new(unreachable_client(), "A:Z");
    let err = reconciler
        .clear_invoice_references("sheet-1", "file-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
}

#[tokio::test]
async fn test_all_zero_update_makes_no_request() {
    let written = unreachable_client()
        .update_non_zero_values("sheet-1", "March", 2, 4, &[Decimal::ZERO, Decimal::ZERO])
        .await
        .unwrap();
    assert_eq!(written, 0);
}

#[tokio::test]
async fn test_non_zero_update_against_unreachable_sheet_fails() {
    let err = unreachable_client()
        .update_non_zero_values("sheet-1", "March", 2, 4, &[Decimal::ONE])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ExternalService(ref m) if m.starts_with("Google Sheets request failed")));
}

#[test]
fn test_reference_positions_are_row_major() {
    let rows = vec![
        vec!["x".to_string(), "abc".to_string()],
        vec!["abc".to_string()],
    ];
    let found = find_file_references(&rows, "abc");
    assert_eq!(found.len(), 2);
    assert_eq!((found[0].row, found[0].column), (0, 1));
    assert_eq!((found[1].row, found[1].column), (1, 0));
}

#[test]
fn test_default_range_origin() {
    let origin = parse_range_origin("Invoices!A:Z").unwrap();
    assert_eq!(origin.sheet_name, "Invoices");
    assert_eq!((origin.column, origin.row), (0, 1));
}

mod property_tests {
    use super::*;

    fn file_id_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-]{10,44}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Drive links of every common shape reference their file id
        #[test]
        fn prop_drive_links_reference_their_id(id in file_id_strategy()) {
            let links = [
                format!("https://drive.google.com/file/d/{}/view?usp=sharing", id),
                format!("https://drive.google.com/open?id={}", id),
                format!("=HYPERLINK(\"https://drive.google.com/file/d/{}/view\",\"Invoice\")", id),
                format!("  {}  ", id),
            ];
            for link in &links {
                prop_assert!(cell_references_file(link, &id), "{}", link);
            }
        }

        /// Extending an id makes it a different id
        #[test]
        fn prop_longer_ids_do_not_match(id in file_id_strategy(), extra in "[A-Za-z0-9]{1,4}") {
            let longer = format!("{}{}", id, extra);
            prop_assert!(!cell_references_file(&longer, &id));
            let link = format!("https://drive.google.com/file/d/{}/view", longer);
            prop_assert!(!cell_references_file(&link, &id));
        }

        /// Only non-zero values are written, each to its own row
        #[test]
        fn prop_non_zero_ranges_skip_zeros(
            values in prop::collection::vec(0i64..5, 0..30),
            start_row in 1usize..100,
        ) {
            let updates: Vec<Decimal> = values.iter().map(|v| Decimal::from(*v)).collect();
            let ranges = non_zero_value_ranges("Stock", 1, start_row, &updates).unwrap();
            prop_assert_eq!(ranges.len(), values.iter().filter(|v| **v != 0).count());
            for range in &ranges {
                prop_assert!(range.range.starts_with("'Stock'!B"));
                prop_assert_ne!(range.values[0][0].as_str(), "0");
            }
        }
    }
}
