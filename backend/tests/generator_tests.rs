//! Inventory generation tests
//!
//! Covers the planning rules behind auto-generation:
//! - regenerating a month yields the same lines (no duplicates, no drift)
//! - carry-over only copies non-zero lines for active products
//! - request parameters are validated before anything is written

use std::collections::HashSet;

use pbo_backend::services::generator::{
    plan_lines, GenerateParams, GenerationPolicy, GenerationSource,
};
use pbo_backend::AppError;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::InventoryLine;

fn line(product_id: i32, quantity: i64) -> InventoryLine {
    InventoryLine {
        product_id,
        quantity: Decimal::from(quantity),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[test]
fn test_carry_over_copies_quantities() {
    let active: HashSet<i32> = [1, 2, 3].into_iter().collect();
    let prior = vec![line(1, 4), line(2, 0), line(3, 9)];

    let plan = plan_lines(GenerationPolicy::CarryOver, &prior, &[], &active);
    assert_eq!(plan.source, GenerationSource::CarryOver);
    assert_eq!(plan.lines, vec![line(1, 4), line(3, 9)]);
}

#[test]
fn test_first_month_uses_seed() {
    let active: HashSet<i32> = [1, 2].into_iter().collect();
    let seed = vec![line(1, 2), line(2, 4)];

    let plan = plan_lines(GenerationPolicy::CarryOverOrSeed, &[], &seed, &active);
    assert_eq!(plan.source, GenerationSource::Seed);
    assert_eq!(plan.lines, seed);
}

#[test]
fn test_all_zero_prior_month_falls_back_to_seed() {
    let active: HashSet<i32> = [1, 2].into_iter().collect();
    let plan = plan_lines(
        GenerationPolicy::CarryOverOrSeed,
        &[line(1, 0), line(2, 0)],
        &[line(2, 6)],
        &active,
    );
    assert_eq!(plan.source, GenerationSource::Seed);
    assert_eq!(plan.lines, vec![line(2, 6)]);
}

#[test]
fn test_missing_parameters_are_named() {
    let err = GenerateParams::from_parts(Some("p-1".into()), None, None, Some(2024), None)
        .unwrap_err();
    match err {
        AppError::ValidationError(msg) => {
            assert!(msg.contains("property_name"));
            assert!(msg.contains("month_number"));
            assert!(!msg.contains("property_id"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_blank_parameters_count_as_missing() {
    let err = GenerateParams::from_parts(
        Some("  ".into()),
        Some("Sea View".into()),
        Some("2024-03".into()),
        Some(2024),
        Some(3),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(ref m) if m.contains("property_id")));
}

#[test]
fn test_december_rolls_back_from_january() {
    let params = GenerateParams::from_parts(
        Some("p-1".into()),
        Some("Sea View".into()),
        Some("2025-01".into()),
        Some(2025),
        Some(1),
    )
    .unwrap();
    assert_eq!(params.month.previous().to_string(), "2024-12");
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn line_strategy() -> impl Strategy<Value = InventoryLine> {
        (1i32..20, 0i64..500).prop_map(|(product_id, cents)| InventoryLine {
            product_id,
            quantity: Decimal::new(cents, 1),
        })
    }

    fn policy_strategy() -> impl Strategy<Value = GenerationPolicy> {
        prop_oneof![
            Just(GenerationPolicy::CarryOver),
            Just(GenerationPolicy::Seed),
            Just(GenerationPolicy::CarryOverOrSeed),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Planning twice from the same inputs gives the same lines
        #[test]
        fn prop_plan_is_deterministic(
            policy in policy_strategy(),
            prior in prop::collection::vec(line_strategy(), 0..15),
            seed in prop::collection::vec(line_strategy(), 0..10),
            active in prop::collection::hash_set(1i32..20, 0..20),
        ) {
            let first = plan_lines(policy, &prior, &seed, &active);
            let second = plan_lines(policy, &prior, &seed, &active);
            prop_assert_eq!(first, second);
        }

        /// A plan never names a product twice, so one upsert per key suffices
        #[test]
        fn prop_plan_has_unique_active_products(
            policy in policy_strategy(),
            prior in prop::collection::vec(line_strategy(), 0..15),
            seed in prop::collection::vec(line_strategy(), 0..10),
            active in prop::collection::hash_set(1i32..20, 0..20),
        ) {
            let plan = plan_lines(policy, &prior, &seed, &active);
            let ids: Vec<i32> = plan.lines.iter().map(|l| l.product_id).collect();
            let unique: HashSet<i32> = ids.iter().copied().collect();
            prop_assert_eq!(ids.len(), unique.len());
            prop_assert!(ids.iter().all(|id| active.contains(id)));
            prop_assert!(plan.lines.iter().all(|l| l.quantity >= Decimal::ZERO));
        }

        /// Carried lines are always positive
        #[test]
        fn prop_carry_over_skips_zero_lines(
            prior in prop::collection::vec(line_strategy(), 0..15),
            active in prop::collection::hash_set(1i32..20, 0..20),
        ) {
            let plan = plan_lines(GenerationPolicy::CarryOver, &prior, &[], &active);
            prop_assert!(plan.lines.iter().all(|l| l.quantity > Decimal::ZERO));
            if plan.lines.is_empty() {
                prop_assert_eq!(plan.source, GenerationSource::None);
            }
        }

        /// A month string that disagrees with year/month_number is rejected
        #[test]
        fn prop_mismatched_period_is_rejected(
            year in 2000i32..=2100,
            month in 1i32..=12,
            other in 1i32..=12,
        ) {
            prop_assume!(month != other);
            let result = GenerateParams::from_parts(
                Some("p-1".into()),
                Some("Sea View".into()),
                Some(format!("{:04}-{:02}", year, month)),
                Some(year),
                Some(other),
            );
            prop_assert!(result.is_err());
        }
    }
}
