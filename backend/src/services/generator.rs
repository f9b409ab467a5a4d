//! Monthly inventory generation
//!
//! Builds a property's inventory for a month from the previous month's
//! non-zero lines or from a configured seed list, then upserts the result.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{InventoryLine, InventoryRecord, MonthKey};

use crate::db::{property_exists, Store};
use crate::error::{AppError, AppResult};
use crate::services::inventory::upsert_lines;

/// Where a month's default lines come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPolicy {
    /// Copy last month's non-zero quantities
    CarryOver,
    /// Always use the configured seed list
    Seed,
    /// Carry over when last month has anything, otherwise seed
    #[default]
    CarryOverOrSeed,
}

/// Generation settings (`inventory.generation` in config)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub policy: GenerationPolicy,
    #[serde(default)]
    pub seed: Vec<InventoryLine>,
}

/// Which rule produced a generated month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    CarryOver,
    Seed,
    /// Nothing to carry and no seed configured
    None,
}

/// Lines planned for a month and the rule they came from
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPlan {
    pub source: GenerationSource,
    pub lines: Vec<InventoryLine>,
}

/// Validated arguments of an auto-generate request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateParams {
    pub property_id: String,
    pub property_name: String,
    pub month: MonthKey,
}

impl GenerateParams {
    /// Assemble parameters from loosely supplied request fields.
    ///
    /// All five fields are required, and `month` must name the same period as
    /// `year`/`month_number`.
    pub fn from_parts(
        property_id: Option<String>,
        property_name: Option<String>,
        month: Option<String>,
        year: Option<i32>,
        month_number: Option<i32>,
    ) -> AppResult<Self> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let (property_id, property_name, month, year, month_number) = match (
            non_empty(property_id),
            non_empty(property_name),
            non_empty(month),
            year,
            month_number,
        ) {
            (Some(id), Some(name), Some(month), Some(year), Some(number)) => {
                (id, name, month, year, number)
            }
            (id, name, month, year, number) => {
                let missing: Vec<&str> = [
                    ("property_id", id.is_none()),
                    ("property_name", name.is_none()),
                    ("month", month.is_none()),
                    ("year", year.is_none()),
                    ("month_number", number.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, absent)| absent.then_some(field))
                .collect();

                return Err(AppError::ValidationError(format!(
                    "Missing required parameters: {}",
                    missing.join(", ")
                )));
            }
        };

        shared::validate_month_number(month_number).map_err(|m| AppError::field("month_number", m))?;
        shared::validate_year(year).map_err(|m| AppError::field("year", m))?;

        let key: MonthKey = month.parse()?;
        if key.year() != year || key.month() as i32 != month_number {
            return Err(AppError::field(
                "month",
                format!(
                    "Month '{}' does not match year {} and month number {}",
                    key, year, month_number
                ),
            ));
        }

        Ok(Self {
            property_id: property_id.trim().to_string(),
            property_name: property_name.trim().to_string(),
            month: key,
        })
    }
}

/// Result of one auto-generate call
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub property_id: String,
    pub property_name: String,
    pub month: MonthKey,
    pub source: GenerationSource,
    pub generated: usize,
    pub records: Vec<InventoryRecord>,
}

/// Decide the lines for a month.
///
/// Pure: the same prior month, seed and catalog always yield the same plan,
/// which is what makes regeneration idempotent. Lines for products outside
/// `active_products` are dropped; duplicate seed entries keep the last one.
pub fn plan_lines(
    policy: GenerationPolicy,
    prior: &[InventoryLine],
    seed: &[InventoryLine],
    active_products: &HashSet<i32>,
) -> GenerationPlan {
    let carried = normalize(prior.iter().filter(|l| l.quantity > Decimal::ZERO), active_products);
    let seeded = normalize(seed.iter().filter(|l| l.quantity >= Decimal::ZERO), active_products);

    let (source, lines) = match policy {
        GenerationPolicy::CarryOver => (GenerationSource::CarryOver, carried),
        GenerationPolicy::Seed => (GenerationSource::Seed, seeded),
        GenerationPolicy::CarryOverOrSeed if !carried.is_empty() => {
            (GenerationSource::CarryOver, carried)
        }
        GenerationPolicy::CarryOverOrSeed => (GenerationSource::Seed, seeded),
    };

    if lines.is_empty() {
        return GenerationPlan {
            source: GenerationSource::None,
            lines,
        };
    }

    GenerationPlan { source, lines }
}

fn normalize<'a>(
    lines: impl Iterator<Item = &'a InventoryLine>,
    active_products: &HashSet<i32>,
) -> Vec<InventoryLine> {
    let by_product: BTreeMap<i32, Decimal> = lines
        .filter(|l| active_products.contains(&l.product_id))
        .map(|l| (l.product_id, l.quantity))
        .collect();

    by_product
        .into_iter()
        .map(|(product_id, quantity)| InventoryLine {
            product_id,
            quantity,
        })
        .collect()
}

/// Inventory generator service
#[derive(Clone)]
pub struct GeneratorService {
    store: Store,
    config: GenerationConfig,
}

impl GeneratorService {
    /// Create a new GeneratorService instance
    pub fn new(store: Store, config: GenerationConfig) -> Self {
        Self { store, config }
    }

    /// Generate (or regenerate) a property's inventory for a month.
    ///
    /// Existing records for the month are updated in place and keep their
    /// invoice data; products outside the plan are left untouched.
    pub async fn auto_generate_inventory(
        &self,
        params: &GenerateParams,
    ) -> AppResult<GenerationSummary> {
        let mut tx = self.store.begin().await?;

        if !property_exists(&mut *tx, &params.property_id).await? {
            return Err(AppError::NotFound(format!("Property {}", params.property_id)));
        }

        let prior = sqlx::query_as::<_, (i32, Decimal)>(
            "SELECT product_id, quantity FROM inventory WHERE property_id = $1 AND month = $2",
        )
        .bind(&params.property_id)
        .bind(params.month.previous().to_string())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(product_id, quantity)| InventoryLine {
            product_id,
            quantity,
        })
        .collect::<Vec<_>>();

        let active: HashSet<i32> =
            sqlx::query_scalar::<_, i32>("SELECT id FROM products WHERE active = TRUE")
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

        let plan = plan_lines(self.config.policy, &prior, &self.config.seed, &active);

        if plan.lines.is_empty() {
            tx.commit().await?;
            tracing::debug!(
                property_id = %params.property_id,
                month = %params.month,
                "Nothing to generate"
            );
            return Ok(GenerationSummary {
                property_id: params.property_id.clone(),
                property_name: params.property_name.clone(),
                month: params.month,
                source: plan.source,
                generated: 0,
                records: Vec::new(),
            });
        }

        let records = upsert_lines(&mut *tx, &params.property_id, params.month, &plan.lines).await?;
        tx.commit().await?;

        tracing::info!(
            property_id = %params.property_id,
            property_name = %params.property_name,
            month = %params.month,
            source = ?plan.source,
            lines = records.len(),
            "Generated monthly inventory"
        );

        Ok(GenerationSummary {
            property_id: params.property_id.clone(),
            property_name: params.property_name.clone(),
            month: params.month,
            source: plan.source,
            generated: records.len(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i32, quantity: i64) -> InventoryLine {
        InventoryLine {
            product_id,
            quantity: Decimal::from(quantity),
        }
    }

    fn catalog(ids: &[i32]) -> HashSet<i32> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_carry_over_keeps_non_zero_lines() {
        let prior = vec![line(1, 4), line(2, 0), line(3, 2)];
        let plan = plan_lines(GenerationPolicy::CarryOver, &prior, &[], &catalog(&[1, 2, 3]));
        assert_eq!(plan.source, GenerationSource::CarryOver);
        assert_eq!(plan.lines, vec![line(1, 4), line(3, 2)]);
    }

    #[test]
    fn test_carry_over_or_seed_falls_back_to_seed() {
        let prior = vec![line(1, 0)];
        let seed = vec![line(2, 6), line(1, 1)];
        let plan = plan_lines(GenerationPolicy::CarryOverOrSeed, &prior, &seed, &catalog(&[1, 2]));
        assert_eq!(plan.source, GenerationSource::Seed);
        assert_eq!(plan.lines, vec![line(1, 1), line(2, 6)]);
    }

    #[test]
    fn test_carry_over_or_seed_prefers_carry_over() {
        let prior = vec![line(5, 3)];
        let seed = vec![line(1, 1)];
        let plan = plan_lines(GenerationPolicy::CarryOverOrSeed, &prior, &seed, &catalog(&[1, 5]));
        assert_eq!(plan.source, GenerationSource::CarryOver);
        assert_eq!(plan.lines, vec![line(5, 3)]);
    }

    #[test]
    fn test_seed_policy_ignores_prior_month() {
        let prior = vec![line(1, 9)];
        let seed = vec![line(2, 2)];
        let plan = plan_lines(GenerationPolicy::Seed, &prior, &seed, &catalog(&[1, 2]));
        assert_eq!(plan.lines, vec![line(2, 2)]);
    }

    #[test]
    fn test_inactive_products_are_dropped() {
        let seed = vec![line(1, 1), line(42, 5)];
        let plan = plan_lines(GenerationPolicy::Seed, &[], &seed, &catalog(&[1]));
        assert_eq!(plan.lines, vec![line(1, 1)]);
    }

    #[test]
    fn test_empty_plan_reports_none() {
        let plan = plan_lines(GenerationPolicy::CarryOverOrSeed, &[], &[], &catalog(&[1]));
        assert_eq!(plan.source, GenerationSource::None);
        assert!(plan.lines.is_empty());
    }

    #[test]
    fn test_duplicate_seed_entries_keep_last() {
        let seed = vec![line(1, 1), line(1, 7)];
        let plan = plan_lines(GenerationPolicy::Seed, &[], &seed, &catalog(&[1]));
        assert_eq!(plan.lines, vec![line(1, 7)]);
    }

    #[test]
    fn test_params_report_every_missing_field() {
        let err = GenerateParams::from_parts(None, Some(" ".into()), None, Some(2024), None)
            .unwrap_err();
        let message = err.public_message();
        assert!(message.contains("property_id"));
        assert!(message.contains("property_name"));
        assert!(message.contains("month"));
        assert!(message.contains("month_number"));
        assert!(!message.contains("year"));
    }

    #[test]
    fn test_params_reject_mismatched_period() {
        let err = GenerateParams::from_parts(
            Some("prop-1".into()),
            Some("Harbour Loft".into()),
            Some("2024-03".into()),
            Some(2024),
            Some(4),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "month"));
    }

    #[test]
    fn test_params_accept_consistent_input() {
        let params = GenerateParams::from_parts(
            Some(" prop-1 ".into()),
            Some("Harbour Loft".into()),
            Some("2024-03".into()),
            Some(2024),
            Some(3),
        )
        .unwrap();
        assert_eq!(params.property_id, "prop-1");
        assert_eq!(params.month.to_string(), "2024-03");
    }

    #[test]
    fn test_params_reject_bad_month_number() {
        let err = GenerateParams::from_parts(
            Some("prop-1".into()),
            Some("Harbour Loft".into()),
            Some("2024-03".into()),
            Some(2024),
            Some(13),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "month_number"));
    }
}
