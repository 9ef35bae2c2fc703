//! Normalization of aggregates by cohort size.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::metrics::types::{AggregateRecord, NormalizedRecord};

/// Divides each aggregate's value by the cohort size for its year.
///
/// The cohort map must cover every year present in `records`; aggregates and
/// cohort sizes therefore have to come from the same partition of the data.
///
/// # Errors
///
/// Fails if a record carries no year in its key, or if its year has no
/// cohort-size entry. A missing year is surfaced immediately rather than
/// skipped, since it means the aggregates and the cohort map were computed
/// from different inputs.
pub fn normalize_by_cohort(
    records: Vec<AggregateRecord>,
    cohorts: &BTreeMap<i32, usize>,
) -> Result<Vec<NormalizedRecord>> {
    records
        .into_iter()
        .map(|record| {
            let year = record
                .key
                .year
                .context("cannot normalize a record with no year in its key")?;
            let size = cohorts
                .get(&year)
                .with_context(|| format!("no cohort size for year {year}"))?;

            Ok(NormalizedRecord {
                key: record.key,
                value: record.value / *size as f64,
            })
        })
        .collect()
}
