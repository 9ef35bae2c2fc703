//! Group-by aggregation over observations.

use std::collections::{BTreeMap, BTreeSet};

use crate::metrics::types::{AggregateRecord, GroupKey, Observation};
use crate::metrics::utility::mean;

/// How to reduce the values of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
}

/// Which observation fields form the grouping key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grouping {
    pub agency: bool,
    pub category: bool,
    pub year: bool,
}

/// Groups observations by the requested key fields and reduces each group's
/// measure.
///
/// Keys are unique grouping tuples, so ordering of the input is irrelevant;
/// the `BTreeMap` keys give deterministic output ordering for the CSVs.
pub fn aggregate(
    observations: &[Observation],
    grouping: Grouping,
    reduction: Reduction,
) -> Vec<AggregateRecord> {
    let mut groups: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();

    for obs in observations {
        let key = GroupKey {
            agency: grouping.agency.then(|| obs.agency.clone()),
            category: if grouping.category {
                obs.category.clone()
            } else {
                None
            },
            year: grouping.year.then_some(obs.year),
        };
        groups.entry(key).or_default().push(obs.value);
    }

    groups
        .into_iter()
        .map(|(key, values)| {
            let value = match reduction {
                Reduction::Sum => values.iter().sum(),
                Reduction::Mean => mean(&values),
            };
            AggregateRecord { key, value }
        })
        .collect()
}

/// Fills every (agency, year) prefix present in `records` with a zero-valued
/// record for each category in `categories`.
///
/// Call sites that want a dense category grid in their output opt in here;
/// everywhere else an absent combination stays absent.
pub fn fill_missing_categories(
    records: Vec<AggregateRecord>,
    categories: &BTreeSet<String>,
) -> Vec<AggregateRecord> {
    let prefixes: BTreeSet<(Option<String>, Option<i32>)> = records
        .iter()
        .map(|r| (r.key.agency.clone(), r.key.year))
        .collect();

    let mut by_key: BTreeMap<GroupKey, f64> =
        records.into_iter().map(|r| (r.key, r.value)).collect();

    for (agency, year) in &prefixes {
        for category in categories {
            let key = GroupKey {
                agency: agency.clone(),
                category: Some(category.clone()),
                year: *year,
            };
            by_key.entry(key).or_insert(0.0);
        }
    }

    by_key
        .into_iter()
        .map(|(key, value)| AggregateRecord { key, value })
        .collect()
}
