//! Cohort-size computation: how many distinct agencies contributed per year.

use std::collections::{BTreeMap, BTreeSet};

use crate::metrics::types::Observation;

/// Counts the distinct agencies with at least one observation per year.
///
/// Years with no observations are absent from the map entirely, never
/// present with a zero value, so every returned size is at least 1.
/// Downstream normalization treats a missing year as a fatal error rather
/// than dividing by zero.
pub fn cohort_sizes(observations: &[Observation]) -> BTreeMap<i32, usize> {
    let mut agencies_by_year: BTreeMap<i32, BTreeSet<&str>> = BTreeMap::new();
    for obs in observations {
        agencies_by_year
            .entry(obs.year)
            .or_default()
            .insert(obs.agency.as_str());
    }

    agencies_by_year
        .into_iter()
        .map(|(year, agencies)| (year, agencies.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_agencies_per_year() {
        let observations = vec![
            Observation::new("A", 2020, 1.0),
            Observation::new("B", 2020, 1.0),
            Observation::new("A", 2021, 1.0),
        ];

        let sizes = cohort_sizes(&observations);
        assert_eq!(sizes.get(&2020), Some(&2));
        assert_eq!(sizes.get(&2021), Some(&1));
    }

    #[test]
    fn test_repeat_observations_count_once() {
        let observations = vec![
            Observation::new("A", 2020, 1.0),
            Observation::new("A", 2020, 5.0),
            Observation::new("A", 2020, 2.0),
        ];

        assert_eq!(cohort_sizes(&observations).get(&2020), Some(&1));
    }

    #[test]
    fn test_empty_years_are_absent_not_zero() {
        let observations = vec![Observation::new("A", 2020, 1.0)];

        let sizes = cohort_sizes(&observations);
        assert_eq!(sizes.get(&2019), None);
        assert!(sizes.values().all(|&n| n >= 1));
    }

    #[test]
    fn test_empty_input() {
        assert!(cohort_sizes(&[]).is_empty());
    }
}
