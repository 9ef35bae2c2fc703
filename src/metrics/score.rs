//! Weighted composite scoring and min-max normalization.

use std::collections::BTreeMap;

use crate::metrics::utility::round3;

/// Computes one agency's composite score from its per-category counts.
///
/// Each count is first divided by `divisor` (the agency's total item count)
/// to get a proportion, then multiplied by the category's weight from the
/// fixed table. Categories absent from the weight table contribute nothing.
/// The result is rounded to 3 decimals.
pub fn weighted_score(
    counts: &BTreeMap<String, f64>,
    divisor: f64,
    weights: &[(&str, f64)],
) -> f64 {
    if divisor <= 0.0 {
        // An agency with no items has no proportions to weight.
        return 0.0;
    }

    let weight_table: BTreeMap<&str, f64> = weights.iter().copied().collect();

    let mut score = 0.0;
    for (category, count) in counts {
        if let Some(weight) = weight_table.get(category.as_str()) {
            score += (count / divisor) * weight;
        }
    }
    round3(score)
}

/// Min-max normalizes scores across agencies into [0, 1].
///
/// The agency with the minimum raw score maps to 0 and the maximum to 1.
/// When every agency has the same score the range is zero, so everyone gets
/// 0.5 instead of a NaN from dividing by zero.
pub fn min_max_normalize(scores: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let min = scores.values().copied().fold(f64::INFINITY, f64::min);
    let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    scores
        .iter()
        .map(|(agency, score)| {
            let normalized = if range.abs() < f64::EPSILON {
                0.5
            } else {
                round3((score - min) / range)
            };
            (agency.clone(), normalized)
        })
        .collect()
}
