//! Category re-bucketing: collapses fine-grained labels into summary buckets.

use crate::metrics::types::Observation;

/// One merge rule: any of the source labels rewrites to the target label.
///
/// Rules are applied as an ordered list; a later rule sees the output of an
/// earlier one, so chained merges collapse in a single pass.
#[derive(Debug, Clone)]
pub struct MergeRule {
    pub sources: &'static [&'static str],
    pub target: &'static str,
}

/// Rewrites one label through the rule list in order. Labels matched by no
/// rule pass through unchanged.
pub fn canonical_label(rules: &[MergeRule], label: &str) -> String {
    let mut current = label.to_string();
    for rule in rules {
        if rule.sources.contains(&current.as_str()) {
            current = rule.target.to_string();
        }
    }
    current
}

/// Applies the merge rules to every observation's category.
///
/// Must run before any group-by that uses category as a key, or totals for
/// a merged bucket would stay fragmented across its source labels.
pub fn rebucket(rules: &[MergeRule], observations: Vec<Observation>) -> Vec<Observation> {
    observations
        .into_iter()
        .map(|mut obs| {
            if let Some(category) = obs.category.take() {
                obs.category = Some(canonical_label(rules, &category));
            }
            obs
        })
        .collect()
}
