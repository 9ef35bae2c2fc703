//! Listing-count estimation from categorical "openings" designations.
//!
//! Some listing rows carry an ordinal placeholder instead of a number:
//! "Few" means at least 2 openings and "Many" at least 3, while a missing
//! value means exactly 1. The estimates here are deliberate lower bounds on
//! the true counts, not exact figures.

use anyhow::{Context, Result};
use serde::Serialize;

/// Minimum number of listings implied by one openings designation.
///
/// # Errors
///
/// Fails on a designation that is neither a known placeholder nor an
/// integer literal.
pub fn openings_floor(raw: Option<&str>) -> Result<u64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some("Few") => Ok(2),
        Some("Many") => Ok(3),
        Some(other) => other
            .parse::<u64>()
            .with_context(|| format!("unrecognized openings designation: {other:?}")),
    }
}

/// Listing totals estimated from a set of openings designations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListingEstimate {
    /// Literal number of rows.
    pub row_count: u64,
    /// Sum of each row's openings floor; a lower bound on true listings.
    pub estimated_total: u64,
    /// How many listings the literal row count misses.
    pub estimated_undercount: u64,
}

/// Estimates listing totals for a set of rows, one designation per row.
pub fn estimate_listings<'a, I>(designations: I) -> Result<ListingEstimate>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut row_count = 0u64;
    let mut estimated_total = 0u64;

    for designation in designations {
        row_count += 1;
        estimated_total += openings_floor(designation)?;
    }

    Ok(ListingEstimate {
        row_count,
        estimated_total,
        estimated_undercount: estimated_total.saturating_sub(row_count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openings_floor_placeholders() {
        assert_eq!(openings_floor(Some("Few")).unwrap(), 2);
        assert_eq!(openings_floor(Some("Many")).unwrap(), 3);
        assert_eq!(openings_floor(None).unwrap(), 1);
        assert_eq!(openings_floor(Some("")).unwrap(), 1);
        assert_eq!(openings_floor(Some("12")).unwrap(), 12);
    }

    #[test]
    fn test_openings_floor_rejects_garbage() {
        assert!(openings_floor(Some("Several")).is_err());
    }

    #[test]
    fn test_few_rows_undercount() {
        // 3 rows marked "Few": estimate 2 x 3 = 6, undercount 6 - 3 = 3.
        let estimate = estimate_listings(vec![Some("Few"); 3]).unwrap();
        assert_eq!(estimate.row_count, 3);
        assert_eq!(estimate.estimated_total, 6);
        assert_eq!(estimate.estimated_undercount, 3);
    }

    #[test]
    fn test_missing_designations_have_no_undercount() {
        let estimate = estimate_listings(vec![None; 5]).unwrap();
        assert_eq!(estimate.row_count, 5);
        assert_eq!(estimate.estimated_total, 5);
        assert_eq!(estimate.estimated_undercount, 0);
    }

    #[test]
    fn test_mixed_designations() {
        let estimate =
            estimate_listings(vec![Some("Few"), Some("Many"), None, Some("4")]).unwrap();
        assert_eq!(estimate.row_count, 4);
        assert_eq!(estimate.estimated_total, 10);
        assert_eq!(estimate.estimated_undercount, 6);
    }

    #[test]
    fn test_empty_input() {
        let estimate = estimate_listings(Vec::new()).unwrap();
        assert_eq!(estimate.row_count, 0);
        assert_eq!(estimate.estimated_undercount, 0);
    }
}
