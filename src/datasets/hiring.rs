//! USAJobs hiring analysis for the environmental agencies of interest.
//!
//! Counts listings per agency, estimates the openings the literal row count
//! misses, and derives tech/innovation hiring indicators joined against a
//! workforce reference table.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::rebucket::{MergeRule, canonical_label};
use crate::metrics::undercount::{ListingEstimate, estimate_listings};
use crate::metrics::utility::mean;
use crate::output;
use crate::parser;

/// The ten environmental agencies tracked by this analysis.
pub const AGENCIES: &[&str] = &[
    "Bureau Of Reclamation",
    "National Park Service",
    "National Oceanic And Atmospheric Administration",
    "U.S. Army Corps Of Engineers",
    "Natural Resources Conservation Service",
    "Forest Service",
    "Bureau Of Land Management",
    "U.S. Fish And Wildlife Service",
    "Geological Survey",
    "Environmental Protection Agency",
];

/// Workforce table names that differ from the listing data's agency names.
const WORKFORCE_NAME_RULES: &[MergeRule] = &[
    MergeRule {
        sources: &["Fish And Wildlife Service"],
        target: "U.S. Fish And Wildlife Service",
    },
    MergeRule {
        sources: &["Army Corps Of Engineers"],
        target: "U.S. Army Corps Of Engineers",
    },
];

/// Listings scoring above this count as innovative.
const INNOVATIVE_CUTOFF: f64 = 5.0;

/// Workforce reference year for the tech-to-workforce ratio.
const WORKFORCE_YEAR: i32 = 2024;

/// One row of the USAJobs listing summary.
#[derive(Debug, Deserialize)]
pub struct JobListing {
    pub subagency: String,
    pub openings: Option<String>,
    #[serde(deserialize_with = "parser::de_flag")]
    pub it_specialist: u32,
    #[serde(deserialize_with = "parser::de_flag")]
    pub user_research: u32,
    #[serde(deserialize_with = "parser::de_flag")]
    pub agile_startup_ux: u32,
    #[serde(deserialize_with = "parser::de_flag")]
    pub use_ai: u32,
    #[serde(deserialize_with = "parser::de_flag")]
    pub stem_job: u32,
    pub innovative_score: f64,
}

/// One row of the workforce reference table.
#[derive(Debug, Deserialize)]
pub struct WorkforceRow {
    pub name: String,
    pub year: i32,
    pub total_workforce: f64,
}

/// `usajobs_stats.csv` row.
#[derive(Debug, Serialize)]
pub struct AgencyStats {
    pub agency: String,
    pub num_listings: u64,
    pub num_tech: u64,
    pub expected_tech: f64,
    pub tech_wf_ratio: f64,
    pub num_inno_processes: u64,
    pub num_ai: u64,
    pub num_stem: u64,
    pub inno_max: f64,
    pub inno_tendency: u64,
    pub inno_undercount: u64,
}

/// `usajobs_undercounts.csv` row.
#[derive(Debug, Serialize)]
pub struct UndercountRow {
    pub agency: String,
    pub row_count: u64,
    pub estimated_total: u64,
    pub estimated_undercount: u64,
}

/// Reads the listing summary.
pub fn load_listings(path: &Path) -> Result<Vec<JobListing>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening listing summary {}", path.display()))?;

    let mut listings = Vec::new();
    for result in rdr.deserialize() {
        let listing: JobListing = result?;
        listings.push(listing);
    }

    Ok(listings)
}

/// Reads the workforce table, keeping the reference year and canonicalizing
/// agency names to match the listing data.
pub fn load_workforce(path: &Path) -> Result<BTreeMap<String, f64>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening workforce table {}", path.display()))?;

    let mut workforce = BTreeMap::new();
    for result in rdr.deserialize() {
        let row: WorkforceRow = result?;
        if row.year == WORKFORCE_YEAR {
            let name = canonical_label(WORKFORCE_NAME_RULES, &row.name);
            workforce.insert(name, row.total_workforce);
        }
    }

    Ok(workforce)
}

/// Runs the hiring analysis and writes the derived CSVs into `out_dir`.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn run(input: &Path, workforce_path: &Path, out_dir: &Path) -> Result<()> {
    let listings = load_listings(input)?;
    let workforce = load_workforce(workforce_path)?;
    info!(rows = listings.len(), "Job listings loaded");
    std::fs::create_dir_all(out_dir)?;

    let estimates = listing_estimates(&listings)?;
    let undercount_rows: Vec<UndercountRow> = estimates
        .iter()
        .map(|(agency, estimate)| UndercountRow {
            agency: agency.clone(),
            row_count: estimate.row_count,
            estimated_total: estimate.estimated_total,
            estimated_undercount: estimate.estimated_undercount,
        })
        .collect();

    let stats = agency_stats(&listings, &estimates, &workforce)?;
    output::print_json(&stats)?;

    output::write_rows(out_dir.join("usajobs_undercounts.csv"), &undercount_rows)?;
    output::write_rows(out_dir.join("usajobs_stats.csv"), &stats)
}

/// Estimated listing totals per tracked agency.
pub fn listing_estimates(listings: &[JobListing]) -> Result<BTreeMap<String, ListingEstimate>> {
    let mut estimates = BTreeMap::new();

    for &agency in AGENCIES {
        let estimate = estimate_listings(
            listings
                .iter()
                .filter(|l| l.subagency == agency)
                .map(|l| l.openings.as_deref()),
        )?;
        estimates.insert(agency.to_string(), estimate);
    }

    Ok(estimates)
}

/// Core hiring statistics per tracked agency.
///
/// `expected_tech` is each agency's listing count scaled by the mean
/// tech-listing share across all tracked agencies, a second pass once every
/// agency's own share is known.
pub fn agency_stats(
    listings: &[JobListing],
    estimates: &BTreeMap<String, ListingEstimate>,
    workforce: &BTreeMap<String, f64>,
) -> Result<Vec<AgencyStats>> {
    let mut stats = Vec::new();
    let mut tech_shares = Vec::new();

    for &agency in AGENCIES {
        let rows: Vec<&JobListing> = listings.iter().filter(|l| l.subagency == agency).collect();
        let estimate = estimates
            .get(agency)
            .with_context(|| format!("no listing estimate for agency {agency}"))?;
        let num_listings = estimate.row_count;
        ensure!(num_listings > 0, "no job listings for agency {agency}");

        let num_tech: u64 = rows.iter().map(|l| l.it_specialist as u64).sum();
        let total_workforce = workforce
            .get(agency)
            .with_context(|| format!("agency missing from workforce table: {agency}"))?;

        let innovative: Vec<&JobListing> = rows
            .iter()
            .copied()
            .filter(|l| l.innovative_score > INNOVATIVE_CUTOFF)
            .collect();
        let inno_estimate = estimate_listings(innovative.iter().map(|l| l.openings.as_deref()))?;

        tech_shares.push(num_tech as f64 / num_listings as f64);

        stats.push(AgencyStats {
            agency: agency.to_string(),
            num_listings,
            num_tech,
            expected_tech: 0.0,
            tech_wf_ratio: num_tech as f64 / total_workforce,
            num_inno_processes: rows
                .iter()
                .map(|l| (l.user_research + l.agile_startup_ux) as u64)
                .sum(),
            num_ai: rows.iter().map(|l| l.use_ai as u64).sum(),
            num_stem: rows.iter().map(|l| l.stem_job as u64).sum(),
            inno_max: rows
                .iter()
                .map(|l| l.innovative_score)
                .fold(f64::NEG_INFINITY, f64::max),
            inno_tendency: innovative.len() as u64,
            inno_undercount: inno_estimate.estimated_undercount,
        });
    }

    let mean_share = mean(&tech_shares);
    for stat in &mut stats {
        stat.expected_tech = stat.num_listings as f64 * mean_share;
    }

    Ok(stats)
}
