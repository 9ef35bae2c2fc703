//! Innovation challenge analysis.
//!
//! Reads the raw challenge export, derives department / partition / year /
//! prize / duration fields per row, and writes normalized per-year and
//! per-type trend tables plus per-agency totals.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::aggregate::{Grouping, Reduction, aggregate, fill_missing_categories};
use crate::metrics::cohort::cohort_sizes;
use crate::metrics::normalize::normalize_by_cohort;
use crate::metrics::rebucket::{MergeRule, canonical_label, rebucket};
use crate::metrics::types::Observation;
use crate::metrics::utility::round3;
use crate::output;
use crate::parser;

/// Partition label for the environmental / natural resource agencies.
pub const ENV_PARTITION: &str = "Environmental / Natural Resource Agencies";
/// Partition label for everyone else.
pub const OTHER_PARTITION: &str = "All Other Agencies";

/// The two partitions with the tag written to `challenges_by_year.csv`.
const PARTITIONS: &[(&str, &str)] = &[(ENV_PARTITION, "environmental"), (OTHER_PARTITION, "other")];

/// Agency-name fragments that place a challenge in the environmental partition.
const ENV_AGENCY_MARKERS: &[&str] = &[
    "Department of the Interior",
    "Department of Agriculture",
    "Environmental Protection Agency",
    "National Oceanic and Atmospheric Administration",
    "Army Corps",
];

/// Ordered merges collapsing fine-grained challenge types into summary buckets.
pub const CHALLENGE_TYPE_RULES: &[MergeRule] = &[
    MergeRule {
        sources: &[
            "Software and apps",
            "Technology demonstration and hardware",
            "Analytics, visualizations, algorithms",
        ],
        target: "Analytics, Tech, Software",
    },
    MergeRule {
        sources: &["Ideas", "Business plans", "Nominations"],
        target: "Ideas, Plans, Nominations",
    },
    MergeRule {
        sources: &["Creative (multimedia & design)"],
        target: "Creative",
    },
];

/// Study window: challenges starting in [FIRST_YEAR, YEAR_CUTOFF).
const FIRST_YEAR: i32 = 2016;
const YEAR_CUTOFF: i32 = 2025;

/// One row of the raw challenge export.
#[derive(Debug, Deserialize)]
pub struct ChallengeRow {
    #[serde(rename = "Primary Agency Name")]
    pub agency_name: String,
    #[serde(rename = "Challenge Start Date")]
    pub start_date: String,
    #[serde(rename = "Challenge End Date")]
    pub end_date: String,
    #[serde(rename = "Prize Amount")]
    pub prize_amount: String,
    #[serde(rename = "Primary Challenge Type")]
    pub challenge_type: String,
}

/// A challenge row with its derived analysis fields. Each prepared row
/// counts as one challenge.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub department: String,
    pub partition: &'static str,
    pub start_year: i32,
    pub challenge_type: String,
    pub prize: f64,
    pub duration_days: f64,
}

impl Challenge {
    /// Derives the analysis fields from one raw export row.
    pub fn from_row(row: &ChallengeRow) -> Result<Self> {
        let department = match row.agency_name.split_once('-') {
            Some((department, _)) => department.trim().to_string(),
            None => row.agency_name.trim().to_string(),
        };

        let partition = if ENV_AGENCY_MARKERS
            .iter()
            .any(|marker| row.agency_name.contains(marker))
        {
            ENV_PARTITION
        } else {
            OTHER_PARTITION
        };

        Ok(Challenge {
            department,
            partition,
            start_year: parser::parse_year(&row.start_date)?,
            challenge_type: row.challenge_type.trim().to_string(),
            prize: parser::parse_prize(&row.prize_amount)?,
            duration_days: parser::duration_days(&row.start_date, &row.end_date)?,
        })
    }
}

/// `challenges_by_year.csv` row.
#[derive(Debug, Serialize)]
struct AnnualRow {
    year: i32,
    challenges: f64,
    tag: &'static str,
}

/// `*_challenge_types_annual.csv` row.
#[derive(Debug, Serialize)]
struct TypedAnnualRow {
    challenge_type: String,
    year: i32,
    challenges: f64,
}

/// `agency_challenges.csv` row.
#[derive(Debug, Serialize)]
struct AgencyTotalRow {
    department: String,
    env_flag: String,
    total_challenges: f64,
}

/// `tech_challenges.csv` row.
#[derive(Debug, Serialize)]
struct AgencyTypedRow {
    department: String,
    env_flag: String,
    challenge_type: String,
    total_challenges: f64,
}

/// `prize_duration_annual.csv` row.
#[derive(Debug, Serialize)]
struct PrizeDurationRow {
    env_flag: String,
    year: i32,
    mean_prize: f64,
    mean_duration_days: f64,
}

/// Reads and prepares the challenge export, keeping the study years only.
pub fn load_challenges(path: &Path) -> Result<Vec<Challenge>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening challenge export {}", path.display()))?;

    let mut challenges = Vec::new();
    for result in rdr.deserialize() {
        let row: ChallengeRow = result?;
        let challenge = Challenge::from_row(&row)?;
        if (FIRST_YEAR..YEAR_CUTOFF).contains(&challenge.start_year) {
            challenges.push(challenge);
        }
    }

    Ok(challenges)
}

/// Runs every challenge analysis and writes the derived CSVs into `out_dir`.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn run(input: &Path, out_dir: &Path) -> Result<()> {
    let challenges = load_challenges(input)?;
    info!(rows = challenges.len(), "Challenge export loaded");
    std::fs::create_dir_all(out_dir)?;

    write_annual_totals(&challenges, out_dir)?;
    write_typed_annual(&challenges, out_dir)?;
    write_agency_totals(&challenges, out_dir)?;
    write_prize_duration(&challenges, out_dir)?;

    Ok(())
}

fn partition_rows<'a>(challenges: &'a [Challenge], label: &str) -> Vec<&'a Challenge> {
    challenges.iter().filter(|c| c.partition == label).collect()
}

fn observations<F>(challenges: &[&Challenge], measure: F) -> Vec<Observation>
where
    F: Fn(&Challenge) -> f64,
{
    challenges
        .iter()
        .map(|c| {
            Observation::new(c.department.clone(), c.start_year, measure(c))
                .with_category(c.challenge_type.clone())
        })
        .collect()
}

/// Challenges per year per partition, normalized by that partition's cohort
/// size, in long format.
fn write_annual_totals(challenges: &[Challenge], out_dir: &Path) -> Result<()> {
    let mut rows = Vec::new();

    for &(label, tag) in PARTITIONS {
        let subset = partition_rows(challenges, label);
        let obs = observations(&subset, |_| 1.0);
        let cohorts = cohort_sizes(&obs);
        let records = aggregate(
            &obs,
            Grouping {
                year: true,
                ..Grouping::default()
            },
            Reduction::Sum,
        );

        for record in normalize_by_cohort(records, &cohorts)? {
            rows.push(AnnualRow {
                year: record.key.year.context("aggregate row missing its year")?,
                challenges: round3(record.value),
                tag,
            });
        }
    }

    output::print_json(&rows)?;
    output::write_rows(out_dir.join("challenges_by_year.csv"), &rows)
}

/// Re-bucketed challenge type x year totals per partition, normalized by
/// that partition's cohort size. One file per partition.
fn write_typed_annual(challenges: &[Challenge], out_dir: &Path) -> Result<()> {
    const FILES: &[(&str, &str)] = &[
        (ENV_PARTITION, "enviro_agency_challenge_types_annual.csv"),
        (OTHER_PARTITION, "other_agency_challenge_types_annual.csv"),
    ];

    for &(label, file_name) in FILES {
        let subset = partition_rows(challenges, label);
        let obs = rebucket(CHALLENGE_TYPE_RULES, observations(&subset, |_| 1.0));
        let cohorts = cohort_sizes(&obs);
        let records = aggregate(
            &obs,
            Grouping {
                category: true,
                year: true,
                ..Grouping::default()
            },
            Reduction::Sum,
        );

        let rows = normalize_by_cohort(records, &cohorts)?
            .into_iter()
            .map(|record| {
                Ok(TypedAnnualRow {
                    challenge_type: record
                        .key
                        .category
                        .context("aggregate row missing its category")?,
                    year: record.key.year.context("aggregate row missing its year")?,
                    challenges: round3(record.value),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        output::write_rows(out_dir.join(file_name), &rows)?;
    }

    Ok(())
}

/// Unnormalized totals per agency, overall and per re-bucketed type. The
/// per-type table is a dense grid: every agency gets a row for every type
/// observed anywhere in the export, zero-filled where it ran none.
fn write_agency_totals(challenges: &[Challenge], out_dir: &Path) -> Result<()> {
    let categories: BTreeSet<String> = challenges
        .iter()
        .map(|c| canonical_label(CHALLENGE_TYPE_RULES, &c.challenge_type))
        .collect();

    let mut total_rows = Vec::new();
    let mut typed_rows = Vec::new();

    for &(label, _) in PARTITIONS {
        let subset = partition_rows(challenges, label);
        let obs = rebucket(CHALLENGE_TYPE_RULES, observations(&subset, |_| 1.0));

        let totals = aggregate(
            &obs,
            Grouping {
                agency: true,
                ..Grouping::default()
            },
            Reduction::Sum,
        );
        for record in totals {
            total_rows.push(AgencyTotalRow {
                department: record.key.agency.context("aggregate row missing its agency")?,
                env_flag: label.to_string(),
                total_challenges: record.value,
            });
        }

        let typed = aggregate(
            &obs,
            Grouping {
                agency: true,
                category: true,
                ..Grouping::default()
            },
            Reduction::Sum,
        );
        for record in fill_missing_categories(typed, &categories) {
            typed_rows.push(AgencyTypedRow {
                department: record.key.agency.context("aggregate row missing its agency")?,
                env_flag: label.to_string(),
                challenge_type: record
                    .key
                    .category
                    .context("aggregate row missing its category")?,
                total_challenges: record.value,
            });
        }
    }

    output::write_rows(out_dir.join("agency_challenges.csv"), &total_rows)?;
    output::write_rows(out_dir.join("tech_challenges.csv"), &typed_rows)
}

/// Mean prize dollars and mean duration days per (partition, year).
fn write_prize_duration(challenges: &[Challenge], out_dir: &Path) -> Result<()> {
    let mut rows = Vec::new();

    for &(label, _) in PARTITIONS {
        let subset = partition_rows(challenges, label);
        let year_grouping = Grouping {
            year: true,
            ..Grouping::default()
        };
        let prizes = aggregate(
            &observations(&subset, |c| c.prize),
            year_grouping,
            Reduction::Mean,
        );
        let durations: BTreeMap<i32, f64> = aggregate(
            &observations(&subset, |c| c.duration_days),
            year_grouping,
            Reduction::Mean,
        )
        .into_iter()
        .filter_map(|record| record.key.year.map(|year| (year, record.value)))
        .collect();

        for record in prizes {
            let year = record.key.year.context("aggregate row missing its year")?;
            let mean_duration_days = durations
                .get(&year)
                .copied()
                .with_context(|| format!("no duration aggregate for year {year}"))?;
            rows.push(PrizeDurationRow {
                env_flag: label.to_string(),
                year,
                mean_prize: round3(record.value),
                mean_duration_days: round3(mean_duration_days),
            });
        }
    }

    output::write_rows(out_dir.join("prize_duration_annual.csv"), &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(agency: &str, start: &str, end: &str, prize: &str, ty: &str) -> ChallengeRow {
        ChallengeRow {
            agency_name: agency.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            prize_amount: prize.to_string(),
            challenge_type: ty.to_string(),
        }
    }

    #[test]
    fn test_from_row_derives_fields() {
        let row = raw_row(
            "Department of Commerce - National Oceanic and Atmospheric Administration",
            "2020-03-01",
            "2020-04-15",
            "$5,000.00",
            "Software and apps",
        );
        let challenge = Challenge::from_row(&row).unwrap();

        assert_eq!(challenge.department, "Department of Commerce");
        assert_eq!(challenge.partition, ENV_PARTITION);
        assert_eq!(challenge.start_year, 2020);
        assert_eq!(challenge.prize, 5000.0);
        assert_eq!(challenge.duration_days, 45.0);
    }

    #[test]
    fn test_from_row_other_partition() {
        let row = raw_row(
            "National Aeronautics and Space Administration",
            "2021-05-01",
            "2021-06-01",
            "$100.00",
            "Ideas",
        );
        let challenge = Challenge::from_row(&row).unwrap();

        assert_eq!(challenge.partition, OTHER_PARTITION);
        assert_eq!(
            challenge.department,
            "National Aeronautics and Space Administration"
        );
    }

    #[test]
    fn test_from_row_rejects_bad_prize() {
        let row = raw_row("EPA", "2020-01-01", "2020-02-01", "TBD", "Ideas");
        assert!(Challenge::from_row(&row).is_err());
    }

    #[test]
    fn test_mean_prize_per_agency_year() {
        // A cash prize and a no-prize challenge in the same agency and year
        // average to half the cash amount.
        let rows = [
            raw_row(
                "Environmental Protection Agency",
                "2020-01-01",
                "2020-01-31",
                "$1,000.00",
                "Ideas",
            ),
            raw_row(
                "Environmental Protection Agency",
                "2020-02-01",
                "2020-03-01",
                parser::NO_PRIZE_SENTINEL,
                "Ideas",
            ),
        ];
        let challenges: Vec<Challenge> = rows
            .iter()
            .map(|r| Challenge::from_row(r).unwrap())
            .collect();
        assert_eq!(challenges[0].prize, 1000.0);
        assert_eq!(challenges[1].prize, 0.0);

        let refs: Vec<&Challenge> = challenges.iter().collect();
        let records = aggregate(
            &observations(&refs, |c| c.prize),
            Grouping {
                agency: true,
                year: true,
                ..Grouping::default()
            },
            Reduction::Mean,
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 500.0);
    }

    #[test]
    fn test_load_challenges_filters_study_years() {
        let path = format!(
            "{}/agency_metrics_test_challenges.csv",
            std::env::temp_dir().display()
        );
        let content = "\
Primary Agency Name,Challenge Start Date,Challenge End Date,Prize Amount,Primary Challenge Type
Environmental Protection Agency,2020-01-01,2020-01-31,\"$1,000.00\",Software and apps
Department of Energy,2015-01-01,2015-02-01,$99.00,Ideas
";
        std::fs::write(&path, content).unwrap();

        let challenges = load_challenges(Path::new(&path)).unwrap();
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].start_year, 2020);

        std::fs::remove_file(&path).unwrap();
    }
}
