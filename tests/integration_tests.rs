use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use agency_metrics::datasets::{challenges, hiring, oss};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    dir
}

/// Reads a written CSV back into per-row header -> value maps.
fn read_csv(path: &Path) -> Vec<BTreeMap<String, String>> {
    let mut rdr = csv::Reader::from_path(path).expect("output CSV missing");
    let headers = rdr.headers().expect("output CSV has no header").clone();

    rdr.records()
        .map(|record| {
            let record = record.expect("unreadable output row");
            headers
                .iter()
                .map(str::to_string)
                .zip(record.iter().map(str::to_string))
                .collect()
        })
        .collect()
}

#[test]
fn test_challenges_pipeline() {
    let out_dir = scratch_dir("agency_metrics_it_challenges");

    challenges::run(&fixture("challenges.csv"), &out_dir).expect("challenges run failed");

    // 3 environmental challenges in 2020 across 2 departments -> 1.5;
    // the 2015 row is outside the study window and gone.
    let annual = read_csv(&out_dir.join("challenges_by_year.csv"));
    assert_eq!(annual.len(), 3);
    assert_eq!(annual[0]["year"], "2020");
    assert_eq!(annual[0]["challenges"], "1.5");
    assert_eq!(annual[0]["tag"], "environmental");
    assert!(annual
        .iter()
        .any(|row| row["tag"] == "other" && row["year"] == "2021" && row["challenges"] == "1.0"));

    // Per-type normalized totals for the environmental partition: each of
    // the three re-bucketed types had one 2020 challenge over a 2-agency
    // cohort.
    let typed = read_csv(&out_dir.join("enviro_agency_challenge_types_annual.csv"));
    assert_eq!(typed.len(), 3);
    assert!(typed.iter().all(|row| row["challenges"] == "0.5"));
    let types: Vec<&str> = typed.iter().map(|r| r["challenge_type"].as_str()).collect();
    assert!(types.contains(&"Analytics, Tech, Software"));
    assert!(types.contains(&"Creative"));
    assert!(types.contains(&"Ideas, Plans, Nominations"));

    // Dense grid: 4 departments x 3 types observed anywhere in the export.
    let dense = read_csv(&out_dir.join("tech_challenges.csv"));
    assert_eq!(dense.len(), 12);
    assert!(dense.iter().any(|row| {
        row["department"] == "Environmental Protection Agency"
            && row["challenge_type"] == "Creative"
            && row["total_challenges"] == "0.0"
    }));

    let prize = read_csv(&out_dir.join("prize_duration_annual.csv"));
    let env_2020 = prize
        .iter()
        .find(|row| row["year"] == "2020" && row["env_flag"].starts_with("Environmental"))
        .expect("no environmental 2020 row");
    // Prizes 1000, 0 and 5000 average to 2000.
    assert_eq!(env_2020["mean_prize"], "2000.0");
    // Durations 30, 29 and 45 days average to 34.667.
    assert_eq!(env_2020["mean_duration_days"], "34.667");

    fs::remove_dir_all(&out_dir).unwrap();
}

#[test]
fn test_hiring_pipeline() {
    let out_dir = scratch_dir("agency_metrics_it_hiring");

    hiring::run(
        &fixture("usaj_summary.csv"),
        &fixture("workforce.csv"),
        &out_dir,
    )
    .expect("hiring run failed");

    let undercounts = read_csv(&out_dir.join("usajobs_undercounts.csv"));
    assert_eq!(undercounts.len(), 10);
    let epa = undercounts
        .iter()
        .find(|row| row["agency"] == "Environmental Protection Agency")
        .expect("no EPA undercount row");
    // 3 rows marked "Few": estimate 6, undercount 3.
    assert_eq!(epa["row_count"], "3");
    assert_eq!(epa["estimated_total"], "6");
    assert_eq!(epa["estimated_undercount"], "3");
    let forest = undercounts
        .iter()
        .find(|row| row["agency"] == "Forest Service")
        .expect("no Forest Service undercount row");
    assert_eq!(forest["estimated_undercount"], "2");

    let stats = read_csv(&out_dir.join("usajobs_stats.csv"));
    assert_eq!(stats.len(), 10);
    let epa = stats
        .iter()
        .find(|row| row["agency"] == "Environmental Protection Agency")
        .expect("no EPA stats row");
    assert_eq!(epa["num_listings"], "3");
    assert_eq!(epa["num_tech"], "1");
    assert_eq!(epa["num_inno_processes"], "1");
    assert_eq!(epa["num_ai"], "1");
    assert_eq!(epa["num_stem"], "2");
    assert_eq!(epa["inno_max"], "7.0");
    // Scores 6 and 7 clear the innovative cutoff; both rows say "Few".
    assert_eq!(epa["inno_tendency"], "2");
    assert_eq!(epa["inno_undercount"], "2");
    // The workforce join uses the canonicalized agency name.
    let fws = stats
        .iter()
        .find(|row| row["agency"] == "U.S. Fish And Wildlife Service")
        .expect("no FWS stats row");
    let ratio: f64 = fws["tech_wf_ratio"].parse().unwrap();
    assert_eq!(ratio, 0.0);

    fs::remove_dir_all(&out_dir).unwrap();
}

#[test]
fn test_open_source_pipeline() {
    let out_dir = scratch_dir("agency_metrics_it_oss");

    oss::run(
        &fixture("github_languages.csv"),
        &fixture("github_innovation.csv"),
        &out_dir,
    )
    .expect("open-source run failed");

    let numbers = read_csv(&out_dir.join("language_numbers.csv"));
    assert_eq!(numbers.len(), 3);

    let epa = numbers
        .iter()
        .find(|row| row["agency"] == "Environmental Protection Agency")
        .expect("no EPA row");
    assert_eq!(epa["num_repos"], "25");
    assert_eq!(epa["num_lang"], "3");
    assert_eq!(epa["contributor_per_million"], "10");
    assert_eq!(epa["Python_count"], "10");
    assert_eq!(epa["Python_%"], "0.4");
    // EPA has the lowest language score, Geological Survey the highest.
    assert_eq!(epa["nimbleness"], "0");
    let gs = numbers
        .iter()
        .find(|row| row["agency"] == "Geological Survey")
        .expect("no Geological Survey row");
    assert_eq!(gs["nimbleness"], "1");

    // The grid keeps the ranked non-artifact languages for every agency in
    // the language export, including those without overview rows.
    let grid = read_csv(&out_dir.join("top_languages.csv"));
    assert_eq!(grid.len(), 3);
    let forest = grid
        .iter()
        .find(|row| row["agency"] == "Forest Service")
        .expect("no Forest Service grid row");
    assert_eq!(forest["Python"], "1");
    assert_eq!(forest["Rust"], "0");

    fs::remove_dir_all(&out_dir).unwrap();
}
