//! Open-source repository language analysis.
//!
//! Reads the wide agency-by-language count export plus a per-agency
//! repository overview, scores each agency on how much of its open code
//! uses widely known languages, and writes the per-agency language numbers
//! and the retained top-language grid.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use tracing::info;

use crate::metrics::score::{min_max_normalize, weighted_score};
use crate::metrics::utility::round3;
use crate::output;

/// Language popularity weights from the Stack Overflow 2024 developer
/// survey (most popular technologies, professional developers).
pub static LANGUAGE_WEIGHTS: &[(&str, f64)] = &[
    ("JavaScript", 0.646),
    ("SQL", 0.541),
    ("CSS", 0.529),
    ("Python", 0.469),
    ("TypeScript", 0.434),
    ("Shell", 0.342),
    ("Java", 0.3),
    ("C#", 0.288),
    ("C++", 0.203),
    ("PHP", 0.187),
    ("C", 0.169),
    ("Go", 0.144),
    ("PowerShell", 0.14),
    ("Rust", 0.117),
    ("Kotlin", 0.099),
    ("Dart", 0.06),
    ("Ruby", 0.058),
    ("Lua", 0.053),
    ("Swift", 0.049),
    ("Visual Basic Net", 0.041),
    ("Assembly", 0.04),
    ("Groovy", 0.038),
    ("Visual Basic 6.0", 0.031),
    ("R", 0.031),
    ("MATLAB", 0.03),
    ("Scala", 0.029),
    ("Objective-C", 0.023),
    ("Perl", 0.023),
    ("Elixir", 0.023),
    ("Pascal", 0.018),
    ("GDScript", 0.018),
    ("Haskell", 0.016),
    ("Clojure", 0.013),
    ("NewLisp", 0.013),
    ("MicroPython", 0.011),
    ("Solidity", 0.011),
    ("Erlang", 0.009),
    ("Zig", 0.009),
    ("F#", 0.009),
    ("Fortran", 0.008),
    ("Apex", 0.008),
    ("Julia", 0.008),
    ("Ada", 0.007),
    ("Prolog", 0.006),
    ("Cobol", 0.006),
    ("OCaml", 0.005),
    ("Crystal", 0.003),
    ("Zephyr", 0.003),
    ("Nim", 0.002),
];

/// Columns in the language export that are tooling artifacts or styling,
/// not languages an engineer is hired for.
const NOT_LANGUAGES: &[&str] = &[
    "HTML",
    "Makefile",
    "Dockerfile",
    "Jupyter Notebook",
    "Batchfile",
    "M4",
    "Procfile",
    "Vue",
    "Smarty",
    "CMake",
    "JavaScript",
    "CSS",
    "Shell",
    "TeX",
    "Inno Setup",
    "SCSS",
];

/// Rows that are rollups or offices rather than single agencies.
const EXCLUDED_AGENCIES: &[&str] = &[
    "DOI-Departmental Offices",
    "Farm Service Agency",
    "Office of Natural Resources Revenue",
];

/// How many top-total languages to consider before artifact filtering.
const TOP_LANGUAGES: usize = 20;

/// Agency x language count grid read from the wide export.
#[derive(Debug)]
pub struct LanguageTable {
    languages: Vec<String>,
    counts: BTreeMap<String, Vec<f64>>,
}

impl LanguageTable {
    /// Reads the wide export: first column agency name, one column per
    /// language. Empty cells count as zero.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)
            .with_context(|| format!("opening language export {}", path.display()))?;

        let headers = rdr.headers()?.clone();
        ensure!(headers.len() > 1, "language export has no language columns");
        let languages: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut counts = BTreeMap::new();
        for result in rdr.records() {
            let record = result?;
            let agency = record
                .get(0)
                .context("language row missing its agency name")?
                .trim()
                .to_string();

            let mut row = Vec::with_capacity(languages.len());
            for (i, language) in languages.iter().enumerate() {
                let raw = record
                    .get(i + 1)
                    .with_context(|| format!("row for {agency} missing column {language}"))?
                    .trim();
                let value = if raw.is_empty() {
                    0.0
                } else {
                    raw.parse::<f64>().with_context(|| {
                        format!("unparseable count for {agency}/{language}: {raw:?}")
                    })?
                };
                row.push(value);
            }
            counts.insert(agency, row);
        }

        Ok(LanguageTable { languages, counts })
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Drops language columns nobody uses.
    pub fn drop_zero_columns(&mut self) {
        let keep: Vec<usize> = (0..self.languages.len())
            .filter(|&i| self.counts.values().any(|row| row[i] != 0.0))
            .collect();

        self.languages = keep.iter().map(|&i| self.languages[i].clone()).collect();
        for row in self.counts.values_mut() {
            *row = keep.iter().map(|&i| row[i]).collect();
        }
    }

    /// Drops rows for the named agencies.
    pub fn drop_agencies(&mut self, agencies: &[&str]) {
        for agency in agencies {
            self.counts.remove(*agency);
        }
    }

    /// Language counts for one agency, keyed by language name.
    pub fn agency_counts(&self, agency: &str) -> Option<BTreeMap<String, f64>> {
        self.counts.get(agency).map(|row| {
            self.languages
                .iter()
                .cloned()
                .zip(row.iter().copied())
                .collect()
        })
    }

    /// New table restricted to the given columns, in the given order.
    pub fn select(&self, languages: &[String]) -> Result<LanguageTable> {
        let indices = languages
            .iter()
            .map(|language| {
                self.languages
                    .iter()
                    .position(|l| l == language)
                    .with_context(|| format!("unknown language column: {language}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let counts = self
            .counts
            .iter()
            .map(|(agency, row)| {
                (
                    agency.clone(),
                    indices.iter().map(|&i| row[i]).collect::<Vec<_>>(),
                )
            })
            .collect();

        Ok(LanguageTable {
            languages: languages.to_vec(),
            counts,
        })
    }

    /// Per-language totals across all agencies.
    fn totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.languages.len()];
        for row in self.counts.values() {
            for (total, value) in totals.iter_mut().zip(row) {
                *total += value;
            }
        }
        totals
    }
}

/// One row of the repository overview export.
#[derive(Debug, Clone)]
pub struct InnovationOverview {
    pub agency: String,
    pub num_repos: f64,
    pub num_contributors: f64,
    pub repo_per_million: f64,
    pub total_funding: f64,
}

/// Reads the repository overview. The agency name is the first column;
/// the numeric columns are located by header name.
pub fn load_overview(path: &Path) -> Result<Vec<InnovationOverview>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening repository overview {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing column {name:?} in {}", path.display()))
    };
    let num_repos_col = column("num_repos")?;
    let num_contributors_col = column("num_contributors")?;
    let repo_per_million_col = column("repo_per_million")?;
    let total_funding_col = column("total_funding")?;

    let mut overview = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let agency = record
            .get(0)
            .context("overview row missing its agency name")?
            .trim()
            .to_string();

        let number = |idx: usize| -> Result<f64> {
            let raw = record
                .get(idx)
                .with_context(|| format!("short overview row for {agency}"))?;
            raw.trim()
                .parse::<f64>()
                .with_context(|| format!("unparseable number for {agency}: {raw:?}"))
        };

        let num_repos = number(num_repos_col)?;
        let num_contributors = number(num_contributors_col)?;
        let repo_per_million = number(repo_per_million_col)?;
        let total_funding = number(total_funding_col)?;

        overview.push(InnovationOverview {
            agency,
            num_repos,
            num_contributors,
            repo_per_million,
            total_funding,
        });
    }

    Ok(overview)
}

/// Runs the open-source analysis and writes the derived CSVs into `out_dir`.
#[tracing::instrument(skip_all, fields(languages = %languages_path.display(), innovation = %innovation_path.display()))]
pub fn run(languages_path: &Path, innovation_path: &Path, out_dir: &Path) -> Result<()> {
    let mut table = LanguageTable::from_path(languages_path)?;
    let overview = load_overview(innovation_path)?;
    info!(
        agencies = table.counts.len(),
        languages = table.languages.len(),
        "Language export loaded"
    );
    std::fs::create_dir_all(out_dir)?;

    table.drop_zero_columns();
    table.drop_agencies(EXCLUDED_AGENCIES);

    let retained = top_languages(&table);
    let grid = table.select(&retained)?;

    let scores = language_scores(&grid, &overview)?;
    let nimbleness = min_max_normalize(&scores);
    output::print_json(&nimbleness)?;

    write_language_numbers(&grid, &overview, &nimbleness, out_dir)?;
    write_language_grid(&grid, out_dir)
}

/// Ranks languages by total count, keeps the top [`TOP_LANGUAGES`], then
/// removes the non-language artifacts.
pub fn top_languages(table: &LanguageTable) -> Vec<String> {
    let mut ranked: Vec<(String, f64)> = table
        .languages
        .iter()
        .cloned()
        .zip(table.totals())
        .collect();
    // Descending by total; name breaks ties so output order is stable.
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    ranked
        .into_iter()
        .take(TOP_LANGUAGES)
        .map(|(language, _)| language)
        .filter(|language| !NOT_LANGUAGES.contains(&language.as_str()))
        .collect()
}

/// Composite language score per overview agency, each agency's language
/// counts taken as proportions of its repository count.
pub fn language_scores(
    grid: &LanguageTable,
    overview: &[InnovationOverview],
) -> Result<BTreeMap<String, f64>> {
    let mut scores = BTreeMap::new();

    for entry in overview {
        let counts = grid
            .agency_counts(&entry.agency)
            .with_context(|| format!("agency missing from language table: {}", entry.agency))?;
        scores.insert(
            entry.agency.clone(),
            weighted_score(&counts, entry.num_repos, LANGUAGE_WEIGHTS),
        );
    }

    Ok(scores)
}

/// `language_numbers.csv`: per-agency repository numbers, nimbleness, and
/// count/share columns for each retained language.
fn write_language_numbers(
    grid: &LanguageTable,
    overview: &[InnovationOverview],
    nimbleness: &BTreeMap<String, f64>,
    out_dir: &Path,
) -> Result<()> {
    let mut headers: Vec<String> = [
        "agency",
        "num_repos",
        "num_lang",
        "num_contributors",
        "repo_per_million",
        "contributor_per_million",
        "nimbleness",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    for language in grid.languages() {
        headers.push(format!("{language}_count"));
        headers.push(format!("{language}_%"));
    }

    let mut rows = Vec::new();
    for entry in overview {
        ensure!(
            entry.num_repos > 0.0,
            "agency {} has no repositories",
            entry.agency
        );
        ensure!(
            entry.total_funding > 0.0,
            "non-positive total_funding for agency {}",
            entry.agency
        );

        let counts = grid
            .agency_counts(&entry.agency)
            .with_context(|| format!("agency missing from language table: {}", entry.agency))?;
        let num_lang = counts.values().filter(|&&count| count > 0.0).count();
        let nimble = nimbleness
            .get(&entry.agency)
            .copied()
            .with_context(|| format!("no nimbleness score for agency {}", entry.agency))?;

        let mut row = vec![
            entry.agency.clone(),
            round3(entry.num_repos).to_string(),
            num_lang.to_string(),
            round3(entry.num_contributors).to_string(),
            round3(entry.repo_per_million).to_string(),
            round3(entry.num_contributors / entry.total_funding).to_string(),
            nimble.to_string(),
        ];
        for language in grid.languages() {
            let count = counts.get(language).copied().unwrap_or(0.0);
            row.push(round3(count).to_string());
            row.push(round3(count / entry.num_repos).to_string());
        }
        rows.push(row);
    }

    output::write_table(out_dir.join("language_numbers.csv"), &headers, &rows)
}

/// `top_languages.csv`: the agency x retained-language count grid.
fn write_language_grid(grid: &LanguageTable, out_dir: &Path) -> Result<()> {
    let mut headers = vec!["agency".to_string()];
    headers.extend(grid.languages().iter().cloned());

    let rows: Vec<Vec<String>> = grid
        .counts
        .iter()
        .map(|(agency, row)| {
            let mut cells = vec![agency.clone()];
            cells.extend(row.iter().map(|value| value.to_string()));
            cells
        })
        .collect();

    output::write_table(out_dir.join("top_languages.csv"), &headers, &rows)
}
