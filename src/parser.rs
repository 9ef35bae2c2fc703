//! Field-level parsers for the raw CSV exports.
//!
//! A value these parsers reject fails the whole run; downstream aggregates
//! assume complete coverage of the input, so no row is skipped silently.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Literal used in the challenge export when a challenge has no cash prize.
pub const NO_PRIZE_SENTINEL: &str = "No monetary prize for this challenge";

/// Parses a currency-formatted prize string ("$1,234.56") into dollars.
///
/// The no-prize sentinel maps to 0.0. Cents are truncated, matching the
/// precision of the rest of the prize data.
///
/// # Errors
///
/// Returns an error if the string is neither the sentinel nor a parseable
/// dollar amount.
pub fn parse_prize(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed == NO_PRIZE_SENTINEL {
        return Ok(0.0);
    }

    let digits = trimmed.replace(['$', ','], "");
    let whole = match digits.split_once('.') {
        Some((whole, _cents)) => whole,
        None => digits.as_str(),
    };

    whole
        .parse::<f64>()
        .with_context(|| format!("unparseable prize amount: {raw:?}"))
}

/// Extracts the year from an ISO-like date string ("YYYY-MM-DD...").
pub fn parse_year(raw: &str) -> Result<i32> {
    let trimmed = raw.trim();
    let year_part = match trimmed.split_once('-') {
        Some((year, _)) => year,
        None => trimmed,
    };

    year_part
        .parse::<i32>()
        .with_context(|| format!("unparseable date: {raw:?}"))
}

/// Number of whole days between two ISO date strings (end minus start).
pub fn duration_days(start: &str, end: &str) -> Result<f64> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    Ok((end - start).num_days() as f64)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    // Dates may carry a time suffix after a space.
    let date_part = match trimmed.split_once(' ') {
        Some((date, _)) => date,
        None => trimmed,
    };

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .with_context(|| format!("unparseable date: {raw:?}"))
}

/// Parses a boolean-like indicator column ("1"/"0"/"true"/"false"/empty).
pub fn parse_flag(raw: &str) -> Result<u32> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" => Ok(0),
        "1" | "true" => Ok(1),
        other => bail!("unrecognized indicator value: {other:?}"),
    }
}

/// Serde adapter for [`parse_flag`], for deserializing indicator columns.
pub fn de_flag<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).map_err(serde::de::Error::custom)
}
