//! Output formatting and persistence for derived tables.
//!
//! Supports JSON debug logging and CSV writes.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use std::path::Path;

/// Logs a derived table as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    debug!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes serializable rows to a CSV file with a header row, replacing any
/// existing file.
pub fn write_rows<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

/// Writes a table whose columns are only known at runtime, replacing any
/// existing file.
pub fn write_table(
    path: impl AsRef<Path>,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[derive(Serialize)]
    struct Row {
        agency: String,
        total: f64,
    }

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_rows() -> Vec<Row> {
        vec![
            Row {
                agency: "EPA".to_string(),
                total: 2.0,
            },
            Row {
                agency: "NOAA".to_string(),
                total: 1.5,
            },
        ]
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_rows()).unwrap();
    }

    #[test]
    fn test_write_rows_header_and_rows() {
        let path = temp_path("agency_metrics_test_rows.csv");
        let _ = fs::remove_file(&path);

        write_rows(&path, &sample_rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "agency,total");
        assert_eq!(lines[1], "EPA,2.0");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_rows_replaces_existing_file() {
        let path = temp_path("agency_metrics_test_replace.csv");
        let _ = fs::remove_file(&path);

        write_rows(&path, &sample_rows()).unwrap();
        write_rows(&path, &sample_rows()[..1]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // Header + 1 data row; the first write is gone.
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_table_dynamic_headers() {
        let path = temp_path("agency_metrics_test_table.csv");
        let _ = fs::remove_file(&path);

        let headers = vec!["agency".to_string(), "Python_count".to_string()];
        let rows = vec![vec!["EPA".to_string(), "10".to_string()]];
        write_table(&path, &headers, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["agency,Python_count", "EPA,10"]);

        fs::remove_file(&path).unwrap();
    }
}
