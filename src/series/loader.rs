//! CSV loading for time series.
//!
//! The first header row names the columns. One column must hold elapsed time
//! in seconds; every other column is treated as a candidate power channel.

use crate::series::{SeriesError, TimeSeries};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Load a time series from a CSV file on disk.
pub fn load_csv_path(path: impl AsRef<Path>, time_column: &str) -> Result<TimeSeries, SeriesError> {
    let path = path.as_ref();
    debug!(path = %path.display(), time_column, "loading series");
    let file = std::fs::File::open(path)?;
    load_csv_reader(file, time_column)
}

/// Load a time series from any CSV source.
///
/// Fails if the time column is absent or holds a non-numeric cell. Channel
/// columns with empty or non-numeric cells are skipped rather than rejected,
/// so they simply do not take part in grouping.
pub fn load_csv_reader<R: Read>(reader: R, time_column: &str) -> Result<TimeSeries, SeriesError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let time_idx = headers
        .iter()
        .position(|h| h == time_column)
        .ok_or_else(|| SeriesError::MissingColumn(time_column.to_string()))?;

    // Column index plus collected values; `None` once a bad cell is seen.
    let mut columns: Vec<(usize, &str, Option<Vec<f64>>)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if idx == time_idx {
            continue;
        }
        if name == time_column {
            warn!(column = %name, "skipping repeated time column");
            continue;
        }
        if columns.iter().any(|(_, seen, _)| *seen == name.as_str()) {
            warn!(column = %name, "skipping duplicate column");
            continue;
        }
        columns.push((idx, name.as_str(), Some(Vec::new())));
    }

    let mut timestamps = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(row + 2);

        let raw_time = record.get(time_idx).unwrap_or("");
        let time = parse_finite(raw_time).ok_or_else(|| SeriesError::InvalidValue {
            line,
            column: time_column.to_string(),
            message: format!("'{raw_time}' is not a finite number"),
        })?;
        timestamps.push(time);

        for (idx, name, values) in columns.iter_mut() {
            let Some(collected) = values else {
                continue;
            };
            match record.get(*idx).and_then(parse_finite) {
                Some(value) => collected.push(value),
                None => {
                    warn!(column = %name, line, "skipping column with non-numeric or non-finite value");
                    *values = None;
                }
            }
        }
    }

    let mut series = TimeSeries::with_time_column(time_column, timestamps)?;
    for (_, name, values) in columns {
        if let Some(values) = values {
            series.push_channel(name, values)?;
        }
    }

    debug!(
        rows = series.len(),
        channels = series.channels().len(),
        "series loaded"
    );
    Ok(series)
}

/// Parse a cell as a finite number; `NaN` and infinities count as invalid.
fn parse_finite(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_basic() {
        let csv = "elapsedTime,Power1,Power2\n0,100,50\n10,200,50\n20,100,50\n";
        let series = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap();

        assert_eq!(series.timestamps(), &[0.0, 10.0, 20.0]);
        assert_eq!(series.channel("Power1"), Some(&[100.0, 200.0, 100.0][..]));
        assert_eq!(series.channel("Power2"), Some(&[50.0, 50.0, 50.0][..]));
    }

    #[test]
    fn test_time_column_anywhere() {
        let csv = "Power1,elapsedTime\n1.5,0\n2.5,0.5\n";
        let series = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap();
        assert_eq!(series.timestamps(), &[0.0, 0.5]);
        assert_eq!(series.channels().len(), 1);
    }

    #[test]
    fn test_missing_time_column() {
        let csv = "time,Power1\n0,1\n";
        let err = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap_err();
        assert!(matches!(err, SeriesError::MissingColumn(ref c) if c == "elapsedTime"));
        assert_eq!(err.to_string(), "Time column 'elapsedTime' not found in data");
    }

    #[test]
    fn test_bad_time_value() {
        let csv = "elapsedTime,Power1\n0,1\nabc,2\n";
        let err = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap_err();
        assert!(matches!(err, SeriesError::InvalidValue { line: 3, .. }));
    }

    #[test]
    fn test_non_numeric_channel_skipped() {
        let csv = "elapsedTime,Power1,Comment,Gap\n0,1,ok,4\n1,2,fine,\n";
        let series = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap();

        assert!(series.has_channel("Power1"));
        assert!(!series.has_channel("Comment"));
        assert!(!series.has_channel("Gap"));
    }

    #[test]
    fn test_non_finite_time_value() {
        for bad in ["NaN", "inf", "-infinity"] {
            let csv = format!("elapsedTime,Power1\n0,1\n{bad},2\n");
            let err = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap_err();
            assert!(matches!(err, SeriesError::InvalidValue { line: 3, .. }), "{bad}");
        }
    }

    #[test]
    fn test_non_finite_channel_skipped() {
        let csv = "elapsedTime,Power1,Power2,Power3\n0,NaN,inf,1\n10,200,50,2\n20,100,50,3\n";
        let series = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap();

        assert!(!series.has_channel("Power1"));
        assert!(!series.has_channel("Power2"));
        assert_eq!(series.channel("Power3"), Some(&[1.0, 2.0, 3.0][..]));
    }

    #[test]
    fn test_repeated_time_header_skipped() {
        let csv = "elapsedTime,Power1,elapsedTime\n0,1,5\n1,2,6\n";
        let series = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap();

        assert_eq!(series.timestamps(), &[0.0, 1.0]);
        assert_eq!(series.channels().len(), 1);
        assert!(!series.has_channel("elapsedTime"));
    }

    #[test]
    fn test_header_only() {
        let csv = "elapsedTime,Power1\n";
        let series = load_csv_reader(csv.as_bytes(), "elapsedTime").unwrap();
        assert!(series.is_empty());
        assert_eq!(series.channel("Power1"), Some(&[][..]));
    }
}
