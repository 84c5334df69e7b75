//! Time series input for the metrics engine.
//!
//! A [`TimeSeries`] is one complete recording: an elapsed-time column in
//! seconds plus any number of named power channels sampled at the same
//! timestamps. Sampling need not be uniform.

pub mod loader;

use thiserror::Error;

pub use loader::{load_csv_path, load_csv_reader};

/// Canonical name of the elapsed-time column.
pub const DEFAULT_TIME_COLUMN: &str = "elapsedTime";

/// Errors raised while building or loading a time series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Time column '{0}' not found in data")]
    MissingColumn(String),

    #[error("Invalid value at line {line}, column '{column}': {message}")]
    InvalidValue {
        line: usize,
        column: String,
        message: String,
    },

    #[error("Channel '{channel}' has {actual} samples, expected {expected}")]
    LengthMismatch {
        channel: String,
        expected: usize,
        actual: usize,
    },

    #[error("Timestamps decrease at row {row}")]
    NonMonotonic { row: usize },

    #[error("Non-finite value in '{column}' at row {row}")]
    NonFinite { column: String, row: usize },

    #[error("Duplicate channel '{0}'")]
    DuplicateChannel(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named numeric telemetry stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub values: Vec<f64>,
}

/// A complete, finite series of samples.
///
/// Channels keep their input column order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    time_column: String,
    timestamps: Vec<f64>,
    channels: Vec<Channel>,
}

impl TimeSeries {
    /// Create a series with the given timestamps and no channels.
    pub fn new(timestamps: Vec<f64>) -> Result<Self, SeriesError> {
        Self::with_time_column(DEFAULT_TIME_COLUMN, timestamps)
    }

    /// Create a series whose time column carries a custom name.
    pub fn with_time_column(
        time_column: impl Into<String>,
        timestamps: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        let time_column = time_column.into();
        if let Some(row) = timestamps.iter().position(|t| !t.is_finite()) {
            return Err(SeriesError::NonFinite {
                column: time_column,
                row,
            });
        }
        if let Some(row) = timestamps
            .windows(2)
            .position(|pair| pair[1] < pair[0])
        {
            return Err(SeriesError::NonMonotonic { row: row + 1 });
        }

        Ok(Self {
            time_column,
            timestamps,
            channels: Vec::new(),
        })
    }

    /// Add a channel, consuming and returning the series.
    pub fn with_channel(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        self.push_channel(name, values)?;
        Ok(self)
    }

    /// Add a channel in place.
    pub fn push_channel(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), SeriesError> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            return Err(SeriesError::LengthMismatch {
                channel: name,
                expected: self.timestamps.len(),
                actual: values.len(),
            });
        }
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(SeriesError::NonFinite { column: name, row });
        }
        if self.has_channel(&name) {
            return Err(SeriesError::DuplicateChannel(name));
        }
        self.channels.push(Channel { name, values });
        Ok(())
    }

    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Look up a channel's values by name.
    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c.name == name)
    }

    /// Number of samples (rows).
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn recording_start(&self) -> Option<f64> {
        self.timestamps.first().copied()
    }

    pub fn recording_end(&self) -> Option<f64> {
        self.timestamps.last().copied()
    }

    /// Elapsed time between the first and last sample, 0 with fewer than two samples.
    pub fn duration_secs(&self) -> f64 {
        match (self.recording_start(), self.recording_end()) {
            (Some(start), Some(end)) if self.len() >= 2 => end - start,
            _ => 0.0,
        }
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_secs() / 3600.0
    }

    /// Mean sampling rate in Hz, from the mean spacing of consecutive timestamps.
    pub fn sampling_rate_hz(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        let mean_step = self.duration_secs() / (self.len() - 1) as f64;
        if mean_step > 0.0 {
            Some(1.0 / mean_step)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_series() {
        let series = TimeSeries::new(vec![0.0, 10.0, 20.0])
            .unwrap()
            .with_channel("Power1", vec![100.0, 200.0, 100.0])
            .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.time_column(), "elapsedTime");
        assert_eq!(series.channel("Power1"), Some(&[100.0, 200.0, 100.0][..]));
        assert!(series.channel("Power2").is_none());
    }

    #[test]
    fn test_length_mismatch() {
        let err = TimeSeries::new(vec![0.0, 1.0])
            .unwrap()
            .with_channel("a", vec![1.0])
            .unwrap_err();
        assert!(matches!(err, SeriesError::LengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_duplicate_channel() {
        let err = TimeSeries::new(vec![0.0])
            .unwrap()
            .with_channel("a", vec![1.0])
            .unwrap()
            .with_channel("a", vec![2.0])
            .unwrap_err();
        assert!(matches!(err, SeriesError::DuplicateChannel(name) if name == "a"));
    }

    #[test]
    fn test_non_monotonic_rejected() {
        let err = TimeSeries::new(vec![0.0, 2.0, 1.0]).unwrap_err();
        assert!(matches!(err, SeriesError::NonMonotonic { row: 2 }));

        // Repeated timestamps are allowed.
        assert!(TimeSeries::new(vec![0.0, 1.0, 1.0]).is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = TimeSeries::new(vec![0.0, f64::NAN, 1.0]).unwrap_err();
        assert!(matches!(err, SeriesError::NonFinite { ref column, row: 1 } if column == "elapsedTime"));
        assert!(TimeSeries::new(vec![0.0, f64::INFINITY]).is_err());

        let err = TimeSeries::new(vec![0.0, 1.0, 2.0])
            .unwrap()
            .with_channel("Power1", vec![1.0, 2.0, f64::NEG_INFINITY])
            .unwrap_err();
        assert!(matches!(err, SeriesError::NonFinite { ref column, row: 2 } if column == "Power1"));

        let err = TimeSeries::new(vec![0.0])
            .unwrap()
            .with_channel("Power2", vec![f64::NAN])
            .unwrap_err();
        assert!(matches!(err, SeriesError::NonFinite { row: 0, .. }));
    }

    #[test]
    fn test_duration_and_sampling_rate() {
        let series = TimeSeries::new(vec![5.0, 6.0, 8.0, 9.0]).unwrap();
        assert_eq!(series.duration_secs(), 4.0);
        assert!((series.duration_hours() - 4.0 / 3600.0).abs() < 1e-12);
        assert!((series.sampling_rate_hz().unwrap() - 0.75).abs() < 1e-12);

        let single = TimeSeries::new(vec![3.0]).unwrap();
        assert_eq!(single.duration_secs(), 0.0);
        assert!(single.sampling_rate_hz().is_none());

        let flat = TimeSeries::new(vec![1.0, 1.0]).unwrap();
        assert!(flat.sampling_rate_hz().is_none());
    }
}
