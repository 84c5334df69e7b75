//! Per-channel statistics and integrated energy.

use crate::config::Precision;
use crate::metrics::stats::{describe, energy_kwh, round_to, time_of_peak};
use serde::{Deserialize, Serialize};

/// Statistics and energy for one power series.
///
/// Used both for individual channels and for a group's composite series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    /// Mean power (W)
    pub mean: f64,
    pub median: f64,
    /// Peak power (W)
    pub max: f64,
    pub min: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// `max - min`
    pub range: f64,
    /// Trapezoidal energy over the recording (kWh)
    #[serde(rename = "total_energy_kWh")]
    pub total_energy: f64,
    /// Timestamp of the first sample at `max`, absent for an empty series
    pub time_of_peak: Option<f64>,
}

impl ChannelMetrics {
    /// Copy with values rounded for output.
    pub fn rounded(&self, precision: &Precision) -> Self {
        let v = |x: f64| round_to(x, precision.value_decimals);
        Self {
            mean: v(self.mean),
            median: v(self.median),
            max: v(self.max),
            min: v(self.min),
            std_dev: v(self.std_dev),
            range: v(self.range),
            total_energy: round_to(self.total_energy, precision.energy_decimals),
            time_of_peak: self.time_of_peak.map(v),
        }
    }
}

/// Compute metrics for one channel against the series timestamps.
///
/// `values` and `timestamps` must have equal length. Fewer than two samples
/// yield zero energy.
pub fn compute_channel_metrics(timestamps: &[f64], values: &[f64]) -> ChannelMetrics {
    let stats = describe(values);

    ChannelMetrics {
        mean: stats.mean,
        median: stats.median,
        max: stats.max,
        min: stats.min,
        std_dev: stats.std_dev,
        range: stats.range(),
        total_energy: energy_kwh(values, timestamps),
        time_of_peak: time_of_peak(values, timestamps),
    }
}
