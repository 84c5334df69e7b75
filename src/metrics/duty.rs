//! Duty cycle estimation.
//!
//! A sample counts as active when the per-sample mean across the group's
//! channels is strictly above 10% of the group's overall mean power.

use crate::metrics::stats::round_to;
use crate::series::TimeSeries;

/// Fraction of the group mean a sample must exceed to count as active.
pub const ACTIVITY_THRESHOLD: f64 = 0.1;

/// Percentage of samples in which the group is active, rounded to 2 decimals.
///
/// `group_mean` is the group's already computed mean power. Returns 0 when the
/// mean is zero, no channel is present, or the series has no samples.
pub fn duty_cycle_percent<S: AsRef<str>>(
    series: &TimeSeries,
    valid_channels: &[S],
    group_mean: f64,
) -> f64 {
    if group_mean == 0.0 || valid_channels.is_empty() || series.is_empty() {
        return 0.0;
    }

    let columns: Vec<&[f64]> = valid_channels
        .iter()
        .filter_map(|name| series.channel(name.as_ref()))
        .collect();
    if columns.is_empty() {
        return 0.0;
    }

    let threshold = ACTIVITY_THRESHOLD * group_mean;
    let width = columns.len() as f64;
    let active = (0..series.len())
        .filter(|&i| {
            let row_mean = columns.iter().map(|c| c[i]).sum::<f64>() / width;
            row_mean > threshold
        })
        .count();

    round_to(active as f64 * 100.0 / series.len() as f64, 2)
}
