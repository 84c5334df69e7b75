//! Numeric building blocks shared by channel and group metrics.

use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Watt-seconds per kilowatt-hour.
pub const WS_PER_KWH: f64 = 3_600_000.0;

/// Descriptive statistics over a value sequence.
///
/// `std_dev` uses the population denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Descriptive {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    pub std_dev: f64,
}

impl Descriptive {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Compute descriptive statistics, all zero for an empty slice.
pub fn describe(values: &[f64]) -> Descriptive {
    if values.is_empty() {
        return Descriptive::default();
    }

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut data = Data::new(values.to_vec());

    Descriptive {
        mean: values.iter().mean(),
        median: data.median(),
        max,
        min,
        std_dev: values.iter().population_std_dev(),
    }
}

/// Trapezoidal integral of `values` against `times`.
///
/// Handles non-uniform spacing. Returns 0 with fewer than two points.
pub fn trapezoid(values: &[f64], times: &[f64]) -> f64 {
    debug_assert_eq!(values.len(), times.len());
    values
        .windows(2)
        .zip(times.windows(2))
        .map(|(v, t)| 0.5 * (v[0] + v[1]) * (t[1] - t[0]))
        .sum()
}

/// Energy in kWh for a power series in watts over timestamps in seconds.
pub fn energy_kwh(power_w: &[f64], times_s: &[f64]) -> f64 {
    trapezoid(power_w, times_s) / WS_PER_KWH
}

/// Timestamp of the first sample attaining the maximum value.
pub fn time_of_peak(values: &[f64], times: &[f64]) -> Option<f64> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, top)) if v <= top => {}
            _ => best = Some((i, v)),
        }
    }
    best.and_then(|(i, _)| times.get(i).copied())
}

/// Round to a number of decimal places.
///
/// Rounds the exact binary value, so only true ties occur and they go to the
/// even digit. Values too large to carry a fraction at this precision are
/// returned unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    if !(value * factor).is_finite() {
        return value;
    }
    format!("{:.*}", decimals as usize, value)
        .parse()
        .unwrap_or(value)
}
