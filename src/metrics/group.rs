//! Group aggregation over a composite series.
//!
//! A group's summary is computed over the per-sample sum of its channels.
//! Only mean and energy distribute over that sum; min, max, median and
//! standard deviation have to be recomputed on the composite.

use crate::config::ChannelGroup;
use crate::metrics::channel::{compute_channel_metrics, ChannelMetrics};
use crate::series::TimeSeries;
use tracing::{debug, warn};

/// Summary statistics of a group's composite series.
pub type GroupSummary = ChannelMetrics;

/// Metrics for one channel group.
///
/// An unmeasured group (none of its channels present) has no details and no
/// summary. That is a normal outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupMetrics {
    /// Channels of the group present in the series, in group order
    pub valid_channels: Vec<String>,
    /// Per-channel metrics, in `valid_channels` order
    pub details: Vec<(String, ChannelMetrics)>,
    /// Composite summary, `None` when the group is not measured
    pub summary: Option<GroupSummary>,
}

impl GroupMetrics {
    pub fn is_measured(&self) -> bool {
        self.summary.is_some()
    }

    /// Metrics of a member channel by name.
    pub fn channel(&self, name: &str) -> Option<&ChannelMetrics> {
        self.details
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }
}

/// Channel names of `candidates` present in the series, in candidate order.
pub fn valid_channels<S: AsRef<str>>(series: &TimeSeries, candidates: &[S]) -> Vec<String> {
    let mut valid: Vec<String> = Vec::new();
    for name in candidates {
        let name = name.as_ref();
        if series.has_channel(name) && !valid.iter().any(|v| v == name) {
            valid.push(name.to_string());
        }
    }
    valid
}

/// Per-sample sum across the named channels.
///
/// Names absent from the series contribute nothing.
pub fn composite_series<S: AsRef<str>>(series: &TimeSeries, channels: &[S]) -> Vec<f64> {
    let mut sum = vec![0.0; series.len()];
    for name in channels {
        if let Some(values) = series.channel(name.as_ref()) {
            for (acc, v) in sum.iter_mut().zip(values) {
                *acc += v;
            }
        }
    }
    sum
}

/// Compute per-channel details and the composite summary for a group.
pub fn compute_group_metrics(series: &TimeSeries, group: &ChannelGroup) -> GroupMetrics {
    let valid = valid_channels(series, &group.channels);
    if valid.is_empty() {
        warn!(group = %group.name, "no channels of group present, group not measured");
        return GroupMetrics::default();
    }

    debug!(
        group = %group.name,
        channels = valid.len(),
        configured = group.channels.len(),
        "computing group metrics"
    );

    let timestamps = series.timestamps();
    let details = valid
        .iter()
        .filter_map(|name| {
            series.channel(name).map(|values| {
                let metrics = compute_channel_metrics(timestamps, values);
                debug!(
                    group = %group.name,
                    channel = %name,
                    mean = metrics.mean,
                    max = metrics.max,
                    energy_kwh = metrics.total_energy,
                    "channel metrics computed"
                );
                (name.clone(), metrics)
            })
        })
        .collect();

    let composite = composite_series(series, &valid);
    let summary = compute_channel_metrics(timestamps, &composite);

    GroupMetrics {
        valid_channels: valid,
        details,
        summary: Some(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> TimeSeries {
        TimeSeries::new(vec![0.0, 10.0, 20.0])
            .unwrap()
            .with_channel("Power1", vec![100.0, 200.0, 100.0])
            .unwrap()
            .with_channel("Power2", vec![50.0, 50.0, 50.0])
            .unwrap()
    }

    #[test]
    fn test_group_summary_over_composite() {
        let group = ChannelGroup::new("Elektrisch", ["Power1", "Power2", "Missing"]);
        let metrics = compute_group_metrics(&scenario(), &group);

        assert_eq!(metrics.valid_channels, vec!["Power1", "Power2"]);
        assert_eq!(metrics.details.len(), 2);

        let summary = metrics.summary.unwrap();
        assert_eq!(summary.max, 250.0);
        assert_eq!(summary.min, 150.0);
        assert_eq!(summary.time_of_peak, Some(10.0));
        // 0.5*(150+250)*10 * 2 Ws
        assert!((summary.total_energy - 4000.0 / 3_600_000.0).abs() < 1e-15);
    }

    #[test]
    fn test_debug_event_per_channel() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let group = ChannelGroup::new("Elektrisch", ["Power1", "Power2"]);
        tracing::subscriber::with_default(subscriber, || {
            compute_group_metrics(&scenario(), &group);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("channel metrics computed").count(), 2);
        assert!(output.contains("channel=Power1"));
        assert!(output.contains("channel=Power2"));
    }

    #[test]
    fn test_group_max_not_sum_of_maxima() {
        let series = TimeSeries::new(vec![0.0, 1.0])
            .unwrap()
            .with_channel("a", vec![10.0, 0.0])
            .unwrap()
            .with_channel("b", vec![0.0, 10.0])
            .unwrap();
        let metrics = compute_group_metrics(&series, &ChannelGroup::new("g", ["a", "b"]));
        let summary = metrics.summary.unwrap();

        assert_eq!(summary.max, 10.0);
        assert_eq!(summary.std_dev, 0.0);
        let sum_of_max: f64 = metrics.details.iter().map(|(_, m)| m.max).sum();
        assert_eq!(sum_of_max, 20.0);
    }

    #[test]
    fn test_unmeasured_group() {
        let group = ChannelGroup::new("Pneumatisch", ["AirPower_NPS"]);
        let metrics = compute_group_metrics(&scenario(), &group);

        assert!(!metrics.is_measured());
        assert!(metrics.details.is_empty());
        assert!(metrics.valid_channels.is_empty());
    }

    #[test]
    fn test_duplicate_candidates_counted_once() {
        let group = ChannelGroup::new("g", ["Power2", "Power2"]);
        let metrics = compute_group_metrics(&scenario(), &group);
        assert_eq!(metrics.valid_channels, vec!["Power2"]);
        assert_eq!(metrics.summary.unwrap().max, 50.0);
    }

    #[test]
    fn test_energy_linearity() {
        let series = TimeSeries::new(vec![0.0, 0.7, 3.1, 3.2, 9.0])
            .unwrap()
            .with_channel("a", vec![12.0, 80.5, 3.0, 44.0, 19.0])
            .unwrap()
            .with_channel("b", vec![0.0, 7.25, 70.0, 1.0, 2.5])
            .unwrap()
            .with_channel("c", vec![300.0, 310.0, 290.0, 305.0, 299.0])
            .unwrap();

        let a = compute_group_metrics(&series, &ChannelGroup::new("A", ["a"]));
        let bc = compute_group_metrics(&series, &ChannelGroup::new("BC", ["b", "c"]));
        let all = compute_group_metrics(&series, &ChannelGroup::new("All", ["a", "b", "c"]));

        let split = a.summary.unwrap().total_energy + bc.summary.unwrap().total_energy;
        let joint = all.summary.unwrap().total_energy;
        assert!((split - joint).abs() < 1e-12);

        let per_channel: f64 = all.details.iter().map(|(_, m)| m.total_energy).sum();
        assert!((per_channel - joint).abs() < 1e-12);
    }

    #[test]
    fn test_channel_lookup() {
        let metrics = compute_group_metrics(&scenario(), &ChannelGroup::new("g", ["Power1"]));
        assert_eq!(metrics.channel("Power1").unwrap().max, 200.0);
        assert!(metrics.channel("Power2").is_none());
    }
}
