//! Audit record assembly.
//!
//! Combines group metrics and duty cycles into one [`AuditRecord`] with
//! overall rollups. The record serializes to the JSON shape consumed by the
//! storage, visualization and report tooling:
//!
//! ```text
//! {
//!   "metadata": {...},
//!   "<Group>": {
//!     "Variables": {"<channel>": {...}},
//!     "Total <Group>": {...},
//!     "Duty Cycle (%)": 87.5
//!   },
//!   "Overall Summary": {...}
//! }
//! ```

use crate::config::{ChannelGroup, Config, Precision};
use crate::metrics::channel::ChannelMetrics;
use crate::metrics::duty::duty_cycle_percent;
use crate::metrics::group::{compute_group_metrics, GroupMetrics, GroupSummary};
use crate::metrics::stats::round_to;
use crate::series::TimeSeries;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Key of the metadata object.
pub const METADATA_KEY: &str = "metadata";
/// Key of the overall summary object.
pub const OVERALL_SUMMARY_KEY: &str = "Overall Summary";

/// Descriptive fields supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub machine_name: Option<String>,
    pub operator: Option<String>,
    pub machine_state: Option<String>,
    pub material: Option<String>,
}

impl AuditMetadata {
    pub fn new(machine_name: impl Into<String>) -> Self {
        Self {
            machine_name: Some(machine_name.into()),
            ..Default::default()
        }
    }
}

/// The `metadata` object of an audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMetadata {
    pub machine_name: String,
    pub operator: String,
    pub machine_state: String,
    pub material: String,
    pub recording_start: Option<f64>,
    pub recording_end: Option<f64>,
    pub duration_seconds: f64,
    pub duration_hours: f64,
    #[serde(rename = "sampling_rate_Hz")]
    pub sampling_rate_hz: Option<f64>,
    pub unit_power: String,
    pub unit_energy: String,
}

impl RecordMetadata {
    fn build(meta: &AuditMetadata, series: &TimeSeries, precision: &Precision) -> Self {
        let v = |x: f64| round_to(x, precision.value_decimals);
        let or = |field: &Option<String>, fallback: &str| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };

        Self {
            machine_name: or(&meta.machine_name, "Unknown"),
            operator: or(&meta.operator, "Unknown"),
            machine_state: or(&meta.machine_state, "Not specified"),
            material: or(&meta.material, "Not specified"),
            recording_start: series.recording_start().map(v),
            recording_end: series.recording_end().map(v),
            duration_seconds: v(series.duration_secs()),
            duration_hours: v(series.duration_hours()),
            sampling_rate_hz: series.sampling_rate_hz().map(v),
            unit_power: "W".to_string(),
            unit_energy: "kWh".to_string(),
        }
    }
}

/// One group's section of the audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub name: String,
    /// Rounded per-channel metrics, in group order
    pub variables: Vec<(String, ChannelMetrics)>,
    /// Rounded composite summary, `None` when the group is not measured
    pub total: Option<GroupSummary>,
    pub duty_cycle_percent: f64,
}

impl GroupReport {
    /// Key of the composite summary, e.g. `Total Elektrisch`.
    pub fn total_key(&self) -> String {
        format!("Total {}", self.name)
    }

    pub fn is_measured(&self) -> bool {
        self.total.is_some()
    }
}

impl Serialize for GroupReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("Variables", &Variables(&self.variables))?;
        match &self.total {
            Some(total) => map.serialize_entry(&self.total_key(), total)?,
            None => map.serialize_entry(&self.total_key(), &Empty {})?,
        }
        map.serialize_entry("Duty Cycle (%)", &self.duty_cycle_percent)?;
        map.end()
    }
}

/// Ordered channel map.
struct Variables<'a>(&'a [(String, ChannelMetrics)]);

impl Serialize for Variables<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, metrics) in self.0 {
            map.serialize_entry(name, metrics)?;
        }
        map.end()
    }
}

/// Serializes as `{}`.
#[derive(Serialize)]
struct Empty {}

/// Metric a top variable was selected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopMetric {
    Mean,
    TotalEnergy,
    Max,
}

impl TopMetric {
    /// Field name the value is reported under.
    pub fn key(self) -> &'static str {
        match self {
            TopMetric::Mean => "mean",
            TopMetric::TotalEnergy => "total_energy_kWh",
            TopMetric::Max => "max",
        }
    }

    fn value(self, metrics: &ChannelMetrics) -> f64 {
        match self {
            TopMetric::Mean => metrics.mean,
            TopMetric::TotalEnergy => metrics.total_energy,
            TopMetric::Max => metrics.max,
        }
    }
}

/// The channel with the highest value of one metric across all groups.
#[derive(Debug, Clone, PartialEq)]
pub struct TopVariable {
    pub name: String,
    pub group: String,
    pub metric: TopMetric,
    pub value: f64,
}

impl Serialize for TopVariable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("group", &self.group)?;
        map.serialize_entry(self.metric.key(), &self.value)?;
        map.end()
    }
}

/// Best-channel callouts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopVariables {
    #[serde(rename = "Highest Average Power")]
    pub highest_average_power: Option<TopVariable>,
    #[serde(rename = "Highest Total Energy")]
    pub highest_total_energy: Option<TopVariable>,
    #[serde(rename = "Highest Peak Power")]
    pub highest_peak_power: Option<TopVariable>,
}

/// Rollups across all groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallSummary {
    #[serde(rename = "Total Energy (kWh)")]
    pub total_energy: f64,
    #[serde(rename = "Mean Power (W)")]
    pub mean_power: f64,
    #[serde(rename = "Energy Rate (kWh/hour)")]
    pub energy_rate: f64,
    #[serde(rename = "Top Variables")]
    pub top_variables: TopVariables,
}

/// The result of one audit run. Immutable once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub metadata: RecordMetadata,
    pub groups: Vec<GroupReport>,
    pub overall: OverallSummary,
}

impl AuditRecord {
    /// Find a group section by name.
    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for AuditRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len() + 2))?;
        map.serialize_entry(METADATA_KEY, &self.metadata)?;
        for group in &self.groups {
            map.serialize_entry(&group.name, group)?;
        }
        map.serialize_entry(OVERALL_SUMMARY_KEY, &self.overall)?;
        map.end()
    }
}

/// Run the full engine over a series with the configured groups.
pub fn run_audit(series: &TimeSeries, config: &Config, metadata: &AuditMetadata) -> AuditRecord {
    assemble_audit(series, &config.groups, metadata, &config.precision)
}

/// Compute every group and assemble the audit record.
pub fn assemble_audit(
    series: &TimeSeries,
    groups: &[ChannelGroup],
    metadata: &AuditMetadata,
    precision: &Precision,
) -> AuditRecord {
    let computed: Vec<(&ChannelGroup, GroupMetrics, f64)> = groups
        .iter()
        .map(|group| {
            let metrics = compute_group_metrics(series, group);
            let group_mean = metrics.summary.as_ref().map_or(0.0, |s| s.mean);
            let duty = duty_cycle_percent(series, &metrics.valid_channels, group_mean);
            (group, metrics, duty)
        })
        .collect();

    let overall = overall_summary(series, &computed, precision);

    let reports = computed
        .iter()
        .map(|(group, metrics, duty)| GroupReport {
            name: group.name.clone(),
            variables: metrics
                .details
                .iter()
                .map(|(name, m)| (name.clone(), m.rounded(precision)))
                .collect(),
            total: metrics.summary.as_ref().map(|s| s.rounded(precision)),
            duty_cycle_percent: *duty,
        })
        .collect();

    let record = AuditRecord {
        metadata: RecordMetadata::build(metadata, series, precision),
        groups: reports,
        overall,
    };

    info!(
        machine = %record.metadata.machine_name,
        groups = record.groups.len(),
        measured = record.groups.iter().filter(|g| g.is_measured()).count(),
        total_energy_kwh = record.overall.total_energy,
        duration_secs = series.duration_secs(),
        "audit assembled"
    );

    record
}

fn overall_summary(
    series: &TimeSeries,
    computed: &[(&ChannelGroup, GroupMetrics, f64)],
    precision: &Precision,
) -> OverallSummary {
    let total_energy: f64 = computed
        .iter()
        .filter_map(|(_, m, _)| m.summary.as_ref())
        .map(|s| s.total_energy)
        .sum();

    // Equal weight per configured group; an unmeasured group counts as 0 W.
    let mean_power = if computed.is_empty() {
        0.0
    } else {
        computed
            .iter()
            .map(|(_, m, _)| m.summary.as_ref().map_or(0.0, |s| s.mean))
            .sum::<f64>()
            / computed.len() as f64
    };

    let duration_hours = series.duration_hours();
    let energy_rate = if duration_hours > 0.0 {
        total_energy / duration_hours
    } else {
        0.0
    };

    let top = |metric: TopMetric| top_variable(computed, metric, precision);

    OverallSummary {
        total_energy: round_to(total_energy, precision.energy_decimals),
        mean_power: round_to(mean_power, precision.value_decimals),
        energy_rate: round_to(energy_rate, precision.energy_decimals),
        top_variables: TopVariables {
            highest_average_power: top(TopMetric::Mean),
            highest_total_energy: top(TopMetric::TotalEnergy),
            highest_peak_power: top(TopMetric::Max),
        },
    }
}

/// Scan all channels of all groups; ties go to the first encountered.
fn top_variable(
    computed: &[(&ChannelGroup, GroupMetrics, f64)],
    metric: TopMetric,
    precision: &Precision,
) -> Option<TopVariable> {
    let mut best: Option<(&str, &str, f64)> = None;
    for (group, metrics, _) in computed {
        for (name, m) in &metrics.details {
            let value = metric.value(m);
            match best {
                Some((_, _, top)) if value <= top => {}
                _ => best = Some((name.as_str(), group.name.as_str(), value)),
            }
        }
    }

    let decimals = match metric {
        TopMetric::TotalEnergy => precision.energy_decimals,
        TopMetric::Mean | TopMetric::Max => precision.value_decimals,
    };

    best.map(|(name, group, value)| TopVariable {
        name: name.to_string(),
        group: group.to_string(),
        metric,
        value: round_to(value, decimals),
    })
}
