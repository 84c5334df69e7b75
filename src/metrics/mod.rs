//! The energy metrics engine.
//!
//! This module contains:
//! - Descriptive statistics and trapezoidal energy integration
//! - Per-channel metrics
//! - Group aggregation over composite series
//! - Duty cycle estimation
//! - Audit record assembly and rollups

pub mod audit;
pub mod channel;
pub mod duty;
pub mod group;
pub mod stats;

// Re-export commonly used types
pub use audit::{
    assemble_audit, run_audit, AuditMetadata, AuditRecord, GroupReport, OverallSummary,
    RecordMetadata, TopMetric, TopVariable, TopVariables,
};
pub use channel::{compute_channel_metrics, ChannelMetrics};
pub use duty::duty_cycle_percent;
pub use group::{compute_group_metrics, GroupMetrics, GroupSummary};
