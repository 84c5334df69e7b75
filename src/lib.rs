//! Energy Audit - energy metrics engine for machine power telemetry.
//!
//! This library turns an irregularly sampled recording of electrical and
//! pneumatic power channels into a structured energy-audit record:
//! per-channel statistics, integrated energy, duty cycles, and group and
//! overall rollups.
//!
//! # Guarantees
//!
//! - **Pure**: one series in, one record out; no I/O or hidden state in the engine
//! - **Non-uniform sampling**: energy is integrated with the trapezoidal rule
//! - **Composite groups**: group statistics come from the per-sample sum, not
//!   from summing channel statistics
//! - **No NaN output**: degenerate inputs yield 0 or `null`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Energy Audit                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐       │
//! │  │  Series  │──▶│ Channel  │──▶│  Group   │──▶│   Duty   │       │
//! │  │  Loader  │   │ Metrics  │   │Aggregator│   │  Cycle   │       │
//! │  └──────────┘   └──────────┘   └──────────┘   └──────────┘       │
//! │                                                     │            │
//! │                                                     ▼            │
//! │                                              ┌────────────┐      │
//! │                                              │   Audit    │      │
//! │                                              │ Assembler  │      │
//! │                                              └────────────┘      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use energy_audit::{run_audit, AuditMetadata, ChannelGroup, Config, TimeSeries};
//!
//! let series = TimeSeries::new(vec![0.0, 10.0, 20.0])?
//!     .with_channel("Power1", vec![100.0, 200.0, 100.0])?
//!     .with_channel("Power2", vec![50.0, 50.0, 50.0])?;
//!
//! let config = Config {
//!     groups: vec![ChannelGroup::new("Elektrisch", ["Power1", "Power2"])],
//!     ..Config::default()
//! };
//!
//! let record = run_audit(&series, &config, &AuditMetadata::new("DMU 65"));
//! assert_eq!(record.group("Elektrisch").unwrap().duty_cycle_percent, 100.0);
//! println!("{}", record.to_json_pretty()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod config;
pub mod metrics;
pub mod series;

// Re-export key types at crate root for convenience
pub use batch::{audit_file, audit_files, BatchOutcome};
pub use config::{ChannelGroup, Config, ConfigError, Precision};
pub use metrics::{
    assemble_audit, compute_channel_metrics, compute_group_metrics, duty_cycle_percent,
    run_audit, AuditMetadata, AuditRecord, ChannelMetrics, GroupMetrics, GroupSummary,
    OverallSummary,
};
pub use series::{load_csv_path, load_csv_reader, SeriesError, TimeSeries};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
