//! Energy Audit CLI
//!
//! Computes energy-audit records from machine power recordings.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use energy_audit::{
    batch::audit_files,
    config::{ChannelGroup, Config},
    metrics::{AuditMetadata, AuditRecord},
    VERSION,
};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "energy-audit")]
#[command(version = VERSION)]
#[command(about = "Energy metrics engine for machine power recordings", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute audit records for one or more CSV recordings
    Audit {
        /// CSV files with an elapsed-time column and power channels
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Machine name
        #[arg(long)]
        machine: Option<String>,

        /// Operator name
        #[arg(long)]
        operator: Option<String>,

        /// Machine state (e.g. Idle, Cutting, Cooling)
        #[arg(long)]
        state: Option<String>,

        /// Material processed (e.g. Aluminum, Steel)
        #[arg(long)]
        material: Option<String>,

        /// Name of the elapsed-time column
        #[arg(long)]
        time_column: Option<String>,

        /// Channel group as NAME=ch1,ch2 (repeatable, replaces configured groups)
        #[arg(long = "group", value_name = "NAME=CHANNELS")]
        groups: Vec<String>,

        /// Output file (single input only)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print records to stdout instead of writing files
        #[arg(long)]
        stdout: bool,

        /// Write compact instead of pretty JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show configured channel groups
    Groups,

    /// Show configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Audit {
            files,
            machine,
            operator,
            state,
            material,
            time_column,
            groups,
            output,
            stdout,
            compact,
        } => {
            let metadata = AuditMetadata {
                machine_name: machine,
                operator,
                machine_state: state,
                material,
            };
            cmd_audit(
                &files,
                metadata,
                time_column,
                &groups,
                output,
                stdout,
                compact,
            )
        }
        Commands::Groups => cmd_groups(),
        Commands::Config { init } => cmd_config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_audit(
    files: &[PathBuf],
    metadata: AuditMetadata,
    time_column: Option<String>,
    group_args: &[String],
    output: Option<PathBuf>,
    stdout: bool,
    compact: bool,
) -> Result<()> {
    let mut config = Config::load().context("loading configuration")?;
    if let Some(column) = time_column {
        config.time_column = column;
    }
    if !group_args.is_empty() {
        config.groups = group_args
            .iter()
            .map(|arg| ChannelGroup::parse_assignment(arg))
            .collect::<Result<Vec<_>, _>>()
            .context("parsing --group")?;
    }
    config.validate().context("invalid configuration")?;

    if output.is_some() && files.len() > 1 {
        bail!("--output can only be used with a single input file");
    }

    info!(
        files = files.len(),
        groups = config.groups.len(),
        time_column = %config.time_column,
        "running audit"
    );

    let outcomes = audit_files(files, &config, &metadata);
    let mut failures = 0;

    for outcome in outcomes {
        let record = match outcome.result {
            Ok(record) => record,
            Err(e) => {
                eprintln!("{}: {e}", outcome.path.display());
                failures += 1;
                continue;
            }
        };

        let json = if compact {
            serde_json::to_string(&record)
        } else {
            serde_json::to_string_pretty(&record)
        }
        .context("serializing audit record")?;

        if stdout {
            println!("{json}");
            continue;
        }

        let target = match &output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                std::fs::write(path, &json)
                    .with_context(|| format!("writing {}", path.display()))?;
                path.clone()
            }
            None => {
                config
                    .ensure_directories()
                    .context("creating export directory")?;
                let name = export_file_name(&record, &outcome.path);
                write_new_file(&config.export_path, &name, json.as_bytes()).with_context(|| {
                    format!("writing {}", config.export_path.join(&name).display())
                })?
            }
        };

        print_summary(&record, &outcome.path, &target);
    }

    if failures > 0 {
        bail!("{failures} of {} file(s) failed", files.len());
    }
    Ok(())
}

/// `audit_<machine>_<input stem>_<UTC timestamp>.json`
fn export_file_name(record: &AuditRecord, input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "series".to_string());

    format!(
        "audit_{}_{}_{}.json",
        sanitize(&record.metadata.machine_name),
        sanitize(&stem),
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}

/// Write `contents` to a file in `dir` that did not exist before.
///
/// Tries `name` first, then `<stem>_2.<ext>`, `<stem>_3.<ext>` and so on, so
/// inputs sharing a file stem never overwrite each other's records.
fn write_new_file(dir: &Path, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
    let base = Path::new(name);
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = base.extension().map(|e| e.to_string_lossy().into_owned());

    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let candidate = match (attempt, &ext) {
            (1, _) => name.to_string(),
            (n, Some(ext)) => format!("{stem}_{n}.{ext}"),
            (n, None) => format!("{stem}_{n}"),
        };
        let path = dir.join(candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(contents)?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name for {name} in {}", dir.display()),
    ))
}

const MAX_NAME_ATTEMPTS: u32 = 1000;

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn print_summary(record: &AuditRecord, input: &Path, target: &Path) {
    println!("{}", input.display());
    for group in &record.groups {
        match &group.total {
            Some(total) => println!(
                "  {}: {} channel(s), {} kWh, mean {} W, duty cycle {}%",
                group.name,
                group.variables.len(),
                total.total_energy,
                total.mean,
                group.duty_cycle_percent
            ),
            None => println!("  {}: not measured", group.name),
        }
    }
    println!(
        "  Total: {} kWh, {} kWh/hour",
        record.overall.total_energy, record.overall.energy_rate
    );
    println!("  Written to {}", target.display());
}

fn cmd_groups() -> Result<()> {
    let config = Config::load().context("loading configuration")?;

    println!("Channel Groups");
    println!("==============");
    for group in &config.groups {
        println!();
        println!("{} ({} channels)", group.name, group.channels.len());
        for channel in &group.channels {
            println!("  - {channel}");
        }
    }
    Ok(())
}

fn cmd_config(init: bool) -> Result<()> {
    if init {
        let config = Config::default();
        config.save().context("saving configuration")?;
        println!("Wrote default configuration to {:?}", Config::config_path());
        return Ok(());
    }

    let config = Config::load().context("loading configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("serializing configuration")?
    );
    Ok(())
}
