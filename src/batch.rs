//! Parallel audits over several recordings.
//!
//! Each file is an independent engine run. Files are handed to a small pool
//! of scoped worker threads and the outcomes are gathered back over a
//! channel, then returned in input order. One bad file never affects another.

use crate::config::Config;
use crate::metrics::{run_audit, AuditMetadata, AuditRecord};
use crate::series::{load_csv_path, SeriesError};
use crossbeam_channel::{bounded, unbounded};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

/// Outcome of auditing one file.
#[derive(Debug)]
pub struct BatchOutcome {
    pub path: PathBuf,
    pub result: Result<AuditRecord, SeriesError>,
}

/// Load one CSV recording and run the engine on it.
pub fn audit_file(
    path: impl AsRef<Path>,
    config: &Config,
    metadata: &AuditMetadata,
) -> Result<AuditRecord, SeriesError> {
    let series = load_csv_path(path, &config.time_column)?;
    Ok(run_audit(&series, config, metadata))
}

/// Audit every file, using up to `available_parallelism` worker threads.
pub fn audit_files(
    paths: &[PathBuf],
    config: &Config,
    metadata: &AuditMetadata,
) -> Vec<BatchOutcome> {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(paths.len());
    audit_files_with_workers(paths, config, metadata, workers)
}

/// Audit every file with an explicit worker count (at least one).
pub fn audit_files_with_workers(
    paths: &[PathBuf],
    config: &Config,
    metadata: &AuditMetadata,
    workers: usize,
) -> Vec<BatchOutcome> {
    if paths.is_empty() {
        return Vec::new();
    }

    let (job_tx, job_rx) = unbounded::<(usize, &PathBuf)>();
    let (result_tx, result_rx) = bounded(paths.len());

    for job in paths.iter().enumerate() {
        // Receiver is alive until the scope below ends.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let workers = workers.max(1);
    debug!(files = paths.len(), workers, "starting batch audit");

    thread::scope(|scope| {
        for _ in 0..workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            scope.spawn(move || {
                for (index, path) in jobs.iter() {
                    let result = audit_file(path, config, metadata);
                    if let Err(e) = &result {
                        warn!(path = %path.display(), error = %e, "audit failed");
                    }
                    let _ = results.send((index, result));
                }
            });
        }
    });
    drop(result_tx);

    let mut outcomes: Vec<(usize, Result<AuditRecord, SeriesError>)> = result_rx.iter().collect();
    outcomes.sort_by_key(|(index, _)| *index);

    outcomes
        .into_iter()
        .map(|(index, result)| BatchOutcome {
            path: paths[index].clone(),
            result,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelGroup;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file.flush().unwrap();
        file
    }

    fn config() -> Config {
        Config {
            groups: vec![ChannelGroup::new("Elektrisch", ["Power1", "Power2"])],
            ..Config::default()
        }
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let good = csv_file("elapsedTime,Power1,Power2\n0,100,50\n10,200,50\n20,100,50\n");
        let bad = csv_file("time,Power1\n0,1\n");
        let other = csv_file("elapsedTime,Power1\n0,10\n3600,10\n");

        let paths = vec![
            good.path().to_path_buf(),
            bad.path().to_path_buf(),
            other.path().to_path_buf(),
        ];
        let outcomes = audit_files_with_workers(&paths, &config(), &AuditMetadata::default(), 2);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].path, paths[0]);
        assert_eq!(outcomes[1].path, paths[1]);

        let first = outcomes[0].result.as_ref().unwrap();
        assert_eq!(first.group("Elektrisch").unwrap().total.as_ref().unwrap().max, 250.0);

        assert!(matches!(outcomes[1].result, Err(SeriesError::MissingColumn(_))));

        let third = outcomes[2].result.as_ref().unwrap();
        assert_eq!(third.overall.total_energy, 0.01);
    }

    #[test]
    fn test_batch_matches_single_run() {
        let file = csv_file("elapsedTime,Power1\n0,5\n1,7\n4,2\n");
        let paths = vec![file.path().to_path_buf()];
        let meta = AuditMetadata::new("Lathe");

        let single = audit_file(file.path(), &config(), &meta).unwrap();
        let batch = audit_files(&paths, &config(), &meta);
        assert_eq!(batch[0].result.as_ref().unwrap(), &single);
    }

    #[test]
    fn test_empty_batch() {
        assert!(audit_files(&[], &config(), &AuditMetadata::default()).is_empty());
    }
}
