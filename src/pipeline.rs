//! The two passes and the statistics they produce.
//!
//! ```text
//! dedup     walk(portfolio) → digest (parallel) → first-wins table → delete
//! compress  walk(targets)   → compress_file per asset (parallel) → summary
//! run       dedup, then compress
//! ```
//!
//! A single bad file never stops a pass. Per-file failures become a warning
//! log line and a counted failure in the summary. The only fatal condition
//! is a pass with no accessible root at all.
//!
//! ## Parallel Processing
//!
//! Hashing and compression fan out over the global rayon pool (sized by
//! `processing.max_processes` in `main`). Results come back in walker order,
//! so summaries and reports are deterministic regardless of which worker
//! finished first. Progress events are sent as each file completes and may
//! therefore arrive out of order.

use crate::compress::{CompressionPolicy, compress_file};
use crate::config::PipelineConfig;
use crate::dedup::{DigestTable, deduplicate};
use crate::digest::digest_assets;
use crate::imaging::ImageBackend;
use crate::types::{CompressionOutcome, OutcomeStatus, Removal};
use crate::walk::{ExtensionFilter, WalkError, walk};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A file the pass had to give up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Progress event sent as each file of the compress pass completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressEvent {
    Optimized {
        path: PathBuf,
        original_size_bytes: u64,
        new_size_bytes: u64,
    },
    Skipped {
        path: PathBuf,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

impl CompressEvent {
    fn from_result(result: &Result<CompressionOutcome, FileFailure>) -> Self {
        match result {
            Ok(outcome) => match outcome.status {
                OutcomeStatus::Optimized { new_size_bytes } => CompressEvent::Optimized {
                    path: outcome.path.clone(),
                    original_size_bytes: outcome.original_size_bytes,
                    new_size_bytes,
                },
                OutcomeStatus::Skipped { .. } => CompressEvent::Skipped {
                    path: outcome.path.clone(),
                },
            },
            Err(failure) => CompressEvent::Failed {
                path: failure.path.clone(),
                error: failure.error.clone(),
            },
        }
    }
}

/// Statistics of one dedup pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DedupSummary {
    pub files_seen: usize,
    pub unique: usize,
    pub removed: Vec<Removal>,
    /// Files that could not be hashed or deleted.
    pub failures: Vec<FileFailure>,
    pub bytes_reclaimed: u64,
}

/// Statistics of one compress pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionSummary {
    pub files_seen: usize,
    pub optimized: usize,
    /// Files left untouched: already optimal, or failed.
    pub skipped: usize,
    /// The subset of `skipped` that failed to read, decode, encode, or write.
    pub failed: usize,
    /// Sum of `original - new` over optimized files only.
    pub bytes_saved: u64,
    pub outcomes: Vec<CompressionOutcome>,
    pub failures: Vec<FileFailure>,
}

impl CompressionSummary {
    fn from_results(results: Vec<Result<CompressionOutcome, FileFailure>>) -> Self {
        let mut summary = CompressionSummary {
            files_seen: results.len(),
            ..Self::default()
        };
        for result in results {
            match result {
                Ok(outcome) => {
                    if outcome.is_optimized() {
                        summary.optimized += 1;
                        summary.bytes_saved += outcome.saved_bytes();
                    } else {
                        summary.skipped += 1;
                    }
                    summary.outcomes.push(outcome);
                }
                Err(failure) => {
                    summary.skipped += 1;
                    summary.failed += 1;
                    summary.failures.push(failure);
                }
            }
        }
        summary
    }

    /// Savings in kilobytes (1 kB = 1024 bytes).
    pub fn saved_kb(&self) -> f64 {
        self.bytes_saved as f64 / 1024.0
    }
}

/// Everything `run` did, in a form suitable for `--report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub dedup: DedupSummary,
    pub compress: CompressionSummary,
}

impl RunReport {
    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Pass 1: remove byte-identical duplicates under `roots`.
pub fn dedup_pass(
    roots: &[PathBuf],
    filter: &ExtensionFilter,
    dry_run: bool,
) -> Result<DedupSummary, PipelineError> {
    let walked = walk(roots, filter)?;
    let files_seen = walked.assets.len();
    tracing::info!(files = files_seen, "scanning for duplicates");

    let (digested, hash_failures) = digest_assets(walked.assets);
    let mut table = DigestTable::new();
    let report = deduplicate(&digested, &mut table, dry_run);

    let bytes_reclaimed = report.bytes_reclaimed();
    let failures = hash_failures
        .into_iter()
        .map(|f| FileFailure {
            path: f.path,
            error: f.error.to_string(),
        })
        .chain(report.failed.into_iter().map(|f| FileFailure {
            path: f.removal.duplicate,
            error: f.error.to_string(),
        }))
        .collect();

    Ok(DedupSummary {
        files_seen,
        unique: report.unique,
        removed: report.removed,
        failures,
        bytes_reclaimed,
    })
}

/// Pass 2: recompress every image under `roots` in place.
///
/// `events`, when given, receives one [`CompressEvent`] per file as it
/// completes. The sender is dropped when the pass returns.
pub fn compress_pass(
    backend: &impl ImageBackend,
    roots: &[PathBuf],
    filter: &ExtensionFilter,
    policy: &CompressionPolicy,
    dry_run: bool,
    events: Option<Sender<CompressEvent>>,
) -> Result<CompressionSummary, PipelineError> {
    let walked = walk(roots, filter)?;
    tracing::info!(files = walked.assets.len(), "compressing");

    let results: Vec<Result<CompressionOutcome, FileFailure>> = walked
        .assets
        .par_iter()
        .map_with(events, |tx, asset| {
            let result = compress_file(backend, &asset.path, policy, dry_run).map_err(|e| {
                tracing::warn!(path = %asset.path.display(), error = %e, "skipping file");
                FileFailure {
                    path: asset.path.clone(),
                    error: e.to_string(),
                }
            });
            if let Some(tx) = tx {
                // A closed receiver only means nobody is listening.
                let _ = tx.send(CompressEvent::from_result(&result));
            }
            result
        })
        .collect();

    Ok(CompressionSummary::from_results(results))
}

/// Run both passes with the roots and policy from `config`.
///
/// A missing portfolio root skips the dedup pass with a warning; the run
/// fails only when the compress pass has no accessible root either.
pub fn run(
    backend: &impl ImageBackend,
    config: &PipelineConfig,
    project_root: &Path,
    dry_run: bool,
    events: Option<Sender<CompressEvent>>,
) -> Result<RunReport, PipelineError> {
    let dedup = match dedup_pass(
        &[config.portfolio_root(project_root)],
        &config.dedup_filter(),
        dry_run,
    ) {
        Ok(summary) => summary,
        Err(PipelineError::Walk(e)) => {
            tracing::warn!(error = %e, "skipping dedup pass");
            DedupSummary::default()
        }
        Err(e) => return Err(e),
    };

    let compress = compress_pass(
        backend,
        &config.target_roots(project_root),
        &config.compress_filter(),
        &config.compression_policy(),
        dry_run,
        events,
    )?;

    Ok(RunReport {
        dry_run,
        dedup,
        compress,
    })
}
