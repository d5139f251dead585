//! Concurrent orchestration of the per-pack pipeline
//!
//! Every pack runs layout, acquisition, build and artifact collection in its own
//! task. A failing pack is logged and recorded; it never stops the others.

use crate::{
    config::{Config, validate_pack},
    core::{
        acquire::ResourceAcquirer,
        artifacts::ArtifactCollector,
        builder::{BuildStatus, PackBuilder},
        layout::WorkspaceLayout,
        pack::{AcquisitionType, PackDefinition},
    },
    error::{BuilderError, Result},
    utils::{fs::FileSystemUtils, http::Downloader},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};

/// How one pack's run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackOutcome {
    /// Built; the listed artifacts are now in the output directory
    Built { artifacts: Vec<PathBuf> },
    /// Sources were not in place, so no build ran
    NothingToBuild,
    /// `skip: true` in the document
    Skipped,
    /// A step failed; the message carries the whole error chain
    Failed { error: String },
}

/// Outcome of one pack, tagged with its identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackReport {
    pub name: String,
    pub version: String,
    #[serde(flatten)]
    pub outcome: PackOutcome,
}

/// Aggregate result of a run, in document order
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub packs: Vec<PackReport>,
}

impl RunSummary {
    pub fn failed(&self) -> impl Iterator<Item = &PackReport> {
        self.packs
            .iter()
            .filter(|p| matches!(p.outcome, PackOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&PackOutcome) -> bool) -> usize {
        self.packs.iter().filter(|p| pred(&p.outcome)).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        write!(
            f,
            "Processed {} packs in {}.{:03}s: {} built, {} with nothing to build, {} skipped, {} failed",
            self.packs.len(),
            elapsed.num_seconds(),
            elapsed.num_milliseconds() % 1000,
            self.count(|o| matches!(o, PackOutcome::Built { .. })),
            self.count(|o| matches!(o, PackOutcome::NothingToBuild)),
            self.count(|o| matches!(o, PackOutcome::Skipped)),
            self.count(|o| matches!(o, PackOutcome::Failed { .. })),
        )
    }
}

/// Drives every configured pack through the pipeline concurrently
pub struct Orchestrator {
    config: Arc<Config>,
    downloader: Downloader,
}

impl Orchestrator {
    /// Create an orchestrator; the HTTP client is shared by all packs
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            config: Arc::new(config),
            downloader: Downloader::new()?,
        })
    }

    /// Process all packs and wait for every task to finish
    ///
    /// Only failures that prevent the run from starting are returned as errors;
    /// per-pack failures are reported in the summary.
    pub async fn run(&self, packs: Vec<PackDefinition>) -> Result<RunSummary> {
        let started_at = Utc::now();

        if packs.iter().any(|p| !p.skip) {
            let output_dir = &self.config.artifacts.output_dir;
            FileSystemUtils::new()
                .ensure_dir(output_dir)
                .await
                .map_err(|e| BuilderError::layout(output_dir, e))?;
        }

        let semaphore = self.config.jobs.map(|jobs| Arc::new(Semaphore::new(jobs)));
        let mut join_set = JoinSet::new();
        let mut slots: Vec<Option<PackReport>> = vec![None; packs.len()];
        let mut task_index = HashMap::new();

        for (index, pack) in packs.iter().enumerate() {
            let span = info_span!("pack", name = %pack.name);
            let task = process_pack(
                pack.clone(),
                Arc::clone(&self.config),
                self.downloader.clone(),
                semaphore.clone(),
            );
            let handle = join_set.spawn(task.instrument(span));
            task_index.insert(handle.id(), index);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((id, report)) => {
                    if let Some(&index) = task_index.get(&id) {
                        slots[index] = Some(report);
                    }
                }
                Err(e) => {
                    if let Some(&index) = task_index.get(&e.id()) {
                        let pack = &packs[index];
                        error!("[{}] Task panicked: {}", pack.name, e);
                        slots[index] = Some(PackReport {
                            name: pack.name.clone(),
                            version: pack.version.clone(),
                            outcome: PackOutcome::Failed {
                                error: format!("task panicked: {e}"),
                            },
                        });
                    }
                }
            }
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            packs: slots.into_iter().flatten().collect(),
        };
        info!("{}", summary);
        Ok(summary)
    }
}

/// One pack's task body; never fails, errors become `PackOutcome::Failed`
async fn process_pack(
    pack: PackDefinition,
    config: Arc<Config>,
    downloader: Downloader,
    semaphore: Option<Arc<Semaphore>>,
) -> PackReport {
    let report = |outcome| PackReport {
        name: pack.name.clone(),
        version: pack.version.clone(),
        outcome,
    };

    if pack.skip {
        info!("Skipping...");
        return report(PackOutcome::Skipped);
    }

    let _permit = match semaphore {
        Some(semaphore) => match semaphore.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                return report(PackOutcome::Failed {
                    error: format!("concurrency limiter closed: {e}"),
                });
            }
        },
        None => None,
    };

    info!("Starting...");
    match run_pipeline(&pack, &config, &downloader).await {
        Ok(outcome) => {
            info!("Finished");
            report(outcome)
        }
        Err(e) => {
            let message = error_chain(&e);
            error!("{}", message);
            report(PackOutcome::Failed { error: message })
        }
    }
}

/// Layout, acquisition, build and collection, strictly in that order
async fn run_pipeline(
    pack: &PackDefinition,
    config: &Config,
    downloader: &Downloader,
) -> Result<PackOutcome> {
    validate_pack(pack)?;

    let fs_utils = FileSystemUtils::new();
    let layout = WorkspaceLayout::new(config, pack);
    layout.create_root(&fs_utils).await?;

    let acquired = ResourceAcquirer::new(config, downloader)
        .acquire(pack, &layout)
        .await?;
    match pack.acquisition {
        AcquisitionType::Tar if !acquired.downloaded => {
            info!("Reused archive {}", layout.archive_path(pack).display())
        }
        AcquisitionType::Git if !acquired.cloned => {
            info!("Reused clone {}", layout.build_dir.display())
        }
        _ => {}
    }

    if PackBuilder::new(config).build(pack, &layout).await? == BuildStatus::NothingToBuild {
        warn!("No sources at {}, skipping artifact collection", layout.version_dir.display());
        return Ok(PackOutcome::NothingToBuild);
    }

    let artifacts = ArtifactCollector::new(config)
        .collect(pack, &layout)
        .await?
        .into_iter()
        .map(|a| a.destination)
        .collect();

    Ok(PackOutcome::Built { artifacts })
}

fn error_chain(error: &BuilderError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    if let BuilderError::Process { stderr, .. } = error {
        if let Some(last) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            message.push_str(": ");
            message.push_str(last.trim());
        }
    }
    message
}
