use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::acquisition::plan::{AcquisitionPlan, Job};
use crate::error::{Result, VegflowError};
use crate::ports::ImagerySource;
use crate::validity::{assess_tile, TileVerdict};

/// How a single (tile, month) job ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Downloaded { path: PathBuf, bytes: usize },
    /// Stats were fetched but the tile did not pass the validity filter
    SkippedInvalid { verdict: TileVerdict },
    /// No scenes in the month
    SkippedNoImagery,
    Failed { reason: String },
}

/// Progress of a run, sent as jobs complete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { total_jobs: usize },
    JobFinished { tile: usize, period: String, outcome: JobOutcome },
    Finished { summary: RunSummary },
}

/// A job that failed, kept for the run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub tile: usize,
    pub period: String,
    pub reason: String,
}

/// Counts of job outcomes for a finished run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub downloaded: usize,
    pub skipped_invalid: usize,
    pub skipped_no_imagery: usize,
    pub failed: usize,
    pub failures: Vec<JobFailure>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped_invalid + self.skipped_no_imagery + self.failed
    }

    fn record(&mut self, tile: usize, period: &str, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Downloaded { .. } => self.downloaded += 1,
            JobOutcome::SkippedInvalid { .. } => self.skipped_invalid += 1,
            JobOutcome::SkippedNoImagery => self.skipped_no_imagery += 1,
            JobOutcome::Failed { reason } => {
                self.failed += 1;
                self.failures.push(JobFailure {
                    tile,
                    period: period.to_string(),
                    reason: reason.clone(),
                });
            }
        }
    }
}

/// Executes an [`AcquisitionPlan`] against an imagery source
#[derive(Clone)]
pub struct Downloader {
    source: Arc<dyn ImagerySource>,
}

impl Downloader {
    pub fn new(source: Arc<dyn ImagerySource>) -> Self {
        Self { source }
    }

    /// Run every job of `plan`, at most `plan.max_workers` at a time.
    ///
    /// Scene availability is checked once per month; months without scenes
    /// skip all their jobs. Per-job failures are logged and counted, they
    /// never stop the run. Only an unusable output directory is an error.
    pub async fn run(
        &self,
        plan: &AcquisitionPlan,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> Result<RunSummary> {
        tokio::fs::create_dir_all(&plan.output_dir).await.map_err(|e| {
            VegflowError::InvalidPath {
                path: plan.output_dir.clone(),
                reason: format!("cannot create output directory: {}", e),
            }
        })?;

        let emit = |event: ProgressEvent| {
            if let Some(tx) = &progress {
                // A closed receiver only means nobody is watching
                let _ = tx.send(event);
            }
        };

        emit(ProgressEvent::Started { total_jobs: plan.job_count() });
        tracing::info!(
            dataset = %plan.dataset_name,
            source = self.source.name(),
            jobs = plan.job_count(),
            workers = plan.max_workers,
            "Starting acquisition"
        );

        let mut summary = RunSummary::default();
        if plan.tiles.is_empty() {
            emit(ProgressEvent::Finished { summary: summary.clone() });
            return Ok(summary);
        }

        // Futures are boxed so the spawned run stays `Send` for any borrow of `plan`
        let availability: Vec<bool> = stream::iter(0..plan.months.len())
            .map(|m| self.has_imagery(plan, m).boxed())
            .buffered(plan.max_workers)
            .collect()
            .await;

        // (tile, month) positions in the plan
        let mut jobs: Vec<(usize, usize)> = Vec::new();
        for (m, (period, available)) in plan.months.iter().zip(availability).enumerate() {
            if available {
                jobs.extend((0..plan.tiles.len()).map(|t| (t, m)));
                continue;
            }
            for job in plan.jobs_for(period) {
                let outcome = JobOutcome::SkippedNoImagery;
                summary.record(job.tile.index, &period.label, &outcome);
                emit(ProgressEvent::JobFinished {
                    tile: job.tile.index,
                    period: period.label.clone(),
                    outcome,
                });
            }
        }

        let mut results = stream::iter(jobs)
            .map(|(t, m)| self.process(plan, t, m).boxed())
            .buffer_unordered(plan.max_workers);

        while let Some((job, outcome)) = results.next().await {
            summary.record(job.tile.index, &job.period.label, &outcome);
            emit(ProgressEvent::JobFinished {
                tile: job.tile.index,
                period: job.period.label.clone(),
                outcome,
            });
        }

        tracing::info!(
            dataset = %plan.dataset_name,
            downloaded = summary.downloaded,
            skipped_invalid = summary.skipped_invalid,
            skipped_no_imagery = summary.skipped_no_imagery,
            failed = summary.failed,
            "Acquisition finished"
        );
        emit(ProgressEvent::Finished { summary: summary.clone() });

        Ok(summary)
    }

    async fn has_imagery(&self, plan: &AcquisitionPlan, month: usize) -> bool {
        let period = &plan.months[month];
        match self.source.scene_count(&plan.roi, period).await {
            Ok(0) => {
                tracing::info!(period = %period.label, "No scenes for this month, skipping");
                false
            }
            Ok(count) => {
                tracing::debug!(period = %period.label, scenes = count, "Scenes available");
                true
            }
            Err(e) => {
                // Let the per-tile requests surface the failure
                tracing::warn!(period = %period.label, error = %e, "Scene count failed");
                true
            }
        }
    }

    async fn process<'a>(
        &self,
        plan: &'a AcquisitionPlan,
        tile: usize,
        month: usize,
    ) -> (Job<'a>, JobOutcome) {
        let job = Job { tile: &plan.tiles[tile], period: &plan.months[month] };
        let outcome = match self.try_process(plan, job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    tile = job.tile.index,
                    period = %job.period.label,
                    error = %e,
                    "Tile download failed"
                );
                JobOutcome::Failed { reason: e.to_string() }
            }
        };
        (job, outcome)
    }

    async fn try_process(&self, plan: &AcquisitionPlan, job: Job<'_>) -> Result<JobOutcome> {
        let Job { tile, period } = job;

        let stats = self.source.pixel_stats(tile, period, plan.validity_scale_m).await?;
        let verdict = assess_tile(&stats);
        if !verdict.is_valid() {
            tracing::info!(
                tile = tile.index,
                period = %period.label,
                valid = stats.valid_pixels,
                total = stats.total_pixels,
                "Skipped tile: most pixels masked or invalid"
            );
            return Ok(JobOutcome::SkippedInvalid { verdict });
        }

        let bytes = self.source.fetch_tile(tile, period, plan.dimensions).await?;

        let path = plan.output_path(tile, period);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        write_atomically(&path, &bytes).await?;

        tracing::info!(tile = tile.index, period = %period.label, path = %path.display(), "Saved tile");
        Ok(JobOutcome::Downloaded { path, bytes: bytes.len() })
    }
}

/// Write through a `.part` sibling so an interrupted write never leaves a
/// truncated raster under the final name
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    tokio::fs::rename(&partial, path).await?;
    Ok(())
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader").field("source", &self.source.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_records_failures() {
        let mut summary = RunSummary::default();
        summary.record(0, "2020-01", &JobOutcome::Downloaded { path: "a.tif".into(), bytes: 4 });
        summary.record(1, "2020-01", &JobOutcome::SkippedInvalid { verdict: TileVerdict::Degenerate });
        summary.record(2, "2020-01", &JobOutcome::Failed { reason: "timeout".to_string() });
        summary.record(0, "2020-02", &JobOutcome::SkippedNoImagery);

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].tile, 2);
        assert_eq!(summary.failures[0].reason, "timeout");
    }

    #[test]
    fn test_progress_event_json() {
        let event = ProgressEvent::JobFinished {
            tile: 3,
            period: "2021-06".to_string(),
            outcome: JobOutcome::SkippedNoImagery,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "job_finished");
        assert_eq!(json["outcome"]["outcome"], "skipped_no_imagery");
    }

    #[tokio::test]
    async fn test_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2020-01.tif");

        write_atomically(&path, b"GTiff").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"GTiff");
        assert!(!dir.path().join("2020-01.tif.part").exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_raster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("2020-01.tif");

        assert!(write_atomically(&path, b"GTiff").await.is_err());
        assert!(!path.exists());
    }
}
