//! Download command implementation

use super::CommandContext;
use crate::cli::DownloadArgs;
use crate::dry_run::display_plan;
use crate::output_types::DownloadOutput;
use crate::progress::{create_spinner, track_download};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use vegflow_core::acquisition::{AcquisitionPlan, AcquisitionRequest, Downloader, TaskRegistry};
use vegflow_core::formats::FormatRegistry;
use vegflow_core::imagery::HttpImagerySource;

pub async fn execute(args: DownloadArgs, ctx: &CommandContext) -> Result<()> {
    let spinner = (!ctx.output.is_json()).then(|| create_spinner("Reading ROI..."));
    let roi = FormatRegistry::with_defaults().read_roi(&args.roi).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let roi = roi.with_context(|| format!("Failed to read ROI {}", args.roi.display()))?;

    let dataset_name = match args.name {
        Some(name) => name,
        None => args
            .roi
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .context("Cannot derive a dataset name from the ROI path, pass --name")?,
    };

    let plan = AcquisitionPlan::new(
        AcquisitionRequest { dataset_name, roi, start_year: args.start_year, end_year: args.end_year },
        &ctx.config,
    )?;

    if ctx.dry_run {
        return display_plan(&ctx.output, &plan);
    }

    let source = HttpImagerySource::new(ctx.config.imagery_url.value.clone());
    ctx.output.info(format!(
        "Task {}: {} tiles x {} months from {}",
        ctx.task_id,
        plan.tiles.len(),
        plan.months.len(),
        source.base_url()
    ));

    let registry = TaskRegistry::new();
    registry.insert(ctx.task_id).await?;

    let (tx, rx) = mpsc::unbounded_channel();
    let plan_summary = plan.summary();
    let handle = registry.start(ctx.task_id, Downloader::new(Arc::new(source)), plan, Some(tx));

    let (joined, ()) = tokio::join!(handle, track_download(rx, !ctx.output.is_json()));
    let summary = joined.context("Download task panicked")??;

    if ctx.output.is_json() {
        return ctx.output.result(DownloadOutput {
            task_id: ctx.task_id.to_string(),
            plan: plan_summary,
            summary,
        });
    }

    ctx.output.section("Download Summary");
    ctx.output.kv("Output", plan_summary.output_dir.display());
    ctx.output.kv("Downloaded", summary.downloaded);
    ctx.output.kv("Skipped (insufficient coverage)", summary.skipped_invalid);
    ctx.output.kv("Skipped (no imagery)", summary.skipped_no_imagery);
    ctx.output.kv("Failed", summary.failed);

    if summary.failed > 0 {
        ctx.output.warning(format!("{} tiles failed to download:", summary.failed));
        for failure in &summary.failures {
            ctx.output.warning(format!("  tile_{} {}: {}", failure.tile, failure.period, failure.reason));
        }
    } else {
        ctx.output.success(format!("Saved {} tiles", summary.downloaded));
    }
    Ok(())
}
