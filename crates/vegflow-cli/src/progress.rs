use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use vegflow_core::acquisition::{JobOutcome, ProgressEvent};

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar for determinate progress
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb.set_message(message.to_string());
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Drive a progress bar from download events until the channel closes.
///
/// The bar is hidden when `visible` is false so JSON output stays clean.
pub async fn track_download(mut events: UnboundedReceiver<ProgressEvent>, visible: bool) {
    let mut bar: Option<ProgressBar> = None;
    let mut downloaded = 0usize;

    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::Started { total_jobs } => {
                let pb = if visible {
                    create_progress_bar(total_jobs as u64, "Downloading tiles")
                } else {
                    ProgressBar::hidden()
                };
                bar = Some(pb);
            }
            ProgressEvent::JobFinished { tile, period, outcome } => {
                let Some(pb) = &bar else { continue };
                match outcome {
                    JobOutcome::Downloaded { .. } => downloaded += 1,
                    JobOutcome::Failed { reason } => {
                        pb.println(format!("✗ tile_{} {}: {}", tile, period, reason));
                    }
                    JobOutcome::SkippedInvalid { .. } | JobOutcome::SkippedNoImagery => {}
                }
                pb.set_message(format!("Downloading tiles ({} saved, last {})", downloaded, period));
                pb.inc(1);
            }
            ProgressEvent::Finished { summary } => {
                if let Some(pb) = &bar {
                    finish_success(pb, &format!("Saved {} of {} tiles", summary.downloaded, summary.total()));
                }
            }
        }
    }
}
