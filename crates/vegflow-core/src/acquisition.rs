//! Acquisition runs: plan the (tile, month) jobs for an ROI and year range,
//! then fetch every valid tile composite from an imagery source.

pub mod downloader;
pub mod plan;
pub mod task;

pub use downloader::{Downloader, JobFailure, JobOutcome, ProgressEvent, RunSummary};
pub use plan::{AcquisitionPlan, AcquisitionRequest, Job, PlanSummary};
pub use task::{TaskId, TaskRegistry, TaskStatus};
