use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;

use crate::calendar::{monthly_ranges, YearPolicy};
use crate::config::LayeredConfig;
use crate::error::{Result, VegflowError};
use crate::models::{MonthlyRange, Roi, Tile};
use crate::tiling::tile_roi;

/// What to acquire: an ROI and an inclusive range of years
#[derive(Debug, Clone)]
pub struct AcquisitionRequest {
    /// Name of the output folder under the data directory
    pub dataset_name: String,
    pub roi: Roi,
    pub start_year: i32,
    pub end_year: i32,
}

/// One unit of work: a tile composite for one month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Job<'a> {
    pub tile: &'a Tile,
    pub period: &'a MonthlyRange,
}

/// Validated acquisition run, ready to execute or to print as a dry run
#[derive(Debug, Clone)]
pub struct AcquisitionPlan {
    pub dataset_name: String,
    /// `<data_dir>/<dataset_name>`
    pub output_dir: PathBuf,
    pub roi: Roi,
    pub tiles: Vec<Tile>,
    pub months: Vec<MonthlyRange>,
    /// Raster side in pixels, equal to the tile size
    pub dimensions: u32,
    pub validity_scale_m: f64,
    pub max_workers: usize,
}

impl AcquisitionPlan {
    /// Plan against the year policy of today's date
    pub fn new(request: AcquisitionRequest, config: &LayeredConfig) -> Result<Self> {
        let policy = YearPolicy::as_of(config.earliest_year.value, Local::now().date_naive());
        Self::with_policy(request, config, &policy)
    }

    /// Validate the year range, then tile the ROI.
    ///
    /// The range is checked first so a bad request never touches geometry.
    pub fn with_policy(
        request: AcquisitionRequest,
        config: &LayeredConfig,
        policy: &YearPolicy,
    ) -> Result<Self> {
        if request.dataset_name.trim().is_empty()
            || request.dataset_name.contains(['/', '\\'])
            || request.dataset_name == ".."
        {
            return Err(VegflowError::invalid_parameter(
                "dataset_name",
                format!("'{}' is not a usable directory name", request.dataset_name),
            ));
        }

        let months = monthly_ranges(request.start_year, request.end_year, policy)?;
        let tile_size_px = config.tile_size_px.value;
        let tiles = tile_roi(&request.roi, tile_size_px, config.resolution_m.value)?;

        if tiles.is_empty() {
            tracing::warn!(dataset = %request.dataset_name, "ROI produced no tiles, nothing to download");
        }

        let plan = Self {
            output_dir: config.data_dir.value.join(&request.dataset_name),
            dataset_name: request.dataset_name,
            roi: request.roi,
            tiles,
            months,
            dimensions: tile_size_px,
            validity_scale_m: config.validity_scale_m.value,
            max_workers: config.max_workers.value.max(1),
        };

        tracing::info!(
            dataset = %plan.dataset_name,
            tiles = plan.tiles.len(),
            months = plan.months.len(),
            jobs = plan.job_count(),
            "Planned acquisition"
        );

        Ok(plan)
    }

    pub fn job_count(&self) -> usize {
        self.tiles.len() * self.months.len()
    }

    /// Jobs of one month, in tile order
    pub fn jobs_for<'a>(&'a self, period: &'a MonthlyRange) -> impl Iterator<Item = Job<'a>> + 'a {
        self.tiles.iter().map(move |tile| Job { tile, period })
    }

    /// Every job, month by month
    pub fn jobs(&self) -> impl Iterator<Item = Job<'_>> + '_ {
        self.months.iter().flat_map(move |period| self.jobs_for(period))
    }

    /// `<output_dir>/tile_<index>/<YYYY-MM>.tif`
    pub fn output_path(&self, tile: &Tile, period: &MonthlyRange) -> PathBuf {
        self.output_dir.join(tile.dir_name()).join(period.file_name())
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            dataset_name: self.dataset_name.clone(),
            output_dir: self.output_dir.clone(),
            tiles: self.tiles.len(),
            months: self.months.len(),
            jobs: self.job_count(),
            first_month: self.months.first().map(|m| m.label.clone()),
            last_month: self.months.last().map(|m| m.label.clone()),
            dimensions: self.dimensions,
            max_workers: self.max_workers,
        }
    }
}

/// Serializable overview of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub dataset_name: String,
    pub output_dir: PathBuf,
    pub tiles: usize,
    pub months: usize,
    pub jobs: usize,
    pub first_month: Option<String>,
    pub last_month: Option<String>,
    pub dimensions: u32,
    pub max_workers: usize,
}
