use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vegflow_core::config::CliConfigOverrides;

/// vegflow - Landsat 8 tile acquisition for vegetation analysis
#[derive(Parser, Debug)]
#[command(name = "vegflow")]
#[command(about = "Tile a region of interest and download monthly Landsat 8 composites", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned actions without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./vegflow.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrideArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the configuration file and environment
#[derive(Args, Debug, Default)]
pub struct ConfigOverrideArgs {
    /// Root directory datasets are written under
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Ground resolution in meters per pixel
    #[arg(long, global = true, value_name = "METERS")]
    pub resolution: Option<f64>,

    /// Tile side in pixels
    #[arg(long, global = true, value_name = "PIXELS")]
    pub tile_size: Option<u32>,

    /// Maximum concurrent downloads
    #[arg(long, global = true, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Base URL of the imagery service
    #[arg(long, global = true, value_name = "URL")]
    pub imagery_url: Option<String>,
}

impl From<ConfigOverrideArgs> for CliConfigOverrides {
    fn from(args: ConfigOverrideArgs) -> Self {
        Self {
            data_dir: args.data_dir,
            resolution_m: args.resolution,
            tile_size_px: args.tile_size,
            max_workers: args.max_workers,
            imagery_url: args.imagery_url,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split an ROI into resolution-aligned tiles
    Tile(TileArgs),

    /// List the monthly date ranges of a year span
    Months(MonthsArgs),

    /// Download monthly composites for every valid tile of an ROI
    Download(DownloadArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct TileArgs {
    /// ROI file (GeoJSON, Shapefile or WKT)
    pub roi: PathBuf,

    /// Write the tiles as a GeoJSON FeatureCollection to this file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct MonthsArgs {
    /// First year (inclusive)
    pub start_year: i32,

    /// Last year (inclusive)
    pub end_year: i32,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// ROI file (GeoJSON, Shapefile or WKT)
    pub roi: PathBuf,

    /// First year (inclusive)
    #[arg(long)]
    pub start_year: i32,

    /// Last year (inclusive)
    #[arg(long)]
    pub end_year: i32,

    /// Dataset folder name under the data directory (defaults to the ROI file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Also write logs to <data_dir>/logs/<task_id>.log
    #[arg(long)]
    pub log_file: bool,
}
