use serde::Serialize;
use tabled::Tabled;
use vegflow_core::acquisition::{PlanSummary, RunSummary};
use vegflow_core::models::{MonthlyRange, Tile};

/// One row of the tile command
#[derive(Debug, Serialize, Tabled)]
pub struct TileRow {
    pub index: usize,
    pub column: usize,
    pub row: usize,
    #[tabled(display_with = "meters")]
    pub min_x: f64,
    #[tabled(display_with = "meters")]
    pub min_y: f64,
    #[tabled(display_with = "meters")]
    pub max_x: f64,
    #[tabled(display_with = "meters")]
    pub max_y: f64,
}

impl From<&Tile> for TileRow {
    fn from(tile: &Tile) -> Self {
        let [min_x, min_y, max_x, max_y] = tile.bounds().to_array();
        Self { index: tile.index, column: tile.cell.column, row: tile.cell.row, min_x, min_y, max_x, max_y }
    }
}

fn meters(value: &f64) -> String {
    format!("{:.1}", value)
}

/// One row of the months command
#[derive(Debug, Serialize, Tabled)]
pub struct MonthRow {
    pub label: String,
    pub start: String,
    pub end: String,
    pub days: i64,
}

impl From<&MonthlyRange> for MonthRow {
    fn from(range: &MonthlyRange) -> Self {
        Self {
            label: range.label.clone(),
            start: range.start.to_string(),
            end: range.end.to_string(),
            days: range.days(),
        }
    }
}

/// One row of the config command
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    pub key: String,
    pub value: String,
    pub source: String,
}

/// Output for tile command
#[derive(Debug, Serialize)]
pub struct TileOutput {
    pub roi: String,
    pub epsg: u32,
    pub tile_size_px: u32,
    pub resolution_m: f64,
    pub tiles: Vec<TileRow>,
    pub geojson_path: Option<String>,
}

/// Output for download command
#[derive(Debug, Serialize)]
pub struct DownloadOutput {
    pub task_id: String,
    pub plan: PlanSummary,
    pub summary: RunSummary,
}

/// Output for a download dry run
#[derive(Debug, Serialize)]
pub struct DryRunOutput {
    pub dry_run: bool,
    pub plan: PlanSummary,
    pub planned_actions: Vec<crate::dry_run::PlannedAction>,
}
