use async_trait::async_trait;

use crate::error::Result;
use crate::models::{MonthlyRange, Roi, Tile};
use crate::validity::PixelStats;

/// Port for a Landsat 8 imagery backend.
///
/// The backend owns compositing and cloud, shadow and water masking. Callers
/// only see scene availability, mask statistics and the finished raster.
#[async_trait]
pub trait ImagerySource: Send + Sync {
    /// Number of scenes intersecting `roi` within `period`
    async fn scene_count(&self, roi: &Roi, period: &MonthlyRange) -> Result<u64>;

    /// Valid and total pixel counts of the masked composite over `tile`,
    /// sampled at `scale_m` metres
    async fn pixel_stats(&self, tile: &Tile, period: &MonthlyRange, scale_m: f64)
        -> Result<PixelStats>;

    /// GeoTIFF bytes of the composite clipped to `tile`, `dimensions` pixels square
    async fn fetch_tile(&self, tile: &Tile, period: &MonthlyRange, dimensions: u32)
        -> Result<Vec<u8>>;

    /// Backend name used in logs
    fn name(&self) -> &str;
}
