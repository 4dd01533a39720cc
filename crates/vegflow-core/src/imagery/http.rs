use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VegflowError};
use crate::models::{MonthlyRange, Roi, Tile};
use crate::ports::ImagerySource;
use crate::validity::PixelStats;

/// Landsat 8 surface reflectance bands in download order: B, G, R, NIR, SWIR1, SWIR2
pub const OPTICAL_BANDS: [&str; 6] = ["SR_B2", "SR_B3", "SR_B4", "SR_B5", "SR_B6", "SR_B7"];

/// Imagery source backed by a compositing service speaking JSON over HTTP
pub struct HttpImagerySource {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,

    /// Collection identifier passed through to the service
    collection: String,

    client: reqwest::Client,
}

impl HttpImagerySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: "LANDSAT/LC08/C02/T1_L2".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a different collection identifier
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self.client.post(&url).json(body).send().await.map_err(|e| {
            VegflowError::Imagery {
                reason: format!("Failed to reach imagery service at {}: {}", self.base_url, e),
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VegflowError::Imagery {
                reason: format!("{} returned {}: {}", url, status, error_text),
            });
        }

        Ok(response)
    }

    fn period(&self, period: &MonthlyRange) -> Period {
        Period { collection: self.collection.clone(), start: period.start, end: period.end }
    }
}

#[async_trait]
impl ImagerySource for HttpImagerySource {
    async fn scene_count(&self, roi: &Roi, period: &MonthlyRange) -> Result<u64> {
        let request = ScenesRequest {
            geometry: geojson::Geometry::new(geojson::Value::from(roi.geometry())),
            epsg: roi.crs().epsg,
            period: self.period(period),
        };

        let response: ScenesResponse = self
            .post("scenes", &request)
            .await?
            .json()
            .await
            .map_err(|e| parse_error("scenes", e))?;

        Ok(response.count)
    }

    async fn pixel_stats(
        &self,
        tile: &Tile,
        period: &MonthlyRange,
        scale_m: f64,
    ) -> Result<PixelStats> {
        let request = StatsRequest {
            geometry: tile_geometry(tile),
            epsg: tile.crs.epsg,
            period: self.period(period),
            mask_band: OPTICAL_BANDS[2],
            scale_m,
        };

        let response: StatsResponse = self
            .post("stats", &request)
            .await?
            .json()
            .await
            .map_err(|e| parse_error("stats", e))?;

        Ok(PixelStats::new(response.valid_pixels, response.total_pixels, scale_m))
    }

    async fn fetch_tile(
        &self,
        tile: &Tile,
        period: &MonthlyRange,
        dimensions: u32,
    ) -> Result<Vec<u8>> {
        let request = CompositeRequest {
            geometry: tile_geometry(tile),
            epsg: tile.crs.epsg,
            period: self.period(period),
            bands: &OPTICAL_BANDS,
            dimensions: [dimensions, dimensions],
            format: "GEO_TIFF",
        };

        let bytes = self
            .post("composite", &request)
            .await?
            .bytes()
            .await
            .map_err(|e| parse_error("composite", e))?;

        if bytes.is_empty() {
            return Err(VegflowError::Imagery {
                reason: format!("Empty composite for tile {} in {}", tile.index, period.label),
            });
        }

        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn tile_geometry(tile: &Tile) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(&tile.polygon()))
}

fn parse_error(endpoint: &str, e: reqwest::Error) -> VegflowError {
    VegflowError::Imagery { reason: format!("Failed to parse /{} response: {}", endpoint, e) }
}

/// Collection and inclusive date range shared by every request
#[derive(Debug, Serialize)]
struct Period {
    collection: String,
    start: NaiveDate,
    end: NaiveDate,
}

/// Request body for the scene availability endpoint
#[derive(Debug, Serialize)]
struct ScenesRequest {
    geometry: geojson::Geometry,
    epsg: u32,
    #[serde(flatten)]
    period: Period,
}

#[derive(Debug, Deserialize)]
struct ScenesResponse {
    count: u64,
}

/// Request body for the mask statistics endpoint
#[derive(Debug, Serialize)]
struct StatsRequest {
    geometry: geojson::Geometry,
    epsg: u32,
    #[serde(flatten)]
    period: Period,
    mask_band: &'static str,
    scale_m: f64,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    valid_pixels: f64,
    total_pixels: f64,
}

/// Request body for the composite download endpoint
#[derive(Debug, Serialize)]
struct CompositeRequest<'a> {
    geometry: geojson::Geometry,
    epsg: u32,
    #[serde(flatten)]
    period: Period,
    bands: &'a [&'a str],
    dimensions: [u32; 2],
    format: &'static str,
}
