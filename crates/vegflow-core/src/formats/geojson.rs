//! GeoJSON ROI reader

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, VegflowError};
use crate::formats::validation::FormatValidator;
use crate::formats::{dataset_name, FormatValidation, RoiDataset, RoiFeature, RoiReader};

/// GeoJSON format reader
pub struct GeoJsonReader;

#[async_trait]
impl RoiReader for GeoJsonReader {
    async fn read(&self, path: &Path) -> Result<RoiDataset> {
        let content = tokio::fs::read_to_string(path).await?;

        let geojson: geojson::GeoJson = content.parse().map_err(|e| VegflowError::FormatError {
            format: "GeoJSON".to_string(),
            message: format!("Failed to parse GeoJSON: {}", e),
        })?;

        let (features, crs) = self.extract_features_and_crs(geojson)?;

        Ok(RoiDataset {
            name: dataset_name(path),
            format_name: "GeoJSON".to_string(),
            crs,
            features,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["geojson", "json"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                if let Err(e) = content.parse::<geojson::GeoJson>() {
                    validation.errors.push(format!("Invalid GeoJSON: {}", e));
                }
            }
            Err(e) => validation.errors.push(format!("Cannot read file: {}", e)),
        }

        Ok(validation)
    }
}

impl GeoJsonReader {
    /// Extract features and CRS from GeoJSON
    fn extract_features_and_crs(
        &self,
        geojson: geojson::GeoJson,
    ) -> Result<(Vec<RoiFeature>, u32)> {
        match geojson {
            geojson::GeoJson::FeatureCollection(fc) => {
                // Legacy `crs` member; RFC 7946 files are always WGS 84
                let crs = fc
                    .foreign_members
                    .as_ref()
                    .and_then(|fm| fm.get("crs"))
                    .and_then(extract_epsg_from_crs)
                    .unwrap_or(4326);

                let features = fc
                    .features
                    .into_iter()
                    .enumerate()
                    .map(|(idx, feature)| self.convert_feature(feature, idx))
                    .collect::<Result<Vec<_>>>()?;

                Ok((features, crs))
            }
            geojson::GeoJson::Feature(feature) => {
                Ok((vec![self.convert_feature(feature, 0)?], 4326))
            }
            geojson::GeoJson::Geometry(geometry) => {
                let feature = RoiFeature {
                    id: "0".to_string(),
                    geometry: Some(convert_geometry(geometry)?),
                    properties: HashMap::new(),
                };
                Ok((vec![feature], 4326))
            }
        }
    }

    /// Convert a GeoJSON feature to an `RoiFeature`
    fn convert_feature(&self, feature: geojson::Feature, idx: usize) -> Result<RoiFeature> {
        let id = feature
            .id
            .as_ref()
            .map(|id| match id {
                geojson::feature::Id::String(s) => s.clone(),
                geojson::feature::Id::Number(n) => n.to_string(),
            })
            .unwrap_or_else(|| idx.to_string());

        let geometry = feature.geometry.map(convert_geometry).transpose()?;

        let properties = feature
            .properties
            .map(|props| props.into_iter().collect())
            .unwrap_or_default();

        Ok(RoiFeature { id, geometry, properties })
    }
}

fn convert_geometry(geometry: geojson::Geometry) -> Result<geo::Geometry<f64>> {
    geo::Geometry::<f64>::try_from(geometry).map_err(|e| VegflowError::FormatError {
        format: "GeoJSON".to_string(),
        message: format!("Unsupported geometry: {}", e),
    })
}

/// Extract EPSG code from a legacy CRS object
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    // "EPSG:3857" or "urn:ogc:def:crs:EPSG::3857"
    let name = crs.get("properties")?.get("name")?.as_str()?;
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    name.rsplit(':').next()?.parse().ok()
}
