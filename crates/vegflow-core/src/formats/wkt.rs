//! WKT ROI reader
//!
//! A `.wkt` file holds either one geometry or one geometry per line. Lines
//! may carry an EWKT `SRID=<epsg>;` prefix, which overrides the reader's
//! default CRS.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, VegflowError};
use crate::formats::validation::FormatValidator;
use crate::formats::{dataset_name, FormatValidation, RoiDataset, RoiFeature, RoiReader};

/// WKT format reader
#[derive(Debug, Clone, Copy)]
pub struct WktReader {
    /// CRS assumed for geometries without an SRID prefix
    default_epsg: u32,
}

impl WktReader {
    pub fn with_epsg(default_epsg: u32) -> Self {
        Self { default_epsg }
    }
}

impl Default for WktReader {
    fn default() -> Self {
        Self::with_epsg(4326)
    }
}

#[async_trait]
impl RoiReader for WktReader {
    async fn read(&self, path: &Path) -> Result<RoiDataset> {
        let content = tokio::fs::read_to_string(path).await?;

        let per_line = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(parse_entry)
            .collect::<Result<Vec<_>>>();

        // A single geometry may also be wrapped over several lines
        let entries = match per_line {
            Ok(entries) => entries,
            Err(line_err) => vec![parse_entry(content.trim()).map_err(|_| line_err)?],
        };

        let mut crs = None;
        let mut features = Vec::with_capacity(entries.len());
        for (idx, (srid, geometry)) in entries.into_iter().enumerate() {
            let epsg = srid.unwrap_or(self.default_epsg);
            match crs {
                None => crs = Some(epsg),
                Some(existing) if existing != epsg => {
                    return Err(VegflowError::FormatError {
                        format: "WKT".to_string(),
                        message: format!(
                            "Mixed SRIDs in one file: EPSG:{} and EPSG:{}",
                            existing, epsg
                        ),
                    });
                }
                Some(_) => {}
            }

            features.push(RoiFeature {
                id: idx.to_string(),
                geometry: Some(geometry),
                properties: HashMap::new(),
            });
        }

        Ok(RoiDataset {
            name: dataset_name(path),
            format_name: "WKT".to_string(),
            crs: crs.unwrap_or(self.default_epsg),
            features,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["wkt"]
    }

    fn format_name(&self) -> &str {
        "WKT"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = FormatValidator::validate_file_exists(path);
        if validation.is_valid() && std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false) {
            validation.errors.push("WKT file is empty".to_string());
        }
        Ok(validation)
    }
}

/// Parse one WKT or EWKT geometry
fn parse_entry(text: &str) -> Result<(Option<u32>, geo::Geometry<f64>)> {
    let invalid = |message: String| VegflowError::FormatError { format: "WKT".to_string(), message };

    let (srid, body) = match text.split_once(';') {
        Some((prefix, body)) if prefix.trim().to_ascii_uppercase().starts_with("SRID=") => {
            let code = prefix.trim()[5..]
                .parse::<u32>()
                .map_err(|e| invalid(format!("Invalid SRID '{}': {}", prefix.trim(), e)))?;
            (Some(code), body.trim())
        }
        _ => (None, text),
    };

    let wkt = wkt::Wkt::<f64>::from_str(body).map_err(|e| invalid(format!("Invalid WKT: {}", e)))?;
    let geometry = geo::Geometry::<f64>::try_from(wkt)
        .map_err(|e| invalid(format!("Unsupported WKT geometry: {}", e)))?;

    Ok((srid, geometry))
}
