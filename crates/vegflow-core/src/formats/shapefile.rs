//! Shapefile ROI reader
//!
//! A shapefile ROI is the `.shp` geometry plus its `.shx` index and `.dbf`
//! attribute table. The `.prj` sidecar is optional; without it the
//! coordinates are taken as EPSG:4326.

use async_trait::async_trait;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::dbase::FieldValue;
use shapefile::{PolygonRing, Shape};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, VegflowError};
use crate::formats::validation::FormatValidator;
use crate::formats::{dataset_name, FormatValidation, RoiDataset, RoiFeature, RoiReader};

const REQUIRED_COMPONENTS: [&str; 3] = ["shp", "shx", "dbf"];

/// Shapefile format reader
pub struct ShapefileReader;

#[async_trait]
impl RoiReader for ShapefileReader {
    async fn read(&self, path: &Path) -> Result<RoiDataset> {
        let base = shapefile_base(path)?;
        verify_components(&base)?;

        let crs = match tokio::fs::read_to_string(base.with_extension("prj")).await {
            Ok(prj) => parse_epsg_from_prj(&prj).unwrap_or_else(|| {
                tracing::warn!(path = %path.display(), "No EPSG authority in .prj, assuming EPSG:4326");
                4326
            }),
            Err(_) => 4326,
        };

        let mut reader = shapefile::Reader::from_path(path).map_err(|e| format_error(format!(
            "Failed to open Shapefile: {}",
            e
        )))?;

        let mut features = Vec::new();
        for (idx, result) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) =
                result.map_err(|e| format_error(format!("Failed to read feature {}: {}", idx, e)))?;

            let properties = record
                .into_iter()
                .map(|(name, value)| (name, convert_field(value)))
                .collect::<HashMap<_, _>>();

            features.push(RoiFeature {
                id: idx.to_string(),
                geometry: convert_shape(shape),
                properties,
            });
        }

        Ok(RoiDataset {
            name: dataset_name(path),
            format_name: "Shapefile".to_string(),
            crs,
            features,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        let base = match shapefile_base(path) {
            Ok(base) => base,
            Err(e) => {
                let mut validation = validation;
                validation.errors.push(e.to_string());
                return Ok(validation);
            }
        };

        let components =
            FormatValidator::validate_component_files(&base, &REQUIRED_COMPONENTS, &["prj"]);
        Ok(FormatValidator::merge_validations(vec![validation, components]))
    }
}

fn format_error(message: String) -> VegflowError {
    VegflowError::FormatError { format: "Shapefile".to_string(), message }
}

/// Path of the shapefile without its extension
fn shapefile_base(path: &Path) -> Result<PathBuf> {
    let is_shp = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("shp"));

    if !is_shp {
        return Err(VegflowError::InvalidPath {
            path: path.to_path_buf(),
            reason: "Not a Shapefile (.shp)".to_string(),
        });
    }
    Ok(path.with_extension(""))
}

fn verify_components(base: &Path) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COMPONENTS
        .iter()
        .filter(|ext| !base.with_extension(ext).exists())
        .map(|ext| format!(".{}", ext))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format_error(format!("Missing required component files: {}", missing.join(", "))))
    }
}

/// EPSG code of a `.prj` WKT definition.
///
/// Projected definitions nest the datum's `AUTHORITY` before their own, so
/// the last EPSG authority is the one describing the whole CRS.
fn parse_epsg_from_prj(prj: &str) -> Option<u32> {
    const MARKER: &str = "AUTHORITY[\"EPSG\",";

    let start = prj.rfind(MARKER)? + MARKER.len();
    let code: String = prj[start..]
        .trim_start_matches(|c: char| c == '"' || c.is_whitespace())
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    code.parse().ok()
}

/// Polygonal shapes become a multipolygon, everything else has no ROI geometry
fn convert_shape(shape: Shape) -> Option<geo::Geometry<f64>> {
    let rings: Vec<(bool, Vec<Coord<f64>>)> = match shape {
        Shape::Polygon(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| {
                let coords = ring.points().iter().map(|p| Coord { x: p.x, y: p.y }).collect();
                (matches!(ring, PolygonRing::Outer(_)), coords)
            })
            .collect(),
        Shape::PolygonM(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| {
                let coords = ring.points().iter().map(|p| Coord { x: p.x, y: p.y }).collect();
                (matches!(ring, PolygonRing::Outer(_)), coords)
            })
            .collect(),
        Shape::PolygonZ(polygon) => polygon
            .rings()
            .iter()
            .map(|ring| {
                let coords = ring.points().iter().map(|p| Coord { x: p.x, y: p.y }).collect();
                (matches!(ring, PolygonRing::Outer(_)), coords)
            })
            .collect(),
        Shape::NullShape => return None,
        other => {
            tracing::debug!(shape = ?other.shapetype(), "Ignoring non-polygon shape");
            return None;
        }
    };

    Some(geo::Geometry::MultiPolygon(assemble_polygons(rings)))
}

/// Group rings into polygons: each outer ring starts a polygon and the
/// inner rings that follow are its holes.
fn assemble_polygons(rings: Vec<(bool, Vec<Coord<f64>>)>) -> MultiPolygon<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for (is_outer, coords) in rings {
        let ring = LineString::new(coords);
        match polygons.last_mut() {
            Some((_, holes)) if !is_outer => holes.push(ring),
            _ => polygons.push((ring, Vec::new())),
        }
    }

    MultiPolygon::new(
        polygons
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    )
}

fn convert_field(value: FieldValue) -> serde_json::Value {
    let number = |n: f64| {
        serde_json::Number::from_f64(n).map(serde_json::Value::Number).unwrap_or_default()
    };

    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => serde_json::Value::String(s),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => number(n),
        FieldValue::Float(Some(f)) => number(f as f64),
        FieldValue::Integer(i) => serde_json::Value::from(i),
        FieldValue::Logical(Some(b)) => serde_json::Value::Bool(b),
        FieldValue::Date(Some(date)) => serde_json::Value::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        _ => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_supported_extensions() {
        assert_eq!(ShapefileReader.supported_extensions(), &["shp"]);
        assert_eq!(ShapefileReader.format_name(), "Shapefile");
    }

    #[tokio::test]
    async fn test_validation_missing_file() {
        let validation = ShapefileReader.validate(Path::new("/nonexistent/roi.shp")).await.unwrap();
        assert!(!validation.is_valid());
    }

    #[tokio::test]
    async fn test_validation_missing_components() {
        let dir = TempDir::new().unwrap();
        let shp = dir.path().join("roi.shp");
        std::fs::write(&shp, b"").unwrap();

        let validation = ShapefileReader.validate(&shp).await.unwrap();
        assert_eq!(validation.errors.len(), 2);
        assert!(validation.has_warnings());
    }

    #[tokio::test]
    async fn test_read_reports_missing_components() {
        let dir = TempDir::new().unwrap();
        let shp = dir.path().join("roi.shp");
        std::fs::write(&shp, b"").unwrap();
        std::fs::write(dir.path().join("roi.shx"), b"").unwrap();

        let err = ShapefileReader.read(&shp).await.unwrap_err();
        match err {
            VegflowError::FormatError { message, .. } => assert!(message.contains(".dbf")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_projected_prj_uses_outer_authority() {
        let prj = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],AUTHORITY["EPSG","4326"]],PROJECTION["Mercator_1SP"],AUTHORITY["EPSG","3857"]]"#;
        assert_eq!(parse_epsg_from_prj(prj), Some(3857));
        assert_eq!(parse_epsg_from_prj(r#"GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]]"#), Some(4326));
        assert_eq!(parse_epsg_from_prj(r#"GEOGCS["GCS_WGS_1984"]"#), None);
    }

    #[test]
    fn test_rings_grouped_into_polygons() {
        let square = |o: f64, s: f64| {
            vec![
                Coord { x: o, y: o },
                Coord { x: o, y: o + s },
                Coord { x: o + s, y: o + s },
                Coord { x: o + s, y: o },
                Coord { x: o, y: o },
            ]
        };

        let mp = assemble_polygons(vec![
            (true, square(0.0, 10.0)),
            (false, square(2.0, 2.0)),
            (true, square(20.0, 5.0)),
        ]);

        assert_eq!(mp.0.len(), 2);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert!(mp.0[1].interiors().is_empty());
    }
}
