//! ROI file formats.
//!
//! Each format implements the `RoiReader` trait, and the `FormatRegistry`
//! detects the format of a path by extension and dispatches to its reader.

use async_trait::async_trait;
use geo::{Geometry, MultiPolygon, Polygon};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, VegflowError};
use crate::models::{Crs, Roi};

pub mod geojson;
pub mod shapefile;
pub mod validation;
pub mod wkt;

/// Reader trait that all ROI format implementations must implement
#[async_trait]
pub trait RoiReader: Send + Sync {
    /// Read the features of an ROI file
    async fn read(&self, path: &Path) -> Result<RoiDataset>;

    /// Get supported file extensions (e.g., ["shp"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "Shapefile", "GeoJSON")
    fn format_name(&self) -> &str;

    /// Validate file structure without a full read
    async fn validate(&self, _path: &Path) -> Result<FormatValidation> {
        Ok(FormatValidation::default())
    }
}

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Validation errors that prevent reading
    pub errors: Vec<String>,

    /// Warnings that don't prevent reading but indicate potential issues
    pub warnings: Vec<String>,
}

impl FormatValidation {
    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Features read from an ROI file
#[derive(Debug, Clone)]
pub struct RoiDataset {
    /// Dataset name, the file stem
    pub name: String,

    /// Format the dataset was read from
    pub format_name: String,

    /// CRS EPSG code of the coordinates
    pub crs: u32,

    pub features: Vec<RoiFeature>,
}

/// Feature read from an ROI file
#[derive(Debug, Clone)]
pub struct RoiFeature {
    pub id: String,

    /// None for features without geometry
    pub geometry: Option<Geometry<f64>>,

    pub properties: HashMap<String, serde_json::Value>,
}

impl RoiDataset {
    /// Collect every areal feature into one ROI.
    ///
    /// Features without geometry or with non-areal geometry are skipped.
    pub fn into_roi(self) -> Roi {
        let mut polygons: Vec<Polygon<f64>> = Vec::new();

        for feature in self.features {
            match feature.geometry {
                Some(geometry) => {
                    if !collect_polygons(geometry, &mut polygons) {
                        tracing::warn!(
                            dataset = %self.name,
                            feature = %feature.id,
                            "Skipping non-polygonal ROI feature"
                        );
                    }
                }
                None => {
                    tracing::warn!(dataset = %self.name, feature = %feature.id, "Skipping feature without geometry");
                }
            }
        }

        Roi::new(MultiPolygon::new(polygons), Crs::from_epsg(self.crs))
    }
}

/// Push the polygons of `geometry` onto `polygons`, descending into
/// collections. Returns false when it holds no areal part at all.
fn collect_polygons(geometry: Geometry<f64>, polygons: &mut Vec<Polygon<f64>>) -> bool {
    match geometry {
        Geometry::Polygon(p) => polygons.push(p),
        Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
        Geometry::Rect(r) => polygons.push(r.to_polygon()),
        Geometry::Triangle(t) => polygons.push(t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            let mut found = false;
            for member in gc.0 {
                found |= collect_polygons(member, polygons);
            }
            return found;
        }
        _ => return false,
    }
    true
}

/// Central registry for ROI readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn RoiReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with the GeoJSON, Shapefile and WKT readers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(geojson::GeoJsonReader));
        registry.register(Box::new(shapefile::ShapefileReader));
        registry.register(Box::new(wkt::WktReader::default()));
        registry
    }

    /// Register a format reader
    pub fn register(&mut self, reader: Box<dyn RoiReader>) {
        self.readers.push(reader);
    }

    /// Detect format and return appropriate reader
    pub fn detect_format(&self, path: &Path) -> Result<&dyn RoiReader> {
        let extension = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            VegflowError::UnsupportedFormat {
                extension: "none".to_string(),
                supported: self.supported_formats(),
            }
        })?;

        self.readers
            .iter()
            .find(|r| r.supported_extensions().iter().any(|ext| ext.eq_ignore_ascii_case(extension)))
            .map(|r| r.as_ref())
            .ok_or_else(|| VegflowError::UnsupportedFormat {
                extension: extension.to_string(),
                supported: self.supported_formats(),
            })
    }

    /// Get list of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Validate, read and merge an ROI file
    pub async fn read_roi(&self, path: &Path) -> Result<Roi> {
        let reader = self.detect_format(path)?;

        let validation = reader.validate(path).await?;
        for warning in &validation.warnings {
            tracing::warn!(path = %path.display(), "{}", warning);
        }
        if !validation.is_valid() {
            return Err(VegflowError::FormatError {
                format: reader.format_name().to_string(),
                message: validation.errors.join("; "),
            });
        }

        let dataset = reader.read(path).await?;
        tracing::info!(
            path = %path.display(),
            format = reader.format_name(),
            features = dataset.features.len(),
            epsg = dataset.crs,
            "Loaded ROI"
        );
        Ok(dataset.into_roi())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Dataset name from a file path
pub(crate) fn dataset_name(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon, GeometryCollection};

    struct MockReader {
        extensions: Vec<&'static str>,
        name: &'static str,
    }

    #[async_trait]
    impl RoiReader for MockReader {
        async fn read(&self, _path: &Path) -> Result<RoiDataset> {
            Ok(RoiDataset {
                name: "test".to_string(),
                format_name: self.name.to_string(),
                crs: 4326,
                features: vec![],
            })
        }

        fn supported_extensions(&self) -> &[&str] {
            &self.extensions
        }

        fn format_name(&self) -> &str {
            self.name
        }
    }

    fn feature(id: &str, geometry: Option<Geometry<f64>>) -> RoiFeature {
        RoiFeature { id: id.to_string(), geometry, properties: HashMap::new() }
    }

    #[test]
    fn test_format_detection() {
        let mut registry = FormatRegistry::new();
        registry.register(Box::new(MockReader { extensions: vec!["json", "geojson"], name: "GeoJSON" }));
        registry.register(Box::new(MockReader { extensions: vec!["shp"], name: "Shapefile" }));

        assert_eq!(registry.detect_format(Path::new("roi.geojson")).unwrap().format_name(), "GeoJSON");
        assert_eq!(registry.detect_format(Path::new("roi.SHP")).unwrap().format_name(), "Shapefile");
    }

    #[test]
    fn test_unsupported_format() {
        let registry = FormatRegistry::with_defaults();
        assert!(matches!(
            registry.detect_format(Path::new("roi.kml")),
            Err(VegflowError::UnsupportedFormat { .. })
        ));
        assert!(registry.detect_format(Path::new("roi")).is_err());
    }

    #[test]
    fn test_into_roi_keeps_only_polygons() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let other = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0)];

        let dataset = RoiDataset {
            name: "roi".to_string(),
            format_name: "GeoJSON".to_string(),
            crs: 3857,
            features: vec![
                feature("a", Some(Geometry::Polygon(square))),
                feature("b", Some(Geometry::Point(point!(x: 3.0, y: 3.0)))),
                feature("c", Some(Geometry::MultiPolygon(MultiPolygon::new(vec![other])))),
                feature("d", None),
            ],
        };

        let roi = dataset.into_roi();
        assert_eq!(roi.polygon_count(), 2);
        assert_eq!(roi.crs(), &Crs::web_mercator());
    }

    #[test]
    fn test_into_roi_descends_into_collections() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let pair = MultiPolygon::new(vec![
            polygon![(x: 2.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 1.0)],
            polygon![(x: 4.0, y: 0.0), (x: 5.0, y: 0.0), (x: 5.0, y: 1.0)],
        ]);
        let nested = GeometryCollection::new_from(vec![
            Geometry::Point(point!(x: 9.0, y: 9.0)),
            Geometry::GeometryCollection(GeometryCollection::new_from(vec![Geometry::MultiPolygon(pair)])),
            Geometry::Polygon(square),
        ]);

        let dataset = RoiDataset {
            name: "roi".to_string(),
            format_name: "GeoJSON".to_string(),
            crs: 4326,
            features: vec![
                feature("a", Some(Geometry::GeometryCollection(nested))),
                feature("b", Some(Geometry::GeometryCollection(GeometryCollection::new_from(vec![
                    Geometry::Point(point!(x: 1.0, y: 1.0)),
                ])))),
            ],
        };

        assert_eq!(dataset.into_roi().polygon_count(), 3);
    }

    #[test]
    fn test_format_validation_flags() {
        let validation = FormatValidation {
            errors: vec![],
            warnings: vec!["No .prj file".to_string()],
        };
        assert!(validation.is_valid());
        assert!(validation.has_warnings());
    }
}
