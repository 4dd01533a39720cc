//! Canonical geometry types shared by the grid builder, the ROI tiler and the
//! acquisition run.
//!
//! Geometries are stored as `geo` types so the spatial predicates of the `geo`
//! crate apply directly; CRS information travels alongside as an EPSG code.

use crate::error::{Result, VegflowError};
use geo::{coord, BoundingRect, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// Build a CRS from a bare EPSG code, naming the ones we know
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => Self::wgs84(),
            3857 => Self::web_mercator(),
            other => Self::new(other, format!("EPSG:{}", other)),
        }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// Web Mercator (EPSG:3857), the metric CRS tiles are built in
    pub fn web_mercator() -> Self {
        Self::new(3857, "Web Mercator")
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Axis-aligned bounding box in projected coordinates.
///
/// Always satisfies `min_x < max_x`, `min_y < max_y` with finite values;
/// [`BoundingBox::new`] is the only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let invalid = |reason: &str| VegflowError::InvalidBounds {
            min_x,
            min_y,
            max_x,
            max_y,
            reason: reason.to_string(),
        };

        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(invalid("coordinates must be finite"));
        }
        if min_x >= max_x {
            return Err(invalid("min_x must be less than max_x"));
        }
        if min_y >= max_y {
            return Err(invalid("min_y must be less than max_y"));
        }

        Ok(Self { min_x, min_y, max_x, max_y })
    }

    /// Bounding box of a `geo::Rect`
    pub fn from_rect(rect: Rect<f64>) -> Result<Self> {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// `[min_x, min_y, max_x, max_y]`, the GeoJSON bbox order
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(coord! { x: self.min_x, y: self.min_y }, coord! { x: self.max_x, y: self.max_y })
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }
}

/// Region of interest: an areal geometry with the CRS its coordinates are in.
///
/// Polygons without an exterior ring are dropped on construction, so an ROI
/// with no polygons left is the empty ROI.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    geometry: MultiPolygon<f64>,
    crs: Crs,
}

impl Roi {
    pub fn new(geometry: impl Into<MultiPolygon<f64>>, crs: Crs) -> Self {
        let geometry: MultiPolygon<f64> = geometry.into();
        let polygons = geometry.0.into_iter().filter(|p| !p.exterior().0.is_empty()).collect();
        Self { geometry: MultiPolygon::new(polygons), crs }
    }

    /// ROI without any geometry
    pub fn empty(crs: Crs) -> Self {
        Self { geometry: MultiPolygon::new(Vec::new()), crs }
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty()
    }

    pub fn polygon_count(&self) -> usize {
        self.geometry.0.len()
    }

    /// Bounding box of the ROI, `None` when empty.
    ///
    /// Fails with `InvalidBounds` when the geometry collapses to a line or
    /// point along either axis.
    pub fn bounding_box(&self) -> Result<Option<BoundingBox>> {
        self.geometry.bounding_rect().map(BoundingBox::from_rect).transpose()
    }

    /// Same geometry tagged with another CRS; used by reprojection
    pub(crate) fn with_geometry(&self, geometry: MultiPolygon<f64>, crs: Crs) -> Self {
        Self::new(geometry, crs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_bounding_box_rejects_inverted() {
        assert!(BoundingBox::new(10.0, 0.0, 0.0, 10.0).is_err());
        assert!(BoundingBox::new(0.0, 10.0, 10.0, 0.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_bounding_box_rejects_non_finite() {
        let err = BoundingBox::new(f64::NAN, 0.0, 10.0, 10.0).unwrap_err();
        assert!(matches!(err, VegflowError::InvalidBounds { .. }));
        assert!(BoundingBox::new(0.0, 0.0, f64::INFINITY, 10.0).is_err());
    }

    #[test]
    fn test_bounding_box_dimensions() {
        let bbox = BoundingBox::new(-100.0, 50.0, 200.0, 150.0).unwrap();
        assert_eq!(bbox.width(), 300.0);
        assert_eq!(bbox.height(), 100.0);
        assert_eq!(bbox.area(), 30_000.0);
        assert_eq!(bbox.to_array(), [-100.0, 50.0, 200.0, 150.0]);
    }

    #[test]
    fn test_roi_drops_empty_polygons() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let empty = Polygon::new(geo::LineString::new(vec![]), vec![]);
        let roi = Roi::new(MultiPolygon::new(vec![square, empty]), Crs::wgs84());

        assert_eq!(roi.polygon_count(), 1);
        assert!(!roi.is_empty());
    }

    #[test]
    fn test_empty_roi_has_no_bounding_box() {
        let roi = Roi::empty(Crs::wgs84());
        assert!(roi.is_empty());
        assert!(roi.bounding_box().unwrap().is_none());
    }

    #[test]
    fn test_crs_display_and_lookup() {
        assert_eq!(Crs::from_epsg(3857), Crs::web_mercator());
        assert_eq!(Crs::from_epsg(32755).to_string(), "EPSG:32755");
    }
}
