//! Grid cells, grids and the tiles retained from them.

use super::geometry::{BoundingBox, Crs};
use geo::Polygon;
use serde::Serialize;

/// One square cell of a [`Grid`], positioned by column and row from the
/// snapped grid origin (lower-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridCell {
    pub column: usize,
    pub row: usize,
    pub bounds: BoundingBox,
}

impl GridCell {
    pub fn polygon(&self) -> Polygon<f64> {
        self.bounds.to_polygon()
    }

    /// Side length in CRS units
    pub fn side(&self) -> f64 {
        self.bounds.width()
    }
}

/// Uniform square grid covering a snapped bounding box.
///
/// Cells are ordered column-major: every row of column 0, then column 1, ...
#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub(crate) cells: Vec<GridCell>,
    pub(crate) bounds: BoundingBox,
    pub(crate) cell_size: f64,
    pub(crate) columns: usize,
    pub(crate) rows: usize,
    pub(crate) crs: Crs,
}

impl Grid {
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<GridCell> {
        self.cells
    }

    /// Snapped bounds covered by the grid
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Cell side length in CRS units (`cell_size_px * resolution_m`)
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GridCell> {
        self.cells.iter()
    }
}

/// A grid cell kept after intersecting the grid with an ROI.
///
/// `index` is the cell's position in the filtered output and names the
/// tile's output directory for the whole download run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub index: usize,
    pub cell: GridCell,
    pub crs: Crs,
}

impl Tile {
    pub fn new(index: usize, cell: GridCell, crs: Crs) -> Self {
        Self { index, cell, crs }
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.cell.bounds
    }

    pub fn polygon(&self) -> Polygon<f64> {
        self.cell.polygon()
    }

    /// Output directory name, `tile_<index>`
    pub fn dir_name(&self) -> String {
        format!("tile_{}", self.index)
    }

    /// GeoJSON feature carrying the tile polygon and its grid position
    pub fn to_feature(&self) -> geojson::Feature {
        let mut properties = serde_json::Map::new();
        properties.insert("index".to_string(), self.index.into());
        properties.insert("column".to_string(), self.cell.column.into());
        properties.insert("row".to_string(), self.cell.row.into());
        properties.insert("epsg".to_string(), self.crs.epsg.into());

        geojson::Feature {
            bbox: Some(self.bounds().to_array().to_vec()),
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.polygon()))),
            id: Some(geojson::feature::Id::Number(self.index.into())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = &'a GridCell;
    type IntoIter = std::slice::Iter<'a, GridCell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> GridCell {
        GridCell { column: 2, row: 5, bounds: BoundingBox::new(600.0, 1500.0, 900.0, 1800.0).unwrap() }
    }

    #[test]
    fn test_tile_dir_name() {
        let tile = Tile::new(7, cell(), Crs::web_mercator());
        assert_eq!(tile.dir_name(), "tile_7");
    }

    #[test]
    fn test_tile_feature_properties() {
        let tile = Tile::new(3, cell(), Crs::web_mercator());
        let feature = tile.to_feature();

        assert_eq!(feature.property("index").and_then(|v| v.as_u64()), Some(3));
        assert_eq!(feature.property("column").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(feature.property("row").and_then(|v| v.as_u64()), Some(5));
        assert_eq!(feature.bbox, Some(vec![600.0, 1500.0, 900.0, 1800.0]));
        assert!(matches!(
            feature.geometry.map(|g| g.value),
            Some(geojson::Value::Polygon(_))
        ));
    }

    #[test]
    fn test_cell_side() {
        assert_eq!(cell().side(), 300.0);
    }
}
