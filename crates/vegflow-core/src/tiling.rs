//! ROI tiling: partition a region of interest into resolution-aligned tiles.

use crate::error::{Result, VegflowError};
use crate::grid::build_grid;
use crate::models::{Crs, Roi, Tile};
use crate::spatial::{reproject_roi, validate_roi_geometry};
use geo::Intersects;

/// Split `roi` into square tiles of `tile_size_px` pixels at `resolution_m`
/// meters per pixel.
///
/// The ROI is reprojected to Web Mercator, gridded over its bounding box and
/// every cell that intersects the ROI geometry is kept. Tiles are indexed from
/// 0 in grid order. An empty ROI yields no tiles.
pub fn tile_roi(roi: &Roi, tile_size_px: u32, resolution_m: f64) -> Result<Vec<Tile>> {
    if roi.is_empty() {
        tracing::warn!(epsg = roi.crs().epsg, "ROI has no geometry, nothing to tile");
        return Ok(Vec::new());
    }

    let target = Crs::web_mercator();
    let projected = reproject_roi(roi, &target)?;
    validate_roi_geometry(projected.geometry()).into_result()?;

    let bounds = projected
        .bounding_box()
        .map_err(|e| VegflowError::invalid_geometry("ROI", e.to_string()))?
        .ok_or_else(|| VegflowError::invalid_geometry("ROI", "no geometry after reprojection"))?;

    let grid = build_grid(&bounds, tile_size_px, resolution_m, target.clone())?;
    let candidates = grid.len();

    let tiles: Vec<Tile> = grid
        .into_cells()
        .into_iter()
        .filter(|cell| cell.polygon().intersects(projected.geometry()))
        .enumerate()
        .map(|(index, cell)| Tile::new(index, cell, target.clone()))
        .collect();

    tracing::info!(
        candidates,
        tiles = tiles.len(),
        tile_size_px,
        resolution_m,
        "Tiled ROI"
    );

    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_grid;
    use geo::{polygon, MultiPolygon};

    fn mercator_roi(polygon: geo::Polygon<f64>) -> Roi {
        Roi::new(polygon, Crs::web_mercator())
    }

    #[test]
    fn test_square_roi_keeps_every_cell() {
        let roi = mercator_roi(
            polygon![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0), (x: 1000.0, y: 1000.0), (x: 0.0, y: 1000.0)],
        );
        let tiles = tile_roi(&roi, 10, 30.0).unwrap();

        assert_eq!(tiles.len(), 16);
        let indices: Vec<_> = tiles.iter().map(|t| t.index).collect();
        assert_eq!(indices, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_triangle_drops_far_corner() {
        // Hypotenuse x + y = 1190: cells whose lower-left corner sums past it
        // lie entirely outside
        let roi = mercator_roi(polygon![(x: 0.0, y: 0.0), (x: 1190.0, y: 0.0), (x: 0.0, y: 1190.0)]);
        let tiles = tile_roi(&roi, 10, 30.0).unwrap();

        let grid = build_grid(
            &roi.bounding_box().unwrap().unwrap(),
            10,
            30.0,
            Crs::web_mercator(),
        )
        .unwrap();
        assert!(tiles.len() < grid.len());
        assert!(tiles.iter().all(|t| t.cell.column + t.cell.row <= 3));
        assert!(tiles.iter().all(|t| t.polygon().intersects(roi.geometry())));
    }

    #[test]
    fn test_indices_follow_filter_order() {
        let roi = mercator_roi(polygon![(x: 0.0, y: 0.0), (x: 1190.0, y: 0.0), (x: 0.0, y: 1190.0)]);
        let tiles = tile_roi(&roi, 10, 30.0).unwrap();

        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.index, i);
            assert_eq!(tile.crs, Crs::web_mercator());
        }
    }

    #[test]
    fn test_empty_roi_yields_no_tiles() {
        let roi = Roi::new(MultiPolygon::new(vec![]), Crs::wgs84());
        assert!(tile_roi(&roi, 256, 30.0).unwrap().is_empty());
    }

    #[test]
    fn test_wgs84_roi_is_reprojected() {
        let roi = Roi::new(
            polygon![(x: 174.70, y: -36.90), (x: 174.80, y: -36.90), (x: 174.80, y: -36.80), (x: 174.70, y: -36.80)],
            Crs::wgs84(),
        );
        let tiles = tile_roi(&roi, 256, 30.0).unwrap();

        assert!(!tiles.is_empty());
        // 0.1 degrees of longitude is ~11 km in Web Mercator, one tile is 7680 m
        assert!(tiles[0].bounds().min_x() > 19_000_000.0);
        assert!(tiles.iter().all(|t| t.bounds().width() == 7680.0));
    }

    #[test]
    fn test_non_finite_roi_is_invalid_geometry() {
        let roi = mercator_roi(
            polygon![(x: 0.0, y: 0.0), (x: f64::INFINITY, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
        );
        assert!(matches!(tile_roi(&roi, 10, 30.0), Err(VegflowError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_bad_tile_size_is_rejected() {
        let roi = mercator_roi(polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)]);
        assert!(matches!(tile_roi(&roi, 0, 30.0), Err(VegflowError::InvalidParameter { .. })));
    }
}
