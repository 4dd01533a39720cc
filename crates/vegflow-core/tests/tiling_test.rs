//! Integration tests for ROI tiling
//!
//! Verifies that tiles are a subset of the grid built over the projected ROI
//! bounds, that every tile touches the ROI, and the reference 4x4 scenario.

use geo::{polygon, Intersects, MultiPolygon};
use proptest::prelude::*;
use vegflow_core::grid::build_grid;
use vegflow_core::models::{BoundingBox, Crs, Roi};
use vegflow_core::tiling::tile_roi;
use vegflow_core::validity::{is_tile_valid, PixelStats};
use vegflow_core::VegflowError;

fn mercator(polygon: geo::Polygon<f64>) -> Roi {
    Roi::new(polygon, Crs::web_mercator())
}

#[test]
fn test_reference_scenario_four_by_four() {
    let bounds = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0).unwrap();
    let grid = build_grid(&bounds, 10, 30.0, Crs::web_mercator()).unwrap();

    assert_eq!(grid.len(), 16);
    assert_eq!((grid.columns(), grid.rows()), (4, 4));
    assert_eq!(grid.bounds().to_array(), [0.0, 0.0, 1200.0, 1200.0]);
}

#[test]
fn test_disjoint_parts_skip_the_gap() {
    // Two squares well inside columns 0 and 6: the gap cells are dropped
    let roi = Roi::new(
        MultiPolygon::new(vec![
            polygon![(x: 10.0, y: 10.0), (x: 290.0, y: 10.0), (x: 290.0, y: 290.0), (x: 10.0, y: 290.0)],
            polygon![(x: 1810.0, y: 10.0), (x: 2090.0, y: 10.0), (x: 2090.0, y: 290.0), (x: 1810.0, y: 290.0)],
        ]),
        Crs::web_mercator(),
    );

    let tiles = tile_roi(&roi, 10, 30.0).unwrap();
    let columns: Vec<usize> = tiles.iter().map(|t| t.cell.column).collect();

    assert_eq!(columns, vec![0, 6]);
    assert_eq!(tiles[1].index, 1);
}

#[test]
fn test_wgs84_roi_is_tiled_in_web_mercator() {
    let roi = Roi::new(
        polygon![(x: 174.70, y: -36.90), (x: 174.72, y: -36.90), (x: 174.72, y: -36.88), (x: 174.70, y: -36.88)],
        Crs::wgs84(),
    );

    let tiles = tile_roi(&roi, 256, 30.0).unwrap();

    assert!(!tiles.is_empty());
    for tile in &tiles {
        assert_eq!(tile.crs.epsg, 3857);
        assert!((tile.bounds().width() - 7680.0).abs() < 1e-9);
        assert_eq!(tile.bounds().min_x() % 7680.0, 0.0);
    }
}

#[test]
fn test_zero_area_roi_is_invalid_geometry() {
    let roi = mercator(polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 200.0, y: 0.0)]);
    let err = tile_roi(&roi, 10, 30.0).unwrap_err();
    assert!(matches!(err, VegflowError::InvalidGeometry { .. }));
}

#[test]
fn test_validity_boundaries() {
    assert!(!is_tile_valid(&PixelStats::new(0.0, 100.0, 30.0)));
    assert!(is_tile_valid(&PixelStats::new(11.0, 100.0, 30.0)));
    assert!(!is_tile_valid(&PixelStats::new(10.0, 100.0, 30.0)));
    assert!(!is_tile_valid(&PixelStats::new(5.0, 0.0, 30.0)));
}

proptest! {
    #[test]
    fn prop_tiles_are_grid_cells_touching_the_roi(
        x in -50_000.0f64..50_000.0,
        y in -50_000.0f64..50_000.0,
        w in 10.0f64..5_000.0,
        h in 10.0f64..5_000.0,
        px in 1u32..64,
    ) {
        let roi = mercator(polygon![(x: x, y: y), (x: x + w, y: y), (x: x, y: y + h)]);

        let tiles = tile_roi(&roi, px, 30.0).unwrap();
        let bounds = roi.bounding_box().unwrap().unwrap();
        let grid = build_grid(&bounds, px, 30.0, Crs::web_mercator()).unwrap();

        prop_assert!(!tiles.is_empty());
        prop_assert!(tiles.len() <= grid.len());
        for (i, tile) in tiles.iter().enumerate() {
            prop_assert_eq!(tile.index, i);
            prop_assert!(grid.cells().contains(&tile.cell));
            prop_assert!(tile.polygon().intersects(roi.geometry()));
        }
    }
}
