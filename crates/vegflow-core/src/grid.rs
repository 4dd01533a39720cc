//! Resolution-aligned square grids.
//!
//! A grid covering a bounding box is snapped outward to whole multiples of the
//! cell side, so grids built from overlapping boxes with the same cell size
//! share every cell edge.

use crate::error::{Result, VegflowError};
use crate::models::{BoundingBox, Crs, Grid, GridCell};

/// Upper bound on the number of cells a single grid may hold
pub const MAX_GRID_CELLS: usize = 4_000_000;

/// Cell side length in CRS units for a cell of `cell_size_px` pixels at
/// `resolution_m` meters per pixel.
pub fn cell_side(cell_size_px: u32, resolution_m: f64) -> Result<f64> {
    if cell_size_px == 0 {
        return Err(VegflowError::invalid_parameter("cell_size_px", "must be greater than 0"));
    }
    if !(resolution_m.is_finite() && resolution_m > 0.0) {
        return Err(VegflowError::invalid_parameter(
            "resolution_m",
            format!("must be a positive number, got {}", resolution_m),
        ));
    }
    Ok(f64::from(cell_size_px) * resolution_m)
}

/// Largest cell index magnitude; beyond 2^53 cell corners are no longer exact
const MAX_CELL_INDEX: f64 = 9_007_199_254_740_992.0;

/// Cell index ranges `[x0, x1)` and `[y0, y1)` covering `bounds`.
///
/// Fails with `InvalidBounds` when the bounds lie too far from the origin
/// for cells of `side` to be indexed exactly.
fn index_spans(bounds: &BoundingBox, side: f64) -> Result<((i64, i64), (i64, i64))> {
    let out_of_range = || VegflowError::InvalidBounds {
        min_x: bounds.min_x(),
        min_y: bounds.min_y(),
        max_x: bounds.max_x(),
        max_y: bounds.max_y(),
        reason: format!("too far from the origin for a cell side of {}", side),
    };

    let span = |min: f64, max: f64| {
        let first = (min / side).floor();
        let last = (max / side).ceil();
        if first.abs() <= MAX_CELL_INDEX && last.abs() <= MAX_CELL_INDEX {
            Ok((first as i64, last as i64))
        } else {
            Err(out_of_range())
        }
    };

    Ok((span(bounds.min_x(), bounds.max_x())?, span(bounds.min_y(), bounds.max_y())?))
}

/// Snap `bounds` outward to whole multiples of `side`.
///
/// Already aligned bounds come back unchanged.
pub fn snap_bounds(bounds: &BoundingBox, side: f64) -> Result<BoundingBox> {
    if !(side.is_finite() && side > 0.0) {
        return Err(VegflowError::invalid_parameter("cell side", "must be a positive number"));
    }
    let ((x0, x1), (y0, y1)) = index_spans(bounds, side)?;

    BoundingBox::new(x0 as f64 * side, y0 as f64 * side, x1 as f64 * side, y1 as f64 * side)
}

/// Build the square grid covering `bounds`.
///
/// Cells are `cell_size_px * resolution_m` on a side, start at the snapped
/// lower-left corner and are emitted column by column, bottom row first.
/// Grids of more than [`MAX_GRID_CELLS`] cells fail with `InvalidParameter`.
pub fn build_grid(
    bounds: &BoundingBox,
    cell_size_px: u32,
    resolution_m: f64,
    crs: Crs,
) -> Result<Grid> {
    let side = cell_side(cell_size_px, resolution_m)?;
    let snapped = snap_bounds(bounds, side)?;
    let ((x0, x1), (y0, y1)) = index_spans(bounds, side)?;

    // Indices are bounded by 2^53, so the differences cannot overflow
    let columns = u64::try_from(x1 - x0).unwrap_or(0);
    let rows = u64::try_from(y1 - y0).unwrap_or(0);

    let total = columns.checked_mul(rows).filter(|&n| n <= MAX_GRID_CELLS as u64);
    let Some(total) = total else {
        return Err(VegflowError::invalid_parameter(
            "cell_size_px",
            format!(
                "grid of {}x{} cells exceeds the limit of {} cells; use larger tiles",
                columns, rows, MAX_GRID_CELLS
            ),
        ));
    };
    let (columns, rows) = (columns as usize, rows as usize);

    // Corners come from integer cell indices so neighbouring cells share
    // bit-identical edges.
    let mut cells = Vec::with_capacity(total as usize);
    for column in 0..columns {
        let x = (x0 + column as i64) as f64 * side;
        let next_x = (x0 + column as i64 + 1) as f64 * side;
        for row in 0..rows {
            let y = (y0 + row as i64) as f64 * side;
            let next_y = (y0 + row as i64 + 1) as f64 * side;
            cells.push(GridCell { column, row, bounds: BoundingBox::new(x, y, next_x, next_y)? });
        }
    }

    tracing::debug!(
        columns,
        rows,
        cell_size = side,
        epsg = crs.epsg,
        "Built grid"
    );

    Ok(Grid { cells, bounds: snapped, cell_size: side, columns, rows, crs })
}
