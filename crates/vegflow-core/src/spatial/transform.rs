//! CRS transformation of ROI geometries.
//!
//! WGS 84 <-> Web Mercator is computed in-crate with the spherical Mercator
//! formulas. Any other EPSG pair requires the `proj` feature.

use crate::error::{Result, VegflowError};
use crate::models::{Crs, Roi};
use geo::{Coord, MapCoords, MultiPolygon};
use std::f64::consts::FRAC_PI_4;

/// Sphere radius used by EPSG:3857
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude at which Web Mercator's square world ends
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.epsg == crs2.epsg
}

/// Longitude/latitude in degrees to Web Mercator meters.
///
/// Latitudes beyond ±[`MAX_MERCATOR_LATITUDE`] are clamped.
pub fn lonlat_to_web_mercator(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    Coord {
        x: EARTH_RADIUS_M * coord.x.to_radians(),
        y: EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
    }
}

/// Web Mercator meters to longitude/latitude in degrees
pub fn web_mercator_to_lonlat(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / EARTH_RADIUS_M).to_degrees(),
        y: (2.0 * (coord.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
            .to_degrees(),
    }
}

/// Reproject a multipolygon from one CRS to another
pub fn reproject_geometry(
    geometry: &MultiPolygon<f64>,
    from_crs: &Crs,
    to_crs: &Crs,
) -> Result<MultiPolygon<f64>> {
    if crs_match(from_crs, to_crs) {
        return Ok(geometry.clone());
    }

    match (from_crs.epsg, to_crs.epsg) {
        (4326, 3857) => Ok(geometry.map_coords(lonlat_to_web_mercator)),
        (3857, 4326) => Ok(geometry.map_coords(web_mercator_to_lonlat)),
        _ => reproject_with_proj(geometry, from_crs, to_crs),
    }
}

#[cfg(feature = "proj")]
fn reproject_with_proj(
    geometry: &MultiPolygon<f64>,
    from_crs: &Crs,
    to_crs: &Crs,
) -> Result<MultiPolygon<f64>> {
    use proj::Proj;

    let (from, to) = (from_crs.epsg, to_crs.epsg);
    let proj = Proj::new_known_crs(&format!("EPSG:{}", from), &format!("EPSG:{}", to), None)
        .map_err(|e| VegflowError::Projection { from, to, reason: e.to_string() })?;

    geometry.try_map_coords(|coord| {
        proj.convert((coord.x, coord.y))
            .map(|(x, y)| Coord { x, y })
            .map_err(|e| VegflowError::Projection { from, to, reason: e.to_string() })
    })
}

#[cfg(not(feature = "proj"))]
fn reproject_with_proj(
    _geometry: &MultiPolygon<f64>,
    from_crs: &Crs,
    to_crs: &Crs,
) -> Result<MultiPolygon<f64>> {
    Err(VegflowError::Projection {
        from: from_crs.epsg,
        to: to_crs.epsg,
        reason: "only EPSG:4326 <-> EPSG:3857 is built in; rebuild with the `proj` feature"
            .to_string(),
    })
}

/// Reproject an ROI, returning a new value in `target_crs`
pub fn reproject_roi(roi: &Roi, target_crs: &Crs) -> Result<Roi> {
    let geometry = reproject_geometry(roi.geometry(), roi.crs(), target_crs)?;
    Ok(roi.with_geometry(geometry, target_crs.clone()))
}
