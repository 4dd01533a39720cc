//! Spatial module: CRS transforms and ROI geometry validation.

pub mod transform;
pub mod validation;

pub use transform::{
    crs_match, lonlat_to_web_mercator, reproject_geometry, reproject_roi, web_mercator_to_lonlat,
};
pub use validation::{validate_roi_geometry, ValidationError, ValidationResult};
