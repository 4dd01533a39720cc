//! ROI geometry validation.

use crate::error::{Result, VegflowError};
use geo::{Area, LineString, MultiPolygon, Polygon};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    /// Turn the first error into an `InvalidGeometry` error
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some(first) => Err(VegflowError::InvalidGeometry {
                location: first.location,
                reason: first.reason,
            }),
            None => Ok(()),
        }
    }
}

fn validate_ring(ring: &LineString<f64>, location: String, result: &mut ValidationResult) {
    if ring.0.len() < 4 {
        result.add_error(
            location.clone(),
            format!("ring must have at least 4 points, found {}", ring.0.len()),
        );
    }

    if let Some((i, _)) =
        ring.0.iter().enumerate().find(|(_, c)| !c.x.is_finite() || !c.y.is_finite())
    {
        result.add_error(format!("{}[{}]", location, i), "coordinates must be finite".to_string());
    }
}

fn validate_polygon(polygon: &Polygon<f64>, location: &str, result: &mut ValidationResult) {
    validate_ring(polygon.exterior(), format!("{} exterior", location), result);

    for (i, interior) in polygon.interiors().iter().enumerate() {
        validate_ring(interior, format!("{} interior[{}]", location, i), result);
    }
}

/// Validate an ROI geometry: every ring is a proper ring with finite
/// coordinates and the whole geometry encloses a non-zero area.
pub fn validate_roi_geometry(geometry: &MultiPolygon<f64>) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for (i, polygon) in geometry.0.iter().enumerate() {
        validate_polygon(polygon, &format!("Polygon[{}]", i), &mut result);
    }

    if result.is_valid && !geometry.0.is_empty() && geometry.unsigned_area() <= 0.0 {
        result.add_error("ROI".to_string(), "geometry encloses no area".to_string());
    }

    result
}
