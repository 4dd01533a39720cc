//! Error types for vegflow

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VegflowError {
    // Geometry errors
    #[error("Invalid bounding box ({min_x}, {min_y}, {max_x}, {max_y}): {reason}")]
    InvalidBounds {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        reason: String,
    },

    #[error("Invalid geometry at {location}: {reason}")]
    InvalidGeometry { location: String, reason: String },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Projection from EPSG:{from} to EPSG:{to} failed: {reason}")]
    Projection { from: u32, to: u32, reason: String },

    // Date range errors
    #[error("Invalid year range {start_year}..={end_year}: {reason}")]
    InvalidRange {
        start_year: i32,
        end_year: i32,
        reason: String,
    },

    // Format errors
    #[error("Unsupported file format: {extension}. Supported formats: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("{format} error: {message}")]
    FormatError { format: String, message: String },

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    // Imagery source errors
    #[error("Imagery source unavailable: {reason}")]
    Imagery { reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VegflowError {
    /// Shorthand for an [`VegflowError::InvalidGeometry`] error
    pub fn invalid_geometry(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry { location: location.into(), reason: reason.into() }
    }

    /// Shorthand for an [`VegflowError::InvalidParameter`] error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name: name.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, VegflowError>;
