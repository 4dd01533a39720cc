//! vegflow core - ROI tiling, tile validity and Landsat 8 acquisition planning
//!
//! This crate contains the geometry, calendar and acquisition logic plus the
//! port the imagery backends implement.

pub mod acquisition;
pub mod calendar;
pub mod config;
pub mod error;
pub mod formats;
pub mod grid;
pub mod imagery;
pub mod models;
pub mod ports;
pub mod spatial;
pub mod tiling;
pub mod validity;

pub use error::{Result, VegflowError};
