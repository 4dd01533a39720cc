//! Tile validity: decide whether a tile has enough unmasked pixels to be
//! worth fetching.
//!
//! Pixel statistics come from the imagery source (cloud, shadow and water
//! masking happen there). The decision itself is a pure function of the
//! valid and total pixel counts.

use serde::{Deserialize, Serialize};

/// A tile must have strictly more than this fraction of valid pixels
pub const VALID_FRACTION_THRESHOLD: f64 = 0.10;

/// Mask statistics for one tile geometry sampled at `scale_m`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelStats {
    /// Sum of the mask indicator (1 = unmasked) over the tile
    pub valid_pixels: f64,
    /// Number of pixels in the tile regardless of mask
    pub total_pixels: f64,
    /// Sampling scale in meters per pixel
    pub scale_m: f64,
}

impl PixelStats {
    pub fn new(valid_pixels: f64, total_pixels: f64, scale_m: f64) -> Self {
        Self { valid_pixels, total_pixels, scale_m }
    }

    /// Count a mask raster already clipped to the tile, `true` = unmasked
    pub fn from_mask<I>(mask: I, scale_m: f64) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let (valid, total) =
            mask.into_iter().fold((0u64, 0u64), |(v, t), px| (v + u64::from(px), t + 1));
        Self::new(valid as f64, total as f64, scale_m)
    }

    /// Valid fraction, `None` for a tile without pixels
    pub fn valid_fraction(&self) -> Option<f64> {
        (self.total_pixels > 0.0).then(|| self.valid_pixels / self.total_pixels)
    }
}

/// Why a tile is kept or skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileVerdict {
    Valid,
    /// Valid pixels at or below the threshold
    InsufficientCoverage,
    /// No pixels inside the tile geometry
    Degenerate,
}

impl TileVerdict {
    pub fn is_valid(self) -> bool {
        self == TileVerdict::Valid
    }
}

/// Classify a tile from its pixel statistics. Never fails: anything that
/// cannot be judged is treated as not worth fetching.
pub fn assess_tile(stats: &PixelStats) -> TileVerdict {
    if !(stats.total_pixels.is_finite() && stats.total_pixels > 0.0) {
        return TileVerdict::Degenerate;
    }

    if stats.valid_pixels > VALID_FRACTION_THRESHOLD * stats.total_pixels {
        TileVerdict::Valid
    } else {
        TileVerdict::InsufficientCoverage
    }
}

/// `true` when more than 10% of the tile's pixels are unmasked
pub fn is_tile_valid(stats: &PixelStats) -> bool {
    assess_tile(stats).is_valid()
}
