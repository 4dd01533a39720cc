//! Tile command implementation

use super::CommandContext;
use crate::cli::TileArgs;
use crate::dry_run::{ActionType, PlannedAction};
use crate::output_types::{TileOutput, TileRow};
use crate::progress::create_spinner;
use anyhow::{Context, Result};
use std::path::Path;
use vegflow_core::formats::FormatRegistry;
use vegflow_core::models::{Crs, Tile};
use vegflow_core::tiling::tile_roi;

pub async fn execute(args: TileArgs, ctx: &CommandContext) -> Result<()> {
    let tile_size_px = ctx.config.tile_size_px.value;
    let resolution_m = ctx.config.resolution_m.value;

    let spinner = (!ctx.output.is_json()).then(|| create_spinner("Reading ROI..."));
    let roi = FormatRegistry::with_defaults().read_roi(&args.roi).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let roi = roi.with_context(|| format!("Failed to read ROI {}", args.roi.display()))?;

    let tiles = tile_roi(&roi, tile_size_px, resolution_m)?;
    if tiles.is_empty() {
        ctx.output.warning("The ROI has no geometry; no tiles were produced");
    }

    let epsg = tiles_epsg(&tiles);

    let geojson_path = match &args.output {
        Some(path) if ctx.dry_run => {
            let action = PlannedAction::new(ActionType::WriteFile, format!("Write {}", path.display()))
                .with_detail(format!("{} tile features", tiles.len()));
            ctx.output.info(format!("Dry run: {} ({})", action.description, action.details.join(", ")));
            None
        }
        Some(path) => {
            write_geojson(path, &tiles)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    if ctx.output.is_json() {
        return ctx.output.result(TileOutput {
            roi: args.roi.display().to_string(),
            epsg,
            tile_size_px,
            resolution_m,
            tiles: tiles.iter().map(TileRow::from).collect(),
            geojson_path,
        });
    }

    ctx.output.section(format!(
        "{} tiles of {} px at {} m (EPSG:{})",
        tiles.len(),
        tile_size_px,
        resolution_m,
        epsg
    ));
    ctx.output.table(tiles.iter().map(TileRow::from).collect())?;
    if let Some(path) = geojson_path {
        ctx.output.success(format!("Wrote tiles to {}", path));
    }
    Ok(())
}

/// CRS the tiles were built in; tiling always works in Web Mercator
fn tiles_epsg(tiles: &[Tile]) -> u32 {
    tiles.first().map_or(Crs::web_mercator().epsg, |tile| tile.crs.epsg)
}

fn write_geojson(path: &Path, tiles: &[Tile]) -> Result<()> {
    let collection = geojson::FeatureCollection {
        bbox: None,
        features: tiles.iter().map(Tile::to_feature).collect(),
        foreign_members: None,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, collection.to_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vegflow_core::models::{BoundingBox, GridCell};

    #[test]
    fn test_epsg_comes_from_the_tiles() {
        let cell = GridCell { column: 0, row: 0, bounds: BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap() };

        assert_eq!(tiles_epsg(&[]), 3857);
        assert_eq!(tiles_epsg(&[Tile::new(0, cell, Crs::from_epsg(32760))]), 32760);
    }
}
