//! PDF tiling pass.
//!
//! Stamps one pre-rendered [`Tile`] over every page of a document. The pass
//! only knows pages through the [`PageSurface`] trait; the lopdf-backed
//! implementation lives in `crate::pdf`.
//!
//! Pages are independent, so they are processed in parallel, each surface
//! owned by exactly one worker. The first failing page (lowest index) aborts
//! the whole pass.

use super::grid::{GridSpec, PlacementGrid, Region};
use super::tile::Tile;
use crate::error::WatermarkError;
use rayon::prelude::*;

/// Page size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A page that can receive tile overlays.
///
/// Regions use a top-left origin with y growing downwards, in points.
/// Overlays must paint above existing content and respect the tile alpha;
/// they never replace what is already on the page.
pub trait PageSurface {
    /// Page size, or the reason the page cannot be measured.
    fn dimensions(&self) -> Result<PageDimensions, String>;

    /// Overlay the tile image into `region`, or explain the rejection.
    fn overlay_image(&mut self, region: Region, tile: &Tile) -> Result<(), String>;
}

/// What a successful pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub pages: usize,
    pub placements: usize,
}

/// Tile `tile` over every page.
///
/// Errors are tagged with the zero-based page index. On error the caller
/// must discard the document: some pages may already carry overlays.
pub fn tile_onto_pages<S>(
    pages: &mut [S],
    tile: &Tile,
    grid: &GridSpec,
) -> Result<PassSummary, WatermarkError>
where
    S: PageSurface + Send,
{
    grid.validate()?;

    let results: Vec<Result<usize, WatermarkError>> = pages
        .par_iter_mut()
        .enumerate()
        .map(|(index, page)| tile_page(index, page, tile, grid))
        .collect();

    let mut summary = PassSummary::default();
    for result in results {
        summary.placements += result?;
        summary.pages += 1;
    }

    tracing::info!(
        pages = summary.pages,
        placements = summary.placements,
        "PDF tiling pass complete"
    );

    Ok(summary)
}

fn tile_page<S: PageSurface>(
    index: usize,
    page: &mut S,
    tile: &Tile,
    grid: &GridSpec,
) -> Result<usize, WatermarkError> {
    let dims = page
        .dimensions()
        .map_err(|reason| WatermarkError::page_overlay(index, reason))?;

    if !(dims.width.is_finite() && dims.height.is_finite()) || dims.width < 0.0 || dims.height < 0.0
    {
        return Err(WatermarkError::page_overlay(
            index,
            format!("invalid page size {}x{}", dims.width, dims.height),
        ));
    }

    let placements = PlacementGrid::new(dims.width, dims.height, *grid)?;
    let (tile_w, tile_h) = (tile.width() as f64, tile.height() as f64);

    let mut count = 0;
    for placement in &placements {
        let region = Region::centered_on(placement, tile_w, tile_h);
        page.overlay_image(region, tile)
            .map_err(|reason| WatermarkError::page_overlay(index, reason))?;
        count += 1;
    }

    tracing::debug!(
        page = index,
        width = dims.width,
        height = dims.height,
        placements = count,
        "Tiled page"
    );

    Ok(count)
}
