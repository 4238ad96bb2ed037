//! Image tiling pass.
//!
//! Derives a pixel layout from the canvas size, stamps the tile into a
//! transparent overlay at every grid position and flattens the overlay over
//! the source. The result is always opaque RGB.

use super::compositor::{composite_at, flatten};
use super::font::FontHandle;
use super::grid::{GridSpec, PlacementGrid};
use super::tile::{generate_tile_for, Tile, WatermarkSpec};
use crate::error::WatermarkError;
use crate::raster::RasterSurface;
use image::{DynamicImage, RgbaImage};

/// Layout ratios relative to the canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTilingParams {
    /// Font size as a fraction of the longer side.
    pub font_size_ratio: f64,
    /// Horizontal step as a fraction of the width.
    pub x_step_ratio: f64,
    /// Vertical step as a fraction of the height.
    pub y_step_ratio: f64,
    /// Margin as a fraction of the shorter side.
    pub margin_ratio: f64,
}

impl Default for ImageTilingParams {
    fn default() -> Self {
        Self {
            font_size_ratio: 0.035,
            x_step_ratio: 0.28,
            y_step_ratio: 0.22,
            margin_ratio: 0.04,
        }
    }
}

impl ImageTilingParams {
    pub fn validate(&self) -> Result<(), WatermarkError> {
        let positive = [
            ("font_size_ratio", self.font_size_ratio),
            ("x_step_ratio", self.x_step_ratio),
            ("y_step_ratio", self.y_step_ratio),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(WatermarkError::InvalidLayout(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !(self.margin_ratio.is_finite() && self.margin_ratio >= 0.0) {
            return Err(WatermarkError::InvalidLayout(format!(
                "margin_ratio must be zero or positive, got {}",
                self.margin_ratio
            )));
        }
        Ok(())
    }
}

/// Whole-pixel layout for one canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    pub font_size: u32,
    pub x_step: u32,
    pub y_step: u32,
    pub margin: u32,
}

impl ImageLayout {
    /// Truncates every derived length; font size and steps never drop below 1.
    pub fn for_canvas(
        width: u32,
        height: u32,
        params: &ImageTilingParams,
    ) -> Result<Self, WatermarkError> {
        params.validate()?;

        let (w, h) = (width as f64, height as f64);
        let truncate = |value: f64| value.floor() as u32;

        Ok(Self {
            font_size: truncate(w.max(h) * params.font_size_ratio).max(1),
            x_step: truncate(w * params.x_step_ratio).max(1),
            y_step: truncate(h * params.y_step_ratio).max(1),
            margin: truncate(w.min(h) * params.margin_ratio),
        })
    }

    pub fn grid_spec(&self) -> GridSpec {
        GridSpec::new(self.x_step as f64, self.y_step as f64, self.margin as f64)
    }
}

/// Watermark `canvas` with a tile rendered for its size.
///
/// The canvas is left untouched; a new opaque surface is returned.
pub fn tile_onto_image(
    canvas: &RasterSurface,
    spec: &WatermarkSpec,
    params: &ImageTilingParams,
    font: &FontHandle,
) -> Result<RasterSurface, WatermarkError> {
    let layout = ImageLayout::for_canvas(canvas.width(), canvas.height(), params)?;
    let tile = generate_tile_for(spec, layout.font_size as f32, font);

    tracing::debug!(
        width = canvas.width(),
        height = canvas.height(),
        font_size = layout.font_size,
        x_step = layout.x_step,
        y_step = layout.y_step,
        margin = layout.margin,
        "Image layout"
    );

    stamp_tile(canvas, &tile, &layout.grid_spec())
}

/// Stamp an existing tile over `canvas` on the given grid.
pub fn stamp_tile(
    canvas: &RasterSurface,
    tile: &Tile,
    grid: &GridSpec,
) -> Result<RasterSurface, WatermarkError> {
    let (width, height) = (canvas.width(), canvas.height());
    let placements = PlacementGrid::new(width as f64, height as f64, *grid)?;

    let mut overlay = RgbaImage::new(width, height);
    let half_w = (tile.width() / 2) as i64;
    let half_h = (tile.height() / 2) as i64;

    for placement in &placements {
        let x = placement.x.floor() as i64 - half_w;
        let y = placement.y.floor() as i64 - half_h;
        composite_at(&mut overlay, tile.image(), x, y);
    }

    let base = canvas.to_rgba8();
    let flattened = flatten(&base, &overlay);

    tracing::info!(
        width,
        height,
        placements = placements.len(),
        "Image tiling pass complete"
    );

    Ok(RasterSurface::new(DynamicImage::ImageRgb8(flattened)))
}
