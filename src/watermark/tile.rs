//! Watermark tile generation.
//!
//! A [`Tile`] is the rotated, semi-transparent bitmap of the watermark text.
//! It is produced once per job and stamped, unchanged, at every placement of
//! every page or image.

use super::font::FontHandle;
use super::text_renderer::{render_text, rotate_expand};
use image::RgbaImage;

/// What to stamp: the text, its rotation and its opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub text: String,
    /// Counter-clockwise rotation; any value is accepted.
    pub angle_degrees: f32,
    /// Requested opacity; clamped to [0, 1] when used.
    pub opacity: f32,
}

impl WatermarkSpec {
    pub fn new(text: impl Into<String>, angle_degrees: f32, opacity: f32) -> Self {
        Self {
            text: text.into(),
            angle_degrees,
            opacity,
        }
    }

    /// Opacity clamped to [0, 1]; NaN counts as fully transparent.
    pub fn clamped_opacity(&self) -> f32 {
        clamp_opacity(self.opacity)
    }
}

fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        0.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

/// Peak alpha for an opacity: round(opacity * 255), clamped to [0, 255].
pub fn opacity_to_alpha(opacity: f32) -> u8 {
    (clamp_opacity(opacity) * 255.0).round() as u8
}

/// Immutable rotated RGBA watermark bitmap. Width and height are never 0.
#[derive(Clone, PartialEq, Eq)]
pub struct Tile {
    image: RgbaImage,
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("dimensions", &(self.width(), self.height()))
            .finish()
    }
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Alpha channel, row-major, one byte per pixel.
    pub fn alpha_plane(&self) -> Vec<u8> {
        self.image.pixels().map(|p| p[3]).collect()
    }

    /// Colour channels, row-major, three bytes per pixel.
    pub fn rgb_plane(&self) -> Vec<u8> {
        self.image
            .pixels()
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect()
    }

    /// Whether any pixel is at least partly opaque.
    pub fn has_ink(&self) -> bool {
        self.image.pixels().any(|p| p[3] > 0)
    }
}

/// Render `text` into a rotated tile.
///
/// Deterministic: the same inputs and font always give byte-identical
/// tiles. Blank text gives a fully transparent tile.
pub fn generate_tile(
    text: &str,
    angle_degrees: f32,
    font_size_pt: f32,
    opacity: f32,
    font: &FontHandle,
) -> Tile {
    let alpha = opacity_to_alpha(opacity);
    let flat = render_text(text, font_size_pt, alpha, font);
    let image = rotate_expand(&flat, angle_degrees);

    tracing::debug!(
        text_len = text.chars().count(),
        angle = angle_degrees,
        font_size = font_size_pt,
        alpha,
        width = image.width(),
        height = image.height(),
        "Generated watermark tile"
    );

    Tile { image }
}

/// [`generate_tile`] for a [`WatermarkSpec`].
pub fn generate_tile_for(spec: &WatermarkSpec, font_size_pt: f32, font: &FontHandle) -> Tile {
    generate_tile(
        &spec.text,
        spec.angle_degrees,
        font_size_pt,
        spec.opacity,
        font,
    )
}
