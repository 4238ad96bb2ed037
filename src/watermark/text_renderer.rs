//! Text watermark rendering.
//!
//! Renders text into a padded, transparent RGBA canvas and rotates it with
//! output expansion so no opaque pixel is ever cropped.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::font::FontHandle;
//! use tilemark::watermark::text_renderer::{render_text, rotate_expand};
//!
//! let font = FontHandle::embedded();
//! let flat = render_text("CONFIDENTIAL", 28.0, 46, &font);
//! let tile = rotate_expand(&flat, -35.0);
//! ```

use super::compositor::blend_over;
use super::font::FontHandle;
use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

/// Transparent border around the tight text bounds, on every side.
pub const TILE_PADDING: u32 = 10;

/// Tight pixel bounds of rendered text, relative to the layout origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl TextBounds {
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x).max(0.0).ceil() as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y).max(0.0).ceil() as u32
    }

    fn union(self, other: TextBounds) -> TextBounds {
        TextBounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Pixel scale whose em square is `font_size` pixels tall.
fn em_scale(font: &FontArc, font_size: f32) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => {
            PxScale::from(font_size * font.height_unscaled() / units_per_em)
        }
        _ => PxScale::from(font_size),
    }
}

/// Lay out a single line of text with kerning, baseline at the ascent.
fn layout_glyphs(font: &FontArc, text: &str, font_size: f32, dx: f32, dy: f32) -> Vec<Glyph> {
    let scale = em_scale(font, font_size);
    let scaled_font = font.as_scaled(scale);
    let baseline_y = scaled_font.ascent() + dy;

    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor_x = dx;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        glyphs.push(glyph_id.with_scale_and_position(scale, point(cursor_x, baseline_y)));

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    glyphs
}

/// Tight bounds of the rendered glyph outlines, or `None` when nothing
/// would be drawn (empty text, whitespace only).
pub fn text_bounds(text: &str, font_size: f32, font: &FontHandle) -> Option<TextBounds> {
    let font = font.font();

    layout_glyphs(font, text, font_size, 0.0, 0.0)
        .into_iter()
        .filter_map(|glyph| font.outline_glyph(glyph))
        .map(|outlined| {
            let bounds = outlined.px_bounds();
            TextBounds {
                min_x: bounds.min.x,
                min_y: bounds.min.y,
                max_x: bounds.max.x,
                max_y: bounds.max.y,
            }
        })
        .reduce(TextBounds::union)
}

/// Size of the tight text bounds in pixels, (0, 0) for blank text.
pub fn measure_text(text: &str, font_size: f32, font: &FontHandle) -> (u32, u32) {
    text_bounds(text, font_size, font)
        .map(|b| (b.width(), b.height()))
        .unwrap_or((0, 0))
}

/// Render black text with the given peak alpha onto a padded canvas.
///
/// The canvas is the tight text bounds plus [`TILE_PADDING`] on each side;
/// blank text produces a fully transparent padding-only canvas.
pub fn render_text(text: &str, font_size: f32, alpha: u8, font: &FontHandle) -> RgbaImage {
    let padding = TILE_PADDING as f32;

    let bounds = match text_bounds(text, font_size, font) {
        Some(bounds) => bounds,
        None => return RgbaImage::new(TILE_PADDING * 2, TILE_PADDING * 2),
    };

    let canvas_width = bounds.width() + TILE_PADDING * 2;
    let canvas_height = bounds.height() + TILE_PADDING * 2;
    let mut image = RgbaImage::new(canvas_width, canvas_height);

    // px_bounds are whole pixels, so this shift keeps glyph rasterization
    // identical to the measuring pass
    let dx = padding - bounds.min_x;
    let dy = padding - bounds.min_y;

    let font = font.font();
    for glyph in layout_glyphs(font, text, font_size, dx, dy) {
        let outlined = match font.outline_glyph(glyph) {
            Some(outlined) => outlined,
            None => continue,
        };
        let glyph_bounds = outlined.px_bounds();

        outlined.draw(|px, py, coverage| {
            let x = px as i32 + glyph_bounds.min.x as i32;
            let y = py as i32 + glyph_bounds.min.y as i32;

            if x >= 0 && y >= 0 && x < canvas_width as i32 && y < canvas_height as i32 {
                let pixel_alpha = (coverage.clamp(0.0, 1.0) * alpha as f32).round() as u8;
                if pixel_alpha == 0 {
                    return;
                }

                // Overlapping glyph edges accumulate alpha
                let existing = image.get_pixel_mut(x as u32, y as u32);
                *existing = blend_over(*existing, Rgba([0, 0, 0, pixel_alpha]));
            }
        });
    }

    image
}

/// Size of a `width` x `height` box rotated by `degrees`.
pub fn rotated_size(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    let (w, h) = (width as f64, height as f64);

    (
        expanded(w * cos.abs() + h * sin.abs()),
        expanded(w * sin.abs() + h * cos.abs()),
    )
}

/// Round an extent up to whole pixels, ignoring float noise at right angles.
fn expanded(extent: f64) -> u32 {
    (extent - 1e-6).ceil().max(1.0) as u32
}

/// Rotate an image counter-clockwise by `degrees`, growing the canvas to
/// the rotated bounding box.
pub fn rotate_expand(image: &RgbaImage, degrees: f32) -> RgbaImage {
    if degrees.rem_euclid(360.0) == 0.0 {
        return image.clone();
    }

    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    let (dst_w, dst_h) = rotated_size(image.width(), image.height(), degrees);
    let mut rotated = RgbaImage::new(dst_w, dst_h);

    let src_cx = image.width() as f64 / 2.0;
    let src_cy = image.height() as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            // Inverse mapping from destination pixel centre to source
            let rx = dx as f64 + 0.5 - dst_cx;
            let ry = dy as f64 + 0.5 - dst_cy;

            let sx = rx * cos - ry * sin + src_cx - 0.5;
            let sy = rx * sin + ry * cos + src_cy - 0.5;

            if let Some(pixel) = sample_bilinear(image, sx, sy) {
                rotated.put_pixel(dx, dy, pixel);
            }
        }
    }

    rotated
}

/// Bilinear sample treating everything outside the image as transparent.
///
/// Interpolates premultiplied values so transparent neighbours do not bleed
/// colour. Returns `None` for fully transparent results.
fn sample_bilinear(image: &RgbaImage, sx: f64, sy: f64) -> Option<Rgba<u8>> {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;

    let (w, h) = (image.width() as i64, image.height() as i64);
    let fetch = |x: i64, y: i64| -> [f64; 4] {
        if x < 0 || y < 0 || x >= w || y >= h {
            return [0.0; 4];
        }
        let p = image.get_pixel(x as u32, y as u32);
        let a = p[3] as f64 / 255.0;
        [p[0] as f64 * a, p[1] as f64 * a, p[2] as f64 * a, p[3] as f64]
    };

    let (x0, y0) = (x0 as i64, y0 as i64);
    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);

    let interpolate = |c: usize| -> f64 {
        p00[c] * (1.0 - fx) * (1.0 - fy)
            + p10[c] * fx * (1.0 - fy)
            + p01[c] * (1.0 - fx) * fy
            + p11[c] * fx * fy
    };

    let alpha = interpolate(3).round().clamp(0.0, 255.0);
    if alpha < 1.0 {
        return None;
    }

    let unpremultiply = |c: usize| -> u8 {
        (interpolate(c) * 255.0 / alpha).round().clamp(0.0, 255.0) as u8
    };

    Some(Rgba([
        unpremultiply(0),
        unpremultiply(1),
        unpremultiply(2),
        alpha as u8,
    ]))
}
