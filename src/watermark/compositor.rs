//! Source-over compositing of watermark tiles.
//!
//! All blending here uses straight (non-premultiplied) RGBA and the
//! Porter-Duff "over" operator, so overlapping tile edges accumulate alpha
//! instead of replacing each other.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::compositor::{composite_at, flatten};
//!
//! let mut overlay = RgbaImage::new(800, 600);
//! composite_at(&mut overlay, tile.image(), -40, 25);
//! let opaque = flatten(&source, &overlay);
//! ```

use image::{Rgba, RgbImage, RgbaImage};
use rayon::prelude::*;

/// Blend `top` over `bottom` with the "over" operator.
///
/// result.alpha = top.alpha + bottom.alpha * (1 - top.alpha)
pub fn blend_over(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    if top[3] == 0 {
        return bottom;
    }
    if bottom[3] == 0 || top[3] == 255 {
        return top;
    }

    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;
    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    let blend_channel = |t: u8, b: u8| -> u8 {
        let result =
            (t as f32 * top_alpha + b as f32 * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(top[0], bottom[0]),
        blend_channel(top[1], bottom[1]),
        blend_channel(top[2], bottom[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Composite `source` over `target` with its top-left corner at (x, y).
///
/// The source may hang off any edge of the target; only the intersecting
/// pixels are touched.
pub fn composite_at(target: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;

    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + source.width() as i64).min(target_width);
    let y_end = (y + source.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = *source.get_pixel((tx - x) as u32, (ty - y) as u32);
            if src[3] == 0 {
                continue;
            }

            let dst = target.get_pixel_mut(tx as u32, ty as u32);
            *dst = blend_over(*dst, src);
        }
    }
}

/// Flatten `overlay` over `base` and drop the alpha channel.
///
/// Both images must have the same dimensions. Rows are independent, so they
/// are blended in parallel.
pub fn flatten(base: &RgbaImage, overlay: &RgbaImage) -> RgbImage {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());

    let (width, height) = base.dimensions();
    let mut out = RgbImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let rgb_row = width as usize * 3;
    let rgba_row = width as usize * 4;

    out.par_chunks_mut(rgb_row)
        .zip(base.par_chunks(rgba_row))
        .zip(overlay.par_chunks(rgba_row))
        .for_each(|((dst, src), over)| {
            for ((d, s), o) in dst
                .chunks_exact_mut(3)
                .zip(src.chunks_exact(4))
                .zip(over.chunks_exact(4))
            {
                let blended = blend_over(
                    Rgba([s[0], s[1], s[2], s[3]]),
                    Rgba([o[0], o[1], o[2], o[3]]),
                );
                d.copy_from_slice(&blended.0[..3]);
            }
        });

    out
}
