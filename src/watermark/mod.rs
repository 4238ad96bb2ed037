//! Tiled text watermarks.
//!
//! The engine renders the watermark text once into a rotated,
//! semi-transparent [`Tile`] and stamps it across a canvas on a regular
//! placement grid that overshoots every edge by a margin.
//!
//! # Pipeline
//!
//! ```text
//! WatermarkFields --compose--> text --generate_tile--> Tile
//!                                                       |
//!                     +---------------------------------+
//!                     v                                 v
//!         tile_onto_pages (PDF)              tile_onto_image (raster)
//! ```
//!
//! Both passes walk the same [`PlacementGrid`]: PDF pages in points, images
//! in pixels with a layout derived from the image size.
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   angle: -35.0
//!   opacity: 0.18
//! pdf:
//!   font_size: 28
//!   x_step: 320
//!   y_step: 240
//!   margin: 36
//! ```

pub mod composer;
pub mod compositor;
pub mod font;
pub mod grid;
pub mod image_pass;
pub mod pdf_pass;
pub mod text_renderer;
pub mod tile;

// Re-export main types for convenience
pub use composer::{compose, compose_on, WatermarkFields, FIELD_SEPARATOR};
pub use compositor::{blend_over, composite_at, flatten};
pub use font::{resolve_font, FontHandle, FontLoadError, FontSource};
pub use grid::{GridSpec, Placement, PlacementGrid, Region};
pub use image_pass::{tile_onto_image, ImageLayout, ImageTilingParams};
pub use pdf_pass::{tile_onto_pages, PageDimensions, PageSurface, PassSummary};
pub use text_renderer::{measure_text, render_text, rotate_expand, TILE_PADDING};
pub use tile::{generate_tile, generate_tile_for, Tile, WatermarkSpec};
