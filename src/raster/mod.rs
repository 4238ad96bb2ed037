//! Raster surfaces: decoding, format detection and encoding of images.

pub mod encoder;
pub mod format;

pub use encoder::{EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder};
pub use format::{DocumentKind, RasterFormat, SUPPORTED_EXTENSIONS};

use crate::error::WatermarkError;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// A decoded image, sized in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    image: DynamicImage,
}

impl RasterSurface {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decode an in-memory image, guessing the container from its bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, WatermarkError> {
        image::load_from_memory(bytes)
            .map(Self::new)
            .map_err(|e| WatermarkError::unsupported_image(e.to_string()))
    }

    /// Read and decode an image file.
    ///
    /// The container is sniffed from the file contents, so a misnamed file
    /// still decodes; an unreadable file is an I/O error.
    pub fn open(path: &Path) -> Result<Self, WatermarkError> {
        let reader = image::io::Reader::open(path)?
            .with_guessed_format()
            .map_err(WatermarkError::Io)?;

        let image = reader.decode().map_err(|e| {
            WatermarkError::unsupported_image(format!("{}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Decoded image"
        );

        Ok(Self::new(image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Pixels converted to straight RGBA.
    pub fn to_rgba8(&self) -> RgbaImage {
        self.image.to_rgba8()
    }

    /// Encode as `format`, dropping any alpha channel.
    pub fn encode(
        &self,
        format: RasterFormat,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        let rgb = self.image.to_rgb8();
        EncoderFactory::create(format).encode(&rgb, quality)
    }
}
