//! Image encoder abstraction
//!
//! One encoder per writable [`RasterFormat`], selected through
//! [`EncoderFactory`]. Watermarked images are always opaque, so every
//! encoder takes RGB8 pixels.

use super::format::RasterFormat;
use crate::error::WatermarkError;
use image::{ColorType, ImageEncoder as _, RgbImage};
use std::io::Cursor;

/// Quality settings for image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderQuality {
    /// Quality value (1-100); only lossy encoders look at it
    pub quality: u8,
}

impl Default for EncoderQuality {
    fn default() -> Self {
        Self { quality: 92 }
    }
}

impl EncoderQuality {
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: RasterFormat,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: RasterFormat) -> Self {
        Self { data, format }
    }
}

/// Trait for image encoders
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> RasterFormat;

    /// Encode an opaque RGB image
    fn encode(&self, image: &RgbImage, quality: EncoderQuality)
        -> Result<EncodedImage, WatermarkError>;
}

/// JPEG encoder honouring the quality setting
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> RasterFormat {
        RasterFormat::Jpeg
    }

    fn encode(
        &self,
        image: &RgbImage,
        quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;

        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, quality.quality)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
            .map_err(|e| WatermarkError::encode_failed("jpeg", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), RasterFormat::Jpeg))
    }
}

pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> RasterFormat {
        RasterFormat::Png
    }

    fn encode(
        &self,
        image: &RgbImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;

        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
            .map_err(|e| WatermarkError::encode_failed("png", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), RasterFormat::Png))
    }
}

/// WebP encoder using the image crate
///
/// Note: The `image` crate only supports lossless WebP encoding.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> RasterFormat {
        RasterFormat::WebP
    }

    fn encode(
        &self,
        image: &RgbImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::webp::WebPEncoder as ImageWebPEncoder;

        let mut output = Cursor::new(Vec::new());
        ImageWebPEncoder::new_lossless(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
            .map_err(|e| WatermarkError::encode_failed("webp", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), RasterFormat::WebP))
    }
}

pub struct TiffEncoder;

impl ImageEncoder for TiffEncoder {
    fn format(&self) -> RasterFormat {
        RasterFormat::Tiff
    }

    fn encode(
        &self,
        image: &RgbImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::tiff::TiffEncoder as ImageTiffEncoder;

        // TIFF needs a seekable writer
        let mut output = Cursor::new(Vec::new());
        ImageTiffEncoder::new(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
            .map_err(|e| WatermarkError::encode_failed("tiff", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), RasterFormat::Tiff))
    }
}

pub struct BmpEncoder;

impl ImageEncoder for BmpEncoder {
    fn format(&self) -> RasterFormat {
        RasterFormat::Bmp
    }

    fn encode(
        &self,
        image: &RgbImage,
        _quality: EncoderQuality,
    ) -> Result<EncodedImage, WatermarkError> {
        use image::codecs::bmp::BmpEncoder as ImageBmpEncoder;

        let mut output = Vec::new();
        ImageBmpEncoder::new(&mut output)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
            .map_err(|e| WatermarkError::encode_failed("bmp", e.to_string()))?;

        Ok(EncodedImage::new(output, RasterFormat::Bmp))
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: RasterFormat) -> Box<dyn ImageEncoder> {
        match format {
            RasterFormat::Jpeg => Box::new(JpegEncoder),
            RasterFormat::Png => Box::new(PngEncoder),
            RasterFormat::WebP => Box::new(WebPEncoder),
            RasterFormat::Tiff => Box::new(TiffEncoder),
            RasterFormat::Bmp => Box::new(BmpEncoder),
        }
    }
}
