//! Input and output type detection by file extension.
//!
//! The watermarking job decides between the PDF pass and the image pass from
//! the input extension alone; the output extension picks the encoder.

use crate::error::WatermarkError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Extensions accepted as input, lowercase, without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "webp", "tif", "tiff", "bmp"];

/// Raster formats that can be read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    Jpeg,
    Png,
    WebP,
    Tiff,
    Bmp,
}

impl RasterFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Tiff => "tif",
            Self::Bmp => "bmp",
        }
    }

    /// Format for a bare extension, case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Format implied by a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Format for writing to `path`, or `UnsupportedFormat`.
    pub fn for_output(path: &Path) -> Result<Self, WatermarkError> {
        Self::from_path(path).ok_or_else(|| WatermarkError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
            Self::Tiff => image::ImageFormat::Tiff,
            Self::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RasterFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| format!("unknown image format: {}", s))
    }
}

/// What kind of document a path holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image(RasterFormat),
}

impl DocumentKind {
    /// Classify `path` by extension; anything else is `UnsupportedFormat`.
    pub fn detect(path: &Path) -> Result<Self, WatermarkError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some(other) => RasterFormat::from_extension(other)
                .map(Self::Image)
                .ok_or_else(|| WatermarkError::UnsupportedFormat {
                    path: path.to_path_buf(),
                }),
            None => Err(WatermarkError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}
