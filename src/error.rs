// Error types module

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a watermarking job.
///
/// Every variant aborts the job: nothing is retried because every step is
/// deterministic and local. Font problems are not represented here, they are
/// recovered inside the tile generator (see `watermark::font`).
#[derive(Error, Debug)]
pub enum WatermarkError {
    /// The input path does not exist
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// The file extension is not a PDF or a supported raster type
    #[error("Unsupported format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// A page rejected the overlay; the whole document is abandoned
    #[error("Page {page_index} rejected the watermark overlay: {reason}")]
    PageOverlay { page_index: usize, reason: String },

    /// The raster container could not be decoded
    #[error("Unsupported or corrupt image: {message}")]
    UnsupportedImage { message: String },

    /// Grid steps or margin cannot produce a finite placement grid
    #[error("Invalid tiling layout: {0}")]
    InvalidLayout(String),

    /// Configuration file unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDF container could not be read or written
    #[error("PDF document error: {0}")]
    Document(String),

    /// Encoding the output image failed
    #[error("Failed to encode to {format}: {message}")]
    Encode { format: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatermarkError {
    /// Create a page overlay error
    pub fn page_overlay(page_index: usize, reason: impl Into<String>) -> Self {
        Self::PageOverlay {
            page_index,
            reason: reason.into(),
        }
    }

    /// Create an image decoding error
    pub fn unsupported_image(message: impl Into<String>) -> Self {
        Self::UnsupportedImage {
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error
    ///
    /// - InputNotFound → 2
    /// - UnsupportedFormat → 3
    /// - everything else → 1
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputNotFound { .. } => 2,
            Self::UnsupportedFormat { .. } => 3,
            _ => 1,
        }
    }
}
