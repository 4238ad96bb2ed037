// Tilemark watermarking library

pub mod config;
pub mod digest;
pub mod error;
pub mod logging;
pub mod output;
pub mod pdf;
pub mod pipeline;
pub mod prompt;
pub mod raster;
pub mod watermark;
