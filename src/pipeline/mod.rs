// Job pipeline - validates a request, runs the matching tiling pass and
// writes the result

use std::path::PathBuf;

use crate::config::Config;
use crate::digest::sha256_file;
use crate::error::WatermarkError;
use crate::output::write_atomic;
use crate::pdf::PdfDocument;
use crate::raster::{DocumentKind, EncoderQuality, RasterFormat, RasterSurface};
use crate::watermark::composer::{compose, WatermarkFields};
use crate::watermark::font::{resolve_font, FontHandle};
use crate::watermark::grid::PlacementGrid;
use crate::watermark::image_pass::{tile_onto_image, ImageLayout};
use crate::watermark::pdf_pass::tile_onto_pages;
use crate::watermark::tile::{generate_tile_for, WatermarkSpec};

/// One watermarking job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fields: WatermarkFields,
}

impl JobRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, fields: WatermarkFields) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            fields,
        }
    }
}

/// What a successful job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub output: PathBuf,
    /// SHA-256 of the original input, 64 hex characters
    pub sha256: String,
    /// The stamped text
    pub text: String,
    pub kind: DocumentKind,
    /// Pages processed; 1 for images
    pub pages: usize,
    pub placements: usize,
}

/// Run a job.
///
/// Checks happen before any processing, in this order: the input exists,
/// the input extension is supported, an image output has an encodable
/// extension, the configuration is valid. Output is written only after the
/// whole pass succeeded.
pub fn run(request: &JobRequest, config: &Config) -> Result<JobReport, WatermarkError> {
    let kind = check_request(request)?;
    config.validate().map_err(WatermarkError::Config)?;

    let sha256 = sha256_file(&request.input)?;
    let text = compose(&request.fields, &sha256);
    let font = resolve_font(&config.font.source());
    let spec = WatermarkSpec::new(text.clone(), config.watermark.angle, config.watermark.opacity);

    tracing::info!(
        input = %request.input.display(),
        output = %request.output.display(),
        kind = ?kind,
        text_len = text.chars().count(),
        "Starting watermark job"
    );

    let (pages, placements) = match kind {
        DocumentKind::Pdf => watermark_pdf(request, config, &spec, &font)?,
        DocumentKind::Image(_) => watermark_image(request, config, &spec, &font)?,
    };

    tracing::info!(pages, placements, "Watermark job complete");

    Ok(JobReport {
        output: request.output.clone(),
        sha256,
        text,
        kind,
        pages,
        placements,
    })
}

/// Input and output checks that must pass before any work starts.
pub fn check_request(request: &JobRequest) -> Result<DocumentKind, WatermarkError> {
    if !request.input.exists() {
        return Err(WatermarkError::InputNotFound {
            path: request.input.clone(),
        });
    }

    let kind = DocumentKind::detect(&request.input)?;
    if let DocumentKind::Image(_) = kind {
        RasterFormat::for_output(&request.output)?;
    }
    Ok(kind)
}

fn watermark_pdf(
    request: &JobRequest,
    config: &Config,
    spec: &WatermarkSpec,
    font: &FontHandle,
) -> Result<(usize, usize), WatermarkError> {
    let mut document = PdfDocument::open(&request.input)?;
    let tile = generate_tile_for(spec, config.pdf.font_size, font);

    let mut pages = document.pages();
    let summary = tile_onto_pages(&mut pages, &tile, &config.pdf.grid_spec())?;
    document.apply_overlays(&pages, &tile)?;

    let bytes = document.to_bytes()?;
    write_atomic(&request.output, &bytes)?;

    Ok((summary.pages, summary.placements))
}

fn watermark_image(
    request: &JobRequest,
    config: &Config,
    spec: &WatermarkSpec,
    font: &FontHandle,
) -> Result<(usize, usize), WatermarkError> {
    let format = RasterFormat::for_output(&request.output)?;
    let canvas = RasterSurface::open(&request.input)?;

    let params = config.image.tiling_params();
    let layout = ImageLayout::for_canvas(canvas.width(), canvas.height(), &params)?;
    let placements = PlacementGrid::new(
        canvas.width() as f64,
        canvas.height() as f64,
        layout.grid_spec(),
    )?
    .len();

    let watermarked = tile_onto_image(&canvas, spec, &params, font)?;
    let encoded = watermarked.encode(format, EncoderQuality::with_quality(config.image.quality))?;
    write_atomic(&request.output, &encoded.data)?;

    Ok((1, placements))
}
