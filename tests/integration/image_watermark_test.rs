// End-to-end raster watermarking through the job pipeline

use super::fixtures;
use image::GenericImageView;
use rstest::rstest;
use tempfile::TempDir;
use tilemark::config::Config;
use tilemark::digest::sha256_file;
use tilemark::error::WatermarkError;
use tilemark::pipeline::{run, JobRequest};
use tilemark::raster::{DocumentKind, RasterFormat};
use tilemark::watermark::composer::{WatermarkFields, FIELD_SEPARATOR};

fn fields() -> WatermarkFields {
    WatermarkFields::default().with_recipient("Copy for Bank XYZ")
}

#[rstest]
#[case("scan.png", "scan_wm.jpg", image::ImageFormat::Jpeg)]
#[case("scan.jpg", "scan_wm.png", image::ImageFormat::Png)]
#[case("scan.bmp", "scan_wm.webp", image::ImageFormat::WebP)]
#[case("scan.tiff", "scan_wm.tif", image::ImageFormat::Tiff)]
#[case("scan.webp", "scan_wm.bmp", image::ImageFormat::Bmp)]
fn test_output_extension_selects_format(
    #[case] input_name: &str,
    #[case] output_name: &str,
    #[case] expected: image::ImageFormat,
) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join(input_name);
    let output = dir.path().join(output_name);
    fixtures::write_image(&input, 320, 200);

    run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), expected);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (320, 200));
}

#[test]
fn test_full_hd_photo_gets_dense_tiling() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("id_card.png");
    let output = dir.path().join("id_card_wm.png");
    fixtures::write_image(&input, 1920, 1080);
    let original_hash = sha256_file(&input).unwrap();

    let report = run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap();

    assert_eq!(report.kind, DocumentKind::Image(RasterFormat::Png));
    assert_eq!(report.pages, 1);
    // Steps of 537 by 237 with a 43 px margin: 4 columns, 5 rows
    assert_eq!(report.placements, 20);
    assert_eq!(sha256_file(&input).unwrap(), original_hash);

    let original = image::open(&input).unwrap().to_rgb8();
    let marked = image::open(&output).unwrap().to_rgb8();
    assert_eq!(marked.dimensions(), original.dimensions());

    let changed = original
        .pixels()
        .zip(marked.pixels())
        .filter(|(a, b)| a != b)
        .count();
    assert!(changed > 0, "watermark left the image untouched");
}

#[test]
fn test_transparent_png_is_flattened() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("logo.png");
    let output = dir.path().join("logo_wm.png");
    let logo = image::RgbaImage::from_pixel(200, 120, image::Rgba([0, 0, 255, 0]));
    logo.save(&input).unwrap();

    run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap();

    let marked = image::open(&output).unwrap();
    assert!(!marked.color().has_alpha());
}

#[test]
fn test_label_options_change_stamped_text() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.png");
    fixtures::write_image(&input, 160, 120);

    let fields = WatermarkFields {
        recipient: Some("Auditor".to_string()),
        purpose: Some("Annual review".to_string()),
        extra_text: Some("Do not forward".to_string()),
        include_date: false,
        include_hash: false,
    };
    let report = run(
        &JobRequest::new(&input, dir.path().join("out.png"), fields),
        &Config::default(),
    )
    .unwrap();

    assert_eq!(
        report.text,
        ["Auditor", "Annual review", "Do not forward"].join(FIELD_SEPARATOR)
    );
}

#[test]
fn test_unsupported_output_extension() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.png");
    let output = dir.path().join("scan.gif");
    fixtures::write_image(&input, 64, 64);

    let err = run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap_err();

    assert!(matches!(err, WatermarkError::UnsupportedFormat { .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(!output.exists());
}

#[test]
fn test_truncated_image_is_unsupported_image() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.png");
    fixtures::write_image(&input, 200, 200);
    let bytes = std::fs::read(&input).unwrap();
    std::fs::write(&input, &bytes[..bytes.len() / 3]).unwrap();
    let output = dir.path().join("scan_wm.png");

    let err = run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap_err();

    assert!(matches!(err, WatermarkError::UnsupportedImage { .. }));
    assert!(!output.exists());
}
