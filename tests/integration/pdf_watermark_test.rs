// End-to-end PDF watermarking through the job pipeline

use super::fixtures::{self, LETTER};
use lopdf::{Document, Object};
use tempfile::TempDir;
use tilemark::config::Config;
use tilemark::digest::sha256_file;
use tilemark::error::WatermarkError;
use tilemark::pdf::PdfDocument;
use tilemark::pipeline::{run, JobRequest};
use tilemark::raster::DocumentKind;
use tilemark::watermark::composer::WatermarkFields;

fn fields() -> WatermarkFields {
    WatermarkFields::default()
        .with_recipient("Copy for Bank XYZ")
        .with_purpose("KYC 2025")
}

fn media_size(doc: &Document, page_id: lopdf::ObjectId) -> (f32, f32) {
    let dict = doc.get_dictionary(page_id).unwrap();
    let media_box = match dict.get(b"MediaBox") {
        Ok(value) => value.as_array().unwrap().clone(),
        Err(_) => {
            let parent = dict.get(b"Parent").unwrap().as_reference().unwrap();
            doc.get_dictionary(parent)
                .unwrap()
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .clone()
        }
    };
    let values: Vec<f32> = media_box.iter().map(|v| v.as_float().unwrap()).collect();
    (values[2] - values[0], values[3] - values[1])
}

fn image_xobjects(doc: &Document, page_id: lopdf::ObjectId) -> usize {
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = match page.get(b"Resources").unwrap() {
        Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
        other => other.as_dict().unwrap(),
    };
    let xobjects = match resources.get(b"XObject").unwrap() {
        Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
        other => other.as_dict().unwrap(),
    };
    xobjects
        .iter()
        .filter(|(_, value)| {
            let id = value.as_reference().unwrap();
            let stream = doc.get_object(id).unwrap().as_stream().unwrap();
            stream.dict.get(b"Subtype").unwrap().as_name().unwrap() == b"Image"
        })
        .count()
}

#[test]
fn test_three_page_letter_document() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("statement.pdf");
    let output = dir.path().join("statement_wm.pdf");
    fixtures::save_pdf(fixtures::letter_pdf(3), &input);
    let original_hash = sha256_file(&input).unwrap();

    let report = run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap();

    assert_eq!(report.kind, DocumentKind::Pdf);
    assert_eq!(report.pages, 3);
    assert!(report.placements >= 3);
    assert_eq!(report.sha256, original_hash);
    assert_eq!(sha256_file(&input).unwrap(), original_hash, "input must not change");

    let doc = Document::load(&output).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);
    for page_id in pages.values() {
        assert_eq!(media_size(&doc, *page_id), (LETTER.0 as f32, LETTER.1 as f32));
        assert!(image_xobjects(&doc, *page_id) >= 1);
    }
}

#[test]
fn test_original_text_is_kept_below_overlay() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("statement.pdf");
    let output = dir.path().join("statement_wm.pdf");
    fixtures::save_pdf(fixtures::letter_pdf(2), &input);

    run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap();

    let doc = Document::load(&output).unwrap();
    for (n, operations) in fixtures::page_operators(&doc).iter().enumerate() {
        let text_at = operations
            .iter()
            .position(|op| {
                op.operator == "Tj"
                    && op.operands.first().and_then(|o| o.as_str().ok())
                        == Some(fixtures::page_text(n).as_bytes())
            })
            .expect("original text missing");
        let first_draw = operations
            .iter()
            .position(|op| op.operator == "Do")
            .expect("no overlay drawn");
        assert!(text_at < first_draw, "page {} overlay drawn under its text", n);
    }
}

#[test]
fn test_each_page_uses_its_own_size() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("mixed.pdf");
    let output = dir.path().join("mixed_wm.pdf");
    fixtures::save_pdf(fixtures::pdf_with_sizes(&[LETTER, (842, 595)]), &input);

    run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap();

    let doc = Document::load(&output).unwrap();
    let ids: Vec<_> = doc.get_pages().into_values().collect();
    assert_eq!(media_size(&doc, ids[0]), (612.0, 792.0));
    assert_eq!(media_size(&doc, ids[1]), (842.0, 595.0));

    let draws: Vec<usize> = fixtures::page_operators(&doc)
        .iter()
        .map(|ops| ops.iter().filter(|op| op.operator == "Do").count())
        .collect();
    assert_ne!(draws[0], draws[1], "landscape page should get its own grid");
}

#[test]
fn test_broken_page_aborts_whole_document() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.pdf");
    let output = dir.path().join("broken_wm.pdf");
    fixtures::save_pdf(fixtures::pdf_with_broken_page(5, 2), &input);

    let err = run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap_err();

    match err {
        WatermarkError::PageOverlay { page_index, .. } => assert_eq!(page_index, 2),
        other => panic!("expected page overlay error, got {:?}", other),
    }
    assert!(!output.exists(), "no partial output may be written");
}

#[test]
fn test_failed_job_keeps_existing_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.pdf");
    let output = dir.path().join("previous.pdf");
    fixtures::save_pdf(fixtures::pdf_with_broken_page(3, 0), &input);
    std::fs::write(&output, b"previous result").unwrap();

    assert!(run(&JobRequest::new(&input, &output, fields()), &Config::default()).is_err());
    assert_eq!(std::fs::read(&output).unwrap(), b"previous result");
}

#[test]
fn test_not_a_pdf_is_document_error() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("fake.pdf");
    std::fs::write(&input, b"plain text pretending to be a PDF").unwrap();

    let err = run(
        &JobRequest::new(&input, dir.path().join("fake_wm.pdf"), fields()),
        &Config::default(),
    )
    .unwrap_err();

    assert!(matches!(err, WatermarkError::Document(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_output_reloads_through_pdf_document() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("statement.pdf");
    let output = dir.path().join("statement_wm.pdf");
    fixtures::save_pdf(fixtures::letter_pdf(1), &input);

    run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap();

    let reloaded = PdfDocument::open(&output).unwrap();
    assert_eq!(reloaded.page_count(), 1);
    let geometry = reloaded.pages()[0].geometry().unwrap();
    assert_eq!((geometry.width(), geometry.height()), (612.0, 792.0));
}

#[test]
fn test_rotated_page_gets_grid_of_its_visible_size() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("scan.pdf");
    let output = dir.path().join("scan_wm.pdf");
    fixtures::save_pdf(fixtures::pdf_with_rotated_page(2, 1, 90), &input);

    let report = run(&JobRequest::new(&input, &output, fields()), &Config::default()).unwrap();

    // Upright letter page: 3 x 4 tiles; the same page turned to landscape: 3 x 3
    assert_eq!(report.placements, 12 + 9);

    let doc = Document::load(&output).unwrap();
    let turned = *doc.get_pages().get(&2).unwrap();
    let rotate = doc.get_dictionary(turned).unwrap().get(b"Rotate").unwrap();
    assert_eq!(rotate.as_i64().unwrap(), 90);
}
