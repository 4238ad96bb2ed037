//! Fixture documents built in memory.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;

pub const LETTER: (i64, i64) = (612, 792);

/// Text drawn on page `n` (zero-based) of fixture PDFs.
pub fn page_text(n: usize) -> String {
    format!("Account statement page {}", n + 1)
}

/// A PDF with one page per entry of `sizes`, each showing `page_text(n)`.
///
/// The first size is also set on the page tree root so pages with the
/// default size inherit their MediaBox.
pub fn pdf_with_sizes(sizes: &[(i64, i64)]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let default_size = sizes.first().copied().unwrap_or(LETTER);
    let mut kids = Vec::new();
    for (n, &(width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(page_text(n))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if (width, height) != default_size {
            page.set("MediaBox", vec![0.into(), 0.into(), width.into(), height.into()]);
        }
        kids.push(doc.add_object(page).into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => sizes.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                default_size.0.into(),
                default_size.1.into(),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn letter_pdf(pages: usize) -> Document {
    pdf_with_sizes(&vec![LETTER; pages])
}

/// A letter PDF whose page `broken` has an unusable MediaBox.
pub fn pdf_with_broken_page(pages: usize, broken: usize) -> Document {
    let mut doc = letter_pdf(pages);
    let page_id = *doc.get_pages().get(&(broken as u32 + 1)).unwrap();
    doc.get_object_mut(page_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("MediaBox", Object::string_literal("not a box"));
    doc
}

/// A letter PDF whose page `turned` carries `/Rotate rotate`.
pub fn pdf_with_rotated_page(pages: usize, turned: usize, rotate: i64) -> Document {
    let mut doc = letter_pdf(pages);
    let page_id = *doc.get_pages().get(&(turned as u32 + 1)).unwrap();
    doc.get_object_mut(page_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Rotate", rotate);
    doc
}

pub fn save_pdf(mut doc: Document, path: &Path) {
    doc.save(path).unwrap();
}

/// A white RGB image with a dark stripe, saved in the format implied by `path`.
pub fn write_image(path: &Path, width: u32, height: u32) {
    let image = RgbImage::from_fn(width, height, |_, y| {
        if y % 40 < 4 {
            Rgb([30, 30, 30])
        } else {
            Rgb([255, 255, 255])
        }
    });
    let format = ImageFormat::from_path(path).unwrap();
    DynamicImage::ImageRgb8(image)
        .save_with_format(path, format)
        .unwrap();
}

/// Text shown by every page of a watermarked PDF, in page order, and the
/// operators of each page.
pub fn page_operators(doc: &Document) -> Vec<Vec<Operation>> {
    doc.get_pages()
        .values()
        .map(|id| {
            let bytes = doc.get_page_content(*id).unwrap();
            Content::decode(&bytes).unwrap().operations
        })
        .collect()
}
