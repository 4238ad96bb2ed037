//! PDF documents backed by lopdf.
//!
//! [`PdfDocument::pages`] hands out detached [`PdfPage`] surfaces that the
//! tiling pass fills with overlay regions. [`PdfDocument::apply_overlays`]
//! then writes them back:
//!
//! - the tile is embedded once as an RGB image XObject with a grey SMask
//!   carrying its alpha;
//! - every page gets that XObject in its resources under a free name;
//! - the page content becomes `[q, <original streams>, Q <overlay>]`, so the
//!   original streams are kept untouched and the overlay paints last.

mod page;

pub use page::{PageBox, PageGeometry, PdfPage};

use crate::error::WatermarkError;
use crate::watermark::tile::Tile;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use page::{inherited, read_geometry, resolve};
use std::path::Path;

const XOBJECT_BASE_NAME: &str = "WmTile";

/// A loaded PDF document.
#[derive(Debug)]
pub struct PdfDocument {
    doc: Document,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, WatermarkError> {
        let doc = Document::load(path).map_err(|e| {
            WatermarkError::Document(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_document(doc))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WatermarkError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| WatermarkError::Document(format!("failed to parse PDF: {}", e)))?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Detached surfaces for every page, in document order.
    ///
    /// Surfaces measure the visible page (CropBox, turned by `/Rotate`).
    /// A page whose MediaBox cannot be read still gets a surface; it reports
    /// the problem when the tiling pass asks for its dimensions.
    pub fn pages(&self) -> Vec<PdfPage> {
        self.doc
            .get_pages()
            .into_values()
            .enumerate()
            .map(|(index, id)| PdfPage::new(index, id, read_geometry(&self.doc, id)))
            .collect()
    }

    /// Write the overlays recorded on `pages` into the document.
    ///
    /// Returns the number of pages that received an overlay.
    pub fn apply_overlays(
        &mut self,
        pages: &[PdfPage],
        tile: &Tile,
    ) -> Result<usize, WatermarkError> {
        if pages.iter().all(|p| p.regions().is_empty()) {
            return Ok(0);
        }

        let image_id = self.embed_tile(tile);
        let mut touched = 0;

        for page in pages.iter().filter(|p| !p.regions().is_empty()) {
            self.overlay_page(page, image_id)
                .map_err(|reason| WatermarkError::page_overlay(page.index(), reason))?;
            touched += 1;
        }

        tracing::debug!(pages = touched, "Applied PDF overlays");
        Ok(touched)
    }

    /// Serialise with unused objects pruned, objects renumbered and streams
    /// compressed.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, WatermarkError> {
        self.doc.prune_objects();
        self.doc.renumber_objects();
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer).map_err(|e| {
            WatermarkError::Document(format!("failed to serialise PDF: {}", e))
        })?;
        Ok(buffer)
    }

    fn embed_tile(&mut self, tile: &Tile) -> ObjectId {
        let (width, height) = (tile.width() as i64, tile.height() as i64);

        let smask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            tile.alpha_plane(),
        );
        let smask_id = self.doc.add_object(smask);

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "SMask" => smask_id,
            },
            tile.rgb_plane(),
        );
        self.doc.add_object(image)
    }

    fn overlay_page(&mut self, page: &PdfPage, image_id: ObjectId) -> Result<(), String> {
        let geometry = page.geometry()?;

        let mut resources = match inherited(&self.doc, page.id(), b"Resources")? {
            Some(object) => object
                .as_dict()
                .map_err(|_| "page /Resources is not a dictionary".to_string())?
                .clone(),
            None => Dictionary::new(),
        };
        let mut xobjects = match resources.get(b"XObject") {
            Ok(object) => resolve(&self.doc, object)?
                .as_dict()
                .map_err(|_| "page /XObject is not a dictionary".to_string())?
                .clone(),
            Err(_) => Dictionary::new(),
        };

        let name = free_name(&xobjects);
        xobjects.set(name.as_bytes().to_vec(), image_id);
        resources.set("XObject", xobjects);

        let mut contents = self.existing_contents(page.id())?;

        let overlay = overlay_operations(&name, page, &geometry);
        let overlay_bytes = encode(overlay)?;
        let save_bytes = encode(vec![Operation::new("q", vec![])])?;

        let save_id = self.doc.add_object(Stream::new(dictionary! {}, save_bytes));
        let overlay_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, overlay_bytes));

        contents.insert(0, Object::Reference(save_id));
        contents.push(Object::Reference(overlay_id));

        let page_dict = self
            .doc
            .get_object_mut(page.id())
            .and_then(Object::as_dict_mut)
            .map_err(|e| format!("page object unreadable: {}", e))?;
        page_dict.set("Resources", resources);
        page_dict.set("Contents", contents);

        Ok(())
    }

    /// Current content streams of a page, as references in drawing order.
    fn existing_contents(&self, page_id: ObjectId) -> Result<Vec<Object>, String> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| format!("page object unreadable: {}", e))?;

        match page_dict.get(b"Contents") {
            Err(_) => Ok(Vec::new()),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => Ok(items.clone()),
                Ok(Object::Stream(_)) => Ok(vec![Object::Reference(*id)]),
                Ok(_) => Err("page /Contents is not a stream".to_string()),
                Err(e) => Err(format!("page /Contents unreadable: {}", e)),
            },
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(_) => Err("page /Contents is neither a stream nor an array".to_string()),
        }
    }
}

/// `Q q` closes the wrapper around the original content, then one
/// `q w 0 0 h tx ty cm /Name Do Q` per region.
fn overlay_operations(name: &str, page: &PdfPage, geometry: &PageGeometry) -> Vec<Operation> {
    let mut ops = vec![Operation::new("Q", vec![]), Operation::new("q", vec![])];

    for region in page.regions() {
        let matrix = geometry.placement_matrix(region);
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            matrix.iter().map(|v| Object::Real(*v as f32)).collect(),
        ));
        ops.push(Operation::new(
            "Do",
            vec![Object::Name(name.as_bytes().to_vec())],
        ));
        ops.push(Operation::new("Q", vec![]));
    }

    ops.push(Operation::new("Q", vec![]));
    ops
}

fn encode(operations: Vec<Operation>) -> Result<Vec<u8>, String> {
    Content { operations }
        .encode()
        .map_err(|e| format!("failed to encode content stream: {}", e))
}

fn free_name(xobjects: &Dictionary) -> String {
    if !xobjects.has(XOBJECT_BASE_NAME.as_bytes()) {
        return XOBJECT_BASE_NAME.to_string();
    }
    (1..)
        .map(|n| format!("{}{}", XOBJECT_BASE_NAME, n))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_else(|| XOBJECT_BASE_NAME.to_string())
}
