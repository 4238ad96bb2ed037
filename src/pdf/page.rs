//! Page geometry and the detached page surface handed to the tiling pass.
//!
//! The tiling pass works in *visible* space: the page as a viewer shows
//! it, after cropping to the CropBox and turning by `/Rotate`. Origin is
//! the top-left corner, y grows downwards. [`PageGeometry::placement_matrix`]
//! maps a visible-space region back to default user space.

use crate::watermark::grid::Region;
use crate::watermark::pdf_pass::{PageDimensions, PageSurface};
use crate::watermark::tile::Tile;
use lopdf::{Document, Object, ObjectId};

/// Page tree depth guard against cyclic /Parent links
const MAX_TREE_DEPTH: usize = 64;

/// A page boundary box in default user space, normalised so `llx <= urx`,
/// `lly <= ury`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    pub fn from_corners(values: [f64; 4]) -> Self {
        let [x0, y0, x1, y1] = values;
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }

    fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Overlap of two boxes, `None` when they do not overlap.
    pub fn intersect(&self, other: &PageBox) -> Option<PageBox> {
        let overlap = PageBox {
            llx: self.llx.max(other.llx),
            lly: self.lly.max(other.lly),
            urx: self.urx.min(other.urx),
            ury: self.ury.min(other.ury),
        };
        (!overlap.is_degenerate()).then_some(overlap)
    }
}

/// Visible area of a page and the clockwise turn viewers apply to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// CropBox clipped to the MediaBox, or the MediaBox alone
    pub bounds: PageBox,
    /// One of 0, 90, 180, 270
    pub rotation: u16,
}

impl PageGeometry {
    /// `rotate` is the raw `/Rotate` value; anything that is not a multiple
    /// of 90 is treated as 0, as viewers do.
    pub fn new(bounds: PageBox, rotate: i64) -> Self {
        let rotation = match rotate.rem_euclid(360) {
            r @ (0 | 90 | 180 | 270) => r as u16,
            _ => 0,
        };
        Self { bounds, rotation }
    }

    pub fn unrotated(bounds: PageBox) -> Self {
        Self::new(bounds, 0)
    }

    fn is_sideways(&self) -> bool {
        self.rotation == 90 || self.rotation == 270
    }

    /// Visible width.
    pub fn width(&self) -> f64 {
        if self.is_sideways() {
            self.bounds.height()
        } else {
            self.bounds.width()
        }
    }

    /// Visible height.
    pub fn height(&self) -> f64 {
        if self.is_sideways() {
            self.bounds.width()
        } else {
            self.bounds.height()
        }
    }

    /// Maps visible space with a bottom-left origin and y upwards to default
    /// user space.
    fn visible_to_user(&self) -> [f64; 6] {
        let b = &self.bounds;
        match self.rotation {
            90 => [0.0, 1.0, -1.0, 0.0, b.urx, b.lly],
            180 => [-1.0, 0.0, 0.0, -1.0, b.urx, b.ury],
            270 => [0.0, -1.0, 1.0, 0.0, b.llx, b.ury],
            _ => [1.0, 0.0, 0.0, 1.0, b.llx, b.lly],
        }
    }

    /// Image placement matrix for a visible-space region.
    ///
    /// The image stays upright for the viewer whatever the page rotation.
    pub fn placement_matrix(&self, region: &Region) -> [f64; 6] {
        let local = [
            region.width(),
            0.0,
            0.0,
            region.height(),
            region.x0,
            self.height() - region.y1,
        ];
        concat(local, self.visible_to_user())
    }
}

/// `m` followed by `n`, in PDF row-vector convention.
fn concat(m: [f64; 6], n: [f64; 6]) -> [f64; 6] {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

/// One page of a [`super::PdfDocument`], detached from the document so the
/// tiling pass can work on pages in parallel.
///
/// Overlays are recorded here and written into the document afterwards by
/// [`super::PdfDocument::apply_overlays`].
#[derive(Debug, Clone)]
pub struct PdfPage {
    index: usize,
    id: ObjectId,
    geometry: Result<PageGeometry, String>,
    regions: Vec<Region>,
}

impl PdfPage {
    pub(crate) fn new(index: usize, id: ObjectId, geometry: Result<PageGeometry, String>) -> Self {
        Self {
            index,
            id,
            geometry,
            regions: Vec::new(),
        }
    }

    /// Zero-based position in the document.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn geometry(&self) -> Result<PageGeometry, String> {
        self.geometry.clone()
    }

    /// Regions recorded so far, in placement order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

impl PageSurface for PdfPage {
    fn dimensions(&self) -> Result<PageDimensions, String> {
        self.geometry
            .as_ref()
            .map(|g| PageDimensions::new(g.width(), g.height()))
            .map_err(Clone::clone)
    }

    fn overlay_image(&mut self, region: Region, tile: &Tile) -> Result<(), String> {
        if self.geometry.is_err() {
            return Err("page has no usable MediaBox".to_string());
        }
        if tile.width() == 0 || tile.height() == 0 {
            return Err("empty tile".to_string());
        }
        let coords = [region.x0, region.y0, region.x1, region.y1];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(format!("non-finite overlay region {:?}", region));
        }

        self.regions.push(region);
        Ok(())
    }
}

/// Follow references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, String> {
    let mut current = object;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(id) => {
                current = doc
                    .get_object(*id)
                    .map_err(|e| format!("broken reference {} {} R: {}", id.0, id.1, e))?;
            }
            direct => return Ok(direct),
        }
    }
    Err("reference chain too deep".to_string())
}

/// Look up a page attribute, walking up /Parent for inheritable keys.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, String> {
    let mut dict = doc
        .get_dictionary(page_id)
        .map_err(|e| format!("page object unreadable: {}", e))?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value).map(Some);
        }
        match dict.get(b"Parent") {
            Ok(parent) => {
                dict = resolve(doc, parent)?
                    .as_dict()
                    .map_err(|_| "page /Parent is not a dictionary".to_string())?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err("page tree too deep".to_string())
}

/// Read an inherited box attribute such as `MediaBox` or `CropBox`.
fn read_box(doc: &Document, page_id: ObjectId, key: &str) -> Result<Option<PageBox>, String> {
    let object = match inherited(doc, page_id, key.as_bytes())? {
        Some(object) => object,
        None => return Ok(None),
    };
    let items = object
        .as_array()
        .map_err(|_| format!("{} is not an array", key))?;
    if items.len() != 4 {
        return Err(format!("{} has {} entries, expected 4", key, items.len()));
    }

    let mut values = [0.0f64; 4];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = resolve(doc, item)?
            .as_float()
            .map_err(|_| format!("{} entry is not a number", key))? as f64;
    }
    Ok(Some(PageBox::from_corners(values)))
}

/// Read the visible geometry of a page: MediaBox (required), CropBox and
/// `/Rotate`, all possibly inherited.
///
/// A missing or unreadable CropBox, or one outside the MediaBox, falls back
/// to the MediaBox.
pub(crate) fn read_geometry(doc: &Document, page_id: ObjectId) -> Result<PageGeometry, String> {
    let media_box = read_box(doc, page_id, "MediaBox")?.ok_or("missing MediaBox")?;
    if media_box.is_degenerate() {
        return Err(format!(
            "degenerate MediaBox {}x{}",
            media_box.width(),
            media_box.height()
        ));
    }

    let bounds = match read_box(doc, page_id, "CropBox") {
        Ok(Some(crop_box)) => crop_box.intersect(&media_box).unwrap_or_else(|| {
            tracing::warn!(page = ?page_id, "CropBox outside MediaBox, using MediaBox");
            media_box
        }),
        Ok(None) => media_box,
        Err(reason) => {
            tracing::warn!(page = ?page_id, reason = %reason, "Unreadable CropBox, using MediaBox");
            media_box
        }
    };

    let rotate = match inherited(doc, page_id, b"Rotate")? {
        Some(Object::Integer(value)) => *value,
        Some(Object::Real(value)) => value.round() as i64,
        _ => 0,
    };
    let geometry = PageGeometry::new(bounds, rotate);
    if i64::from(geometry.rotation) != rotate.rem_euclid(360) {
        tracing::warn!(page = ?page_id, rotate, "/Rotate is not a multiple of 90, ignored");
    }

    Ok(geometry)
}
