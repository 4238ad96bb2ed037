//! Font resolution for watermark rendering.
//!
//! Fonts are resolved explicitly from a [`FontSource`] handed down from the
//! configuration; there is no implicit global font. A preferred font that
//! cannot be found or parsed is a recovered condition: it is logged and the
//! embedded DejaVu Sans font is used instead, so resolution never fails.

use ab_glyph::FontArc;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Embedded fallback font (DejaVu Sans, Bitstream Vera license).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

static EMBEDDED_FONT: OnceLock<FontArc> = OnceLock::new();

/// Directories searched when a font is requested by file name.
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// Font file name looked up by default.
pub const DEFAULT_FONT_NAME: &str = "DejaVuSans.ttf";

/// Maximum directory depth walked below each system font directory.
const MAX_SEARCH_DEPTH: usize = 4;

/// Where the preferred font should come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontSource {
    /// Explicit font file path; wins over `name`.
    pub path: Option<PathBuf>,
    /// Font file name (e.g. "DejaVuSans.ttf") looked up in system font dirs.
    pub name: Option<String>,
}

impl FontSource {
    /// Use only the embedded font.
    pub fn embedded() -> Self {
        Self::default()
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            name: None,
        }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            path: None,
            name: Some(name.into()),
        }
    }
}

/// Reasons the preferred font was not used. Never surfaced to callers.
#[derive(Error, Debug)]
pub enum FontLoadError {
    #[error("font '{name}' not found in system font directories")]
    NotFound { name: String },

    #[error("cannot read font file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("font file {} is not a valid TrueType/OpenType font", path.display())]
    Invalid { path: PathBuf },
}

/// Where a resolved font came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontOrigin {
    File(PathBuf),
    Embedded,
}

/// A resolved, ready-to-use font.
#[derive(Clone)]
pub struct FontHandle {
    font: FontArc,
    origin: FontOrigin,
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("origin", &self.origin)
            .finish()
    }
}

impl FontHandle {
    /// The embedded fallback font.
    pub fn embedded() -> Self {
        let font = EMBEDDED_FONT.get_or_init(|| {
            FontArc::try_from_slice(EMBEDDED_FONT_DATA)
                .expect("Failed to load embedded font - this is a bug")
        });

        Self {
            font: font.clone(),
            origin: FontOrigin::Embedded,
        }
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn origin(&self) -> &FontOrigin {
        &self.origin
    }

    pub fn is_embedded(&self) -> bool {
        self.origin == FontOrigin::Embedded
    }
}

/// Resolve a font source, falling back to the embedded font.
pub fn resolve_font(source: &FontSource) -> FontHandle {
    match load_preferred(source) {
        Ok(Some(handle)) => {
            tracing::debug!(origin = ?handle.origin, "Using preferred font");
            handle
        }
        Ok(None) => FontHandle::embedded(),
        Err(e) => {
            tracing::warn!(error = %e, "Preferred font unavailable, using embedded font");
            FontHandle::embedded()
        }
    }
}

/// Look up the preferred font. `Ok(None)` means no preference was given.
pub fn load_preferred(source: &FontSource) -> Result<Option<FontHandle>, FontLoadError> {
    let path = match (&source.path, &source.name) {
        (Some(path), _) => path.clone(),
        (None, Some(name)) => find_system_font(name).ok_or_else(|| FontLoadError::NotFound {
            name: name.clone(),
        })?,
        (None, None) => return Ok(None),
    };

    load_font_file(&path).map(Some)
}

fn load_font_file(path: &Path) -> Result<FontHandle, FontLoadError> {
    let data = std::fs::read(path).map_err(|source| FontLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let font = FontArc::try_from_vec(data).map_err(|_| FontLoadError::Invalid {
        path: path.to_path_buf(),
    })?;

    Ok(FontHandle {
        font,
        origin: FontOrigin::File(path.to_path_buf()),
    })
}

/// Find a font file by name: as given, then below the system font dirs.
fn find_system_font(name: &str) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }

    SYSTEM_FONT_DIRS
        .iter()
        .find_map(|dir| search_dir(Path::new(dir), name, MAX_SEARCH_DEPTH))
}

fn search_dir(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path
            .file_name()
            .and_then(|f| f.to_str())
            .is_some_and(|f| f.eq_ignore_ascii_case(name))
        {
            return Some(path);
        }
    }

    if depth == 0 {
        return None;
    }

    // Stable order so lookups are reproducible across runs
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| search_dir(sub, name, depth - 1))
}
