//! Atomic output writes.

use crate::error::WatermarkError;
use std::io::Write;
use std::path::Path;

/// Write `data` to `path` atomically.
///
/// The bytes go to a temporary file in the destination directory, which is
/// then renamed over `path`. A failure at any point leaves `path` untouched.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), WatermarkError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".tilemark-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| WatermarkError::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "Wrote output");
    Ok(())
}
