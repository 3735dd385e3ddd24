use crate::error::{FileError, PicbakError};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Check that every path exists and is a directory.
///
/// Returns the first failure; callers treat it as fatal and halt before any
/// work begins.
pub fn ensure_valid_dirs<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for path in paths {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|source| PicbakError::DirectoryNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        if !metadata.is_dir() {
            return Err(PicbakError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(())
}

/// Mirror `file`'s position under `src_root` into `dst_root`.
pub fn map_destination(
    src_root: &Path,
    file: &Path,
    dst_root: &Path,
) -> std::result::Result<PathBuf, FileError> {
    let relative = file
        .strip_prefix(src_root)
        .map_err(|_| FileError::Unmappable {
            root: src_root.to_path_buf(),
            file: file.to_path_buf(),
        })?;

    Ok(dst_root.join(relative))
}

/// Format byte size in human-readable format
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes < THRESHOLD {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    let unit = UNITS[unit_index];
    format!("{size:.1} {unit}")
}
