use std::path::Path;

/// Picture and video formats worth backing up, without the leading dot.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "tiff", "avi", "mpg", "mpeg", "m1v", "mp2", "mpe", "m3u",
    "ivf", "mov", "mp4", "m4v", "mp4v", "3g2", "3gp2", "3gp", "3gpp", "m2ts",
];

/// Decides whether a path names a file worth backing up.
///
/// Matching is case-sensitive unless `case_insensitive` is set, so by default
/// `IMG_0001.JPG` is not picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
    case_insensitive: bool,
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            case_insensitive: false,
        }
    }
}

impl ExtensionFilter {
    pub fn new(extra: &[String], case_insensitive: bool) -> Self {
        let mut filter = Self {
            case_insensitive,
            ..Self::default()
        };
        for ext in extra {
            let ext = ext.trim().trim_start_matches('.');
            if !ext.is_empty() && !filter.extensions.iter().any(|e| e == ext) {
                filter.extensions.push(ext.to_string());
            }
        }
        filter
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// True iff the extension of the final path segment is whitelisted.
    pub fn wants(&self, path: &Path) -> bool {
        let Some(ext) = file_extension(path) else {
            return false;
        };
        if ext.is_empty() {
            return false;
        }

        if self.case_insensitive {
            self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
        } else {
            self.extensions.iter().any(|e| *e == ext)
        }
    }
}

/// Whether `path` should be backed up under the default, case-sensitive whitelist.
pub fn want_to_backup(path: &Path) -> bool {
    file_extension(path)
        .map(|ext| DEFAULT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Everything after the last `.` of the final segment. Unlike
/// `Path::extension`, a leading dot counts, so `.png` yields `png`.
fn file_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    name.rfind('.').map(|dot| name[dot + 1..].to_string())
}
