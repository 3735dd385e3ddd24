use crate::copy::copy_file;
use crate::error::{FileError, PicbakError};
use crate::filter::ExtensionFilter;
use crate::progress::{ProgressConfig, ProgressReporter};
use crate::signal::BackupContext;
use crate::utils::{format_size, map_destination};
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use walkdir::WalkDir;

#[derive(Clone)]
pub struct BackupOptions {
    pub filter: ExtensionFilter,
    pub dry_run: bool,
    pub progress: ProgressConfig,
    pub context: BackupContext,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            filter: ExtensionFilter::default(),
            dry_run: false,
            progress: ProgressConfig {
                enabled: false,
                is_interactive: false,
            },
            context: BackupContext::new(),
        }
    }
}

#[derive(Debug)]
pub struct BackupResult {
    /// Bytes the size estimate found before copying started
    pub bytes_total: u64,
    /// Bytes written to the destination, including partial copies
    pub bytes_transferred: u64,
    pub files_copied: usize,
    pub failures: Vec<FileError>,
    pub duration: Duration,
    pub dry_run: bool,
}

impl BackupResult {
    pub fn new(bytes_total: u64, dry_run: bool) -> Self {
        Self {
            bytes_total,
            bytes_transferred: 0,
            files_copied: 0,
            failures: Vec::new(),
            duration: Duration::from_secs(0),
            dry_run,
        }
    }

    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }

    pub fn summary(&self) -> String {
        if self.dry_run {
            return format!(
                "Would copy {} files ({})",
                self.files_copied,
                format_size(self.bytes_total)
            );
        }

        let mut summary = format!(
            "Copied {} files ({} of {})",
            self.files_copied,
            format_size(self.bytes_transferred),
            format_size(self.bytes_total)
        );
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failures.len()));
        }
        summary
    }
}

/// A regular file under a source root that passed the extension filter.
struct EligibleFile {
    path: PathBuf,
    size: u64,
}

/// Walk `root` yielding eligible files. Walk errors are yielded rather than
/// ending the walk.
fn eligible_files<'a>(
    root: &'a Path,
    filter: &'a ExtensionFilter,
) -> impl Iterator<Item = std::result::Result<EligibleFile, FileError>> + 'a {
    WalkDir::new(root)
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    return Some(Err(FileError::Traverse {
                        path: source.path().map(Path::to_path_buf),
                        source,
                    }))
                }
            };

            // Directories, symlinks, devices, sockets and fifos are skipped
            if !entry.file_type().is_file() || !filter.wants(entry.path()) {
                return None;
            }

            match entry.metadata() {
                Ok(metadata) => Some(Ok(EligibleFile {
                    size: metadata.len(),
                    path: entry.into_path(),
                })),
                Err(source) => Some(Err(FileError::Metadata {
                    path: entry.path().to_path_buf(),
                    source,
                })),
            }
        })
}

/// Sum the sizes of every eligible file under `roots`.
///
/// Entries that can't be visited are logged and skipped.
pub fn estimate_backup_size<P: AsRef<Path>>(roots: &[P], filter: &ExtensionFilter) -> u64 {
    let mut bytes_to_transfer = 0;
    for root in roots {
        for item in eligible_files(root.as_ref(), filter) {
            match item {
                Ok(file) => bytes_to_transfer += file.size,
                Err(e) => error!("Estimating backup size: {e}"),
            }
        }
    }
    bytes_to_transfer
}

/// Copy every eligible file under `sources` into `destination`, mirroring
/// each file's path relative to its own source root.
///
/// Fails only when there is nothing to copy. Per-file failures are logged,
/// collected in the result, and do not stop the run.
pub fn backup_paths<P: AsRef<Path>>(
    sources: &[P],
    destination: &Path,
    options: &BackupOptions,
) -> Result<BackupResult> {
    let start_time = Instant::now();

    info!("Calculating backup size");
    let bytes_total = estimate_backup_size(sources, &options.filter);
    if bytes_total == 0 {
        return Err(PicbakError::NothingToBackUp);
    }
    info!(
        "Backup size: {} bytes ({})",
        bytes_total,
        format_size(bytes_total)
    );

    let mut result = BackupResult::new(bytes_total, options.dry_run);

    if options.dry_run {
        list_planned_copies(sources, destination, options, &mut result);
    } else {
        copy_eligible_files(sources, destination, options, &mut result);
        info!("Done backing up files");
    }

    result.duration = start_time.elapsed();
    Ok(result)
}

fn copy_eligible_files<P: AsRef<Path>>(
    sources: &[P],
    destination: &Path,
    options: &BackupOptions,
    result: &mut BackupResult,
) {
    info!("Copying files");
    let mut progress = ProgressReporter::new(result.bytes_total, &options.progress);

    for root in sources {
        let root = root.as_ref();
        for item in eligible_files(root, &options.filter) {
            let file = match item {
                Ok(file) => file,
                Err(e) => {
                    error!("{e}");
                    result.failures.push(e);
                    continue;
                }
            };

            let dst_path = match map_destination(root, &file.path, destination) {
                Ok(path) => path,
                Err(e) => {
                    error!("{e}");
                    result.failures.push(e);
                    continue;
                }
            };

            debug!(
                "Will copy '{}' to '{}'",
                file.path.display(),
                dst_path.display()
            );
            options.context.begin_file(&file.path);

            let outcome = copy_file(&file.path, &dst_path);
            result.bytes_transferred += outcome.bytes;
            options.context.record_progress(result.bytes_transferred);
            match outcome.result {
                Ok(()) => result.files_copied += 1,
                Err(e) => {
                    error!("{e}");
                    result.failures.push(e);
                }
            }

            progress.update(result.bytes_transferred, result.bytes_total, &file.path);
        }
    }

    options.context.finish_file();
    progress.finish();
}

fn list_planned_copies<P: AsRef<Path>>(
    sources: &[P],
    destination: &Path,
    options: &BackupOptions,
    result: &mut BackupResult,
) {
    for root in sources {
        let root = root.as_ref();
        for item in eligible_files(root, &options.filter) {
            let mapped = item.and_then(|file| {
                map_destination(root, &file.path, destination).map(|dst| (file, dst))
            });
            match mapped {
                Ok((file, dst_path)) => {
                    info!(
                        "Would copy '{}' to '{}' ({})",
                        file.path.display(),
                        dst_path.display(),
                        format_size(file.size)
                    );
                    result.files_copied += 1;
                }
                Err(e) => {
                    error!("{e}");
                    result.failures.push(e);
                }
            }
        }
    }
}
