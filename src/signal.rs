use crate::error::PicbakError;
use crate::utils::format_size;
use crate::Result;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Run state shared between the copy loop and the Ctrl-C handler.
///
/// The handler only reports; it never cleans up, so an interrupted run leaves
/// the destination partially copied.
#[derive(Clone, Debug)]
pub struct BackupContext {
    interrupt_flag: Arc<AtomicBool>,
    bytes_transferred: Arc<AtomicU64>,
    current_file: Arc<Mutex<Option<PathBuf>>>,
}

impl BackupContext {
    pub fn new() -> Self {
        Self {
            interrupt_flag: Arc::new(AtomicBool::new(false)),
            bytes_transferred: Arc::new(AtomicU64::new(0)),
            current_file: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt_flag.load(Ordering::SeqCst)
    }

    pub fn set_interrupted(&self, interrupted: bool) {
        self.interrupt_flag.store(interrupted, Ordering::SeqCst);
    }

    /// Mark `path` as the file being copied.
    pub fn begin_file(&self, path: &Path) {
        if let Ok(mut current) = self.current_file.lock() {
            *current = Some(path.to_path_buf());
        }
    }

    pub fn finish_file(&self) {
        if let Ok(mut current) = self.current_file.lock() {
            *current = None;
        }
    }

    /// Store the running byte total.
    pub fn record_progress(&self, bytes_transferred: u64) {
        self.bytes_transferred
            .store(bytes_transferred, Ordering::SeqCst);
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::SeqCst)
    }

    pub fn current_file(&self) -> Option<PathBuf> {
        self.current_file
            .lock()
            .ok()
            .and_then(|current| current.clone())
    }

    /// Line logged when the run is interrupted.
    pub fn interrupt_report(&self) -> String {
        let bytes = self.bytes_transferred();
        let mut report = format!(
            "Interrupted after {} bytes ({})",
            bytes,
            format_size(bytes)
        );
        if let Some(file) = self.current_file() {
            report.push_str(&format!(
                "; copy of '{}' may be incomplete",
                file.display()
            ));
        }
        report
    }
}

impl Default for BackupContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the Ctrl-C handler for this process.
///
/// On interrupt the handler logs how far the run got and exits with the
/// interrupted exit code. Can only be installed once per process.
pub fn install_interrupt_handler(context: BackupContext) -> Result<()> {
    ctrlc::set_handler(move || {
        context.set_interrupted(true);
        warn!("{}", context.interrupt_report());
        std::process::exit(PicbakError::Interrupted.exit_code());
    })
    .map_err(|e| {
        PicbakError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to set Ctrl-C handler: {e}"),
        ))
    })
}
