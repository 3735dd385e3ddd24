pub mod backup;
pub mod config;
pub mod copy;
pub mod error;
pub mod filter;
pub mod input;
pub mod progress;
pub mod signal;
pub mod utils;

pub use backup::{backup_paths, estimate_backup_size, BackupOptions, BackupResult};
pub use config::{default_config, dump_config, load_config, Config};
pub use copy::{copy_file, CopyOutcome};
pub use error::{FileError, PicbakError};
pub use filter::{want_to_backup, ExtensionFilter, DEFAULT_EXTENSIONS};
pub use input::{collect_plan, BackupPlan, InteractiveProvider, PathProvider, StaticProvider};
pub use progress::{MilestoneTracker, ProgressConfig, ProgressReporter};
pub use signal::{install_interrupt_handler, BackupContext};
pub use utils::{ensure_valid_dirs, format_size, map_destination};

/// Main library result type
pub type Result<T> = std::result::Result<T, PicbakError>;
