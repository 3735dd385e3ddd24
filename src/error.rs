use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Run-level errors. Anything in here stops the current run.
#[derive(Debug, Error)]
pub enum PicbakError {
    #[error("Can't stat '{}': {source}", .path.display())]
    DirectoryNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Expected directory for path '{}'", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("0 bytes to backup")]
    NothingToBackUp,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input error: {message}")]
    Input { message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl PicbakError {
    /// Create a configuration error with a custom message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an input error with a custom message
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Startup validation failures. The process must halt on these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PicbakError::DirectoryNotFound { .. } | PicbakError::NotADirectory { .. }
        )
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PicbakError::Interrupted => 130,
            PicbakError::DirectoryNotFound { .. }
            | PicbakError::NotADirectory { .. }
            | PicbakError::Config { .. }
            | PicbakError::Input { .. } => 2,
            _ => 1,
        }
    }

    /// Provide helpful suggestions for resolving the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            PicbakError::DirectoryNotFound { .. } => vec![
                "Check the path for typos".to_string(),
                "Create the destination directory before running".to_string(),
            ],
            PicbakError::NotADirectory { .. } => {
                vec!["Source and destination roots must be directories".to_string()]
            }
            PicbakError::NothingToBackUp => vec![
                "Check that the source roots contain pictures or videos".to_string(),
                "Enable case_insensitive_extensions to match names like IMG_0001.JPG".to_string(),
                "Add formats with extra_extensions in the config file".to_string(),
            ],
            _ => vec![],
        }
    }
}

/// Per-file errors. These are logged and the run moves on to the next entry.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Error visiting path '{}': {source}", display_opt(.path))]
    Traverse {
        path: Option<PathBuf>,
        #[source]
        source: walkdir::Error,
    },

    #[error("Can't stat '{}': {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Can't express '{}' relative to '{}'", .file.display(), .root.display())]
    Unmappable { root: PathBuf, file: PathBuf },

    #[error("Can't open '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can't create directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can't create '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Copy '{}' -> '{}' failed after {copied} bytes: {source}", .from.display(), .to.display())]
    Stream {
        from: PathBuf,
        to: PathBuf,
        copied: u64,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// The path this failure is about, when one is known
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            FileError::Traverse { path, .. } => path.as_deref(),
            FileError::Metadata { path, .. }
            | FileError::Open { path, .. }
            | FileError::CreateDir { path, .. }
            | FileError::Create { path, .. } => Some(path),
            FileError::Unmappable { file, .. } => Some(file),
            FileError::Stream { from, .. } => Some(from),
        }
    }
}

fn display_opt(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}
