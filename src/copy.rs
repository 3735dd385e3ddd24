use crate::error::FileError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// What a single copy achieved.
///
/// `bytes` is the number of bytes written to the destination and is valid
/// even when `result` is an error; the copy may have died partway through.
#[derive(Debug)]
pub struct CopyOutcome {
    pub bytes: u64,
    pub result: Result<(), FileError>,
}

impl CopyOutcome {
    fn failed(error: FileError) -> Self {
        Self {
            bytes: 0,
            result: Err(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counts bytes that actually reached the inner writer.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Copy `src` to `dst`, creating any missing parent directories of `dst`.
///
/// An existing `dst` is truncated. Both handles are closed before returning.
pub fn copy_file(src: &Path, dst: &Path) -> CopyOutcome {
    let mut reader = match File::open(src) {
        Ok(file) => file,
        Err(source) => {
            return CopyOutcome::failed(FileError::Open {
                path: src.to_path_buf(),
                source,
            })
        }
    };

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(source) = fs::create_dir_all(parent) {
            return CopyOutcome::failed(FileError::CreateDir {
                path: parent.to_path_buf(),
                source,
            });
        }
    }

    let destination = match File::create(dst) {
        Ok(file) => file,
        Err(source) => {
            return CopyOutcome::failed(FileError::Create {
                path: dst.to_path_buf(),
                source,
            })
        }
    };

    let mut writer = CountingWriter {
        inner: destination,
        written: 0,
    };
    let result = io::copy(&mut reader, &mut writer)
        .and_then(|_| writer.flush())
        .map(|_| ())
        .map_err(|source| FileError::Stream {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            copied: writer.written,
            source,
        });

    CopyOutcome {
        bytes: writer.written,
        result,
    }
}
