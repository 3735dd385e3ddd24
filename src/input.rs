//! Where the destination and source roots come from.
//!
//! Interactive runs prompt on stdin; static runs take fixed paths from the
//! command line or the config file. Both feed the same validation and hand a
//! [`BackupPlan`] to the orchestrator.

use crate::error::PicbakError;
use crate::utils::ensure_valid_dirs;
use crate::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

/// Line that ends source entry in interactive mode.
pub const SOURCES_DONE: &str = "done";
/// Token that confirms an interactive run.
pub const CONFIRM_TOKEN: &str = "c";

/// Validated roots for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    pub destination: PathBuf,
    pub sources: Vec<PathBuf>,
}

pub trait PathProvider {
    fn destination(&mut self) -> Result<PathBuf>;

    fn sources(&mut self) -> Result<Vec<PathBuf>>;

    /// Ask the operator to approve `plan`. Static providers approve implicitly.
    fn confirm(&mut self, plan: &BackupPlan) -> Result<bool>;
}

/// Gather and validate roots from `provider`.
///
/// Returns `Ok(None)` when the operator declined to confirm. Validation
/// failures are fatal errors; nothing has been touched on disk when they
/// are returned.
pub fn collect_plan<P: PathProvider + ?Sized>(provider: &mut P) -> Result<Option<BackupPlan>> {
    let destination = provider.destination()?;
    ensure_valid_dirs(&[&destination])?;

    let sources = provider.sources()?;
    ensure_valid_dirs(&sources)?;

    let plan = BackupPlan {
        destination,
        sources,
    };

    if !provider.confirm(&plan)? {
        warn!("Must confirm to continue");
        return Ok(None);
    }

    Ok(Some(plan))
}

/// Fixed paths, from the command line or the config file.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    destination: PathBuf,
    sources: Vec<PathBuf>,
}

impl StaticProvider {
    pub fn new(destination: PathBuf, sources: Vec<PathBuf>) -> Self {
        Self {
            destination,
            sources,
        }
    }
}

impl PathProvider for StaticProvider {
    fn destination(&mut self) -> Result<PathBuf> {
        Ok(self.destination.clone())
    }

    fn sources(&mut self) -> Result<Vec<PathBuf>> {
        Ok(self.sources.clone())
    }

    fn confirm(&mut self, _plan: &BackupPlan) -> Result<bool> {
        Ok(true)
    }
}

/// Line-oriented prompts over any reader/writer pair.
pub struct InteractiveProvider<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> InteractiveProvider<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }

    fn read_line(&mut self, what: &str) -> Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PicbakError::input(format!(
                "unexpected end of input while reading {what}"
            )));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> PathProvider for InteractiveProvider<R, W> {
    fn destination(&mut self) -> Result<PathBuf> {
        self.prompt("Enter backup destination path: ")?;
        self.read_line("the destination path").map(PathBuf::from)
    }

    fn sources(&mut self) -> Result<Vec<PathBuf>> {
        let mut sources = Vec::new();
        loop {
            self.prompt(&format!(
                "Enter a backup source path or '{SOURCES_DONE}' to finish: "
            ))?;
            let line = self.read_line("source paths")?;
            if line == SOURCES_DONE {
                break;
            }
            sources.push(PathBuf::from(line));
        }
        Ok(sources)
    }

    fn confirm(&mut self, plan: &BackupPlan) -> Result<bool> {
        writeln!(self.output, "Will backup from")?;
        for source in &plan.sources {
            writeln!(self.output, "\t{}", source.display())?;
        }
        writeln!(self.output, "To")?;
        writeln!(self.output, "\t{}", plan.destination.display())?;

        self.prompt(&format!("Enter '{CONFIRM_TOKEN}' to confirm"))?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.split_whitespace().next() == Some(CONFIRM_TOKEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn interactive(script: &str) -> InteractiveProvider<Cursor<Vec<u8>>, Vec<u8>> {
        InteractiveProvider::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_interactive_collects_plan() {
        let dir = tempdir().unwrap();
        let dst = dir.path().join("dst");
        let pics = dir.path().join("pics");
        let vids = dir.path().join("vids");
        for d in [&dst, &pics, &vids] {
            fs::create_dir_all(d).unwrap();
        }

        let script = format!(
            "{}\n{}\n{}\ndone\nc\n",
            dst.display(),
            pics.display(),
            vids.display()
        );
        let mut provider = interactive(&script);
        let plan = collect_plan(&mut provider).unwrap().unwrap();

        assert_eq!(plan.destination, dst);
        assert_eq!(plan.sources, vec![pics.clone(), vids.clone()]);

        let transcript = String::from_utf8(provider.output).unwrap();
        assert!(transcript.contains("Enter backup destination path:"));
        assert!(transcript.contains("'done' to finish"));
        assert!(transcript.contains("Will backup from"));
        assert!(transcript.contains(&format!("\t{}", pics.display())));
        assert!(transcript.contains(&format!("To\n\t{}", dst.display())));
        assert!(transcript.contains("Enter 'c' to confirm"));
    }

    #[test]
    fn test_interactive_handles_crlf() {
        let dir = tempdir().unwrap();
        let script = format!("{0}\r\n{0}\r\ndone\r\nc\r\n", dir.path().display());
        let plan = collect_plan(&mut interactive(&script)).unwrap().unwrap();
        assert_eq!(plan.destination, dir.path());
        assert_eq!(plan.sources.len(), 1);
    }

    #[test]
    fn test_interactive_declined() {
        let dir = tempdir().unwrap();
        for answer in ["n", "C", "yes", ""] {
            let script = format!("{0}\n{0}\ndone\n{answer}\n", dir.path().display());
            let result = collect_plan(&mut interactive(&script)).unwrap();
            assert!(result.is_none(), "answer {answer:?} must not confirm");
        }
    }

    #[test]
    fn test_missing_destination_is_fatal_before_sources() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        // No source lines at all: validation must fail before they are read
        let script = format!("{}\n", missing.display());

        let err = collect_plan(&mut interactive(&script)).unwrap_err();
        assert!(err.is_fatal());
        match err {
            PicbakError::DirectoryNotFound { path, .. } => assert_eq!(path, missing),
            other => panic!("Expected DirectoryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_source_is_fatal() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        fs::write(&file, "jpeg").unwrap();

        let script = format!("{}\n{}\ndone\nc\n", dir.path().display(), file.display());
        let err = collect_plan(&mut interactive(&script)).unwrap_err();
        assert!(matches!(err, PicbakError::NotADirectory { .. }));
    }

    #[test]
    fn test_end_of_input_before_sentinel() {
        let dir = tempdir().unwrap();
        let script = format!("{0}\n{0}\n", dir.path().display());
        let err = collect_plan(&mut interactive(&script)).unwrap_err();
        assert!(matches!(err, PicbakError::Input { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_static_provider_skips_confirmation() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();

        let mut provider = StaticProvider::new(dir.path().to_path_buf(), vec![src.clone()]);
        let plan = collect_plan(&mut provider).unwrap().unwrap();
        assert_eq!(plan.destination, dir.path());
        assert_eq!(plan.sources, vec![src]);
    }

    #[test]
    fn test_static_provider_validates() {
        let dir = tempdir().unwrap();
        let mut provider = StaticProvider::new(
            dir.path().to_path_buf(),
            vec![dir.path().join("missing")],
        );
        assert!(collect_plan(&mut provider).unwrap_err().is_fatal());
    }
}
