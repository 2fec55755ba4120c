//! Log file targets.
//!
//! Paths are compared in absolute form, so `./app.log` and the same file
//! named through its full path are one target. A missing file is created
//! (truncated) first, then every write appends.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// An open, append-mode log file owned by exactly one logger.
#[derive(Debug)]
pub struct LogFile {
    /// Absolute path of the open file
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Resolve `path` to its absolute form and open it for appending,
    /// creating it first if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = resolve_log_path(path.as_ref())?;
        Self::open_resolved(path)
    }

    pub(crate) fn open_resolved(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line and flush it to the OS.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.file.write_all(line.as_bytes())?;
        self.file.flush()
    }
}

/// Absolute path for `path`, creating an empty file when it does not exist.
pub fn resolve_log_path(path: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            File::create(path)?;
            fs::canonicalize(path)
        }
        Err(e) => Err(e),
    }
}
