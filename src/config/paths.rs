//! Working directory layout and idempotent directory provisioning.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the directory holding every generated file.
const TEMP_DIR_NAME: &str = "tmp";
/// Name of the log directory inside the temp directory.
const LOGS_DIR_NAME: &str = "logs";

/// Filesystem locations derived from the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    working_dir: PathBuf,
}

impl Paths {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Directory for databases, logs and other generated files.
    pub fn temp_dir(&self) -> PathBuf {
        self.working_dir.join(TEMP_DIR_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.temp_dir().join(LOGS_DIR_NAME)
    }

    /// Ensures the temp directory exists.
    pub fn ensure_temp_dir(&self) -> io::Result<PathBuf> {
        let dir = self.temp_dir();
        ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Ensures the log directory (and its temp directory parent) exists.
    pub fn ensure_logs_dir(&self) -> io::Result<PathBuf> {
        self.ensure_temp_dir()?;
        let dir = self.logs_dir();
        ensure_dir(&dir)?;
        Ok(dir)
    }
}

/// Creates a single directory.
///
/// A directory that already exists counts as success, so concurrent
/// workers may race on the same path. Any other failure is returned,
/// including a missing parent or a regular file in the way.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}
