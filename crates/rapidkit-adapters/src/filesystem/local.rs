//! Local filesystem adapter using std::fs.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rapidkit_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{RapidkitError, RapidkitResult},
};
use tracing::trace;

/// Production filesystem implementation using `std::fs`.
///
/// Writes go to a sibling temp file that is synced and renamed over the
/// target, so a crash never leaves a half-written file behind.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> RapidkitResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &str) -> RapidkitResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }

        let temp = temp_path(path);
        let result = (|| -> io::Result<()> {
            let mut file = std::fs::File::create(&temp)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&temp, path)
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp);
            return Err(map_io_error(path, e, "write file"));
        }
        trace!(path = %path.display(), bytes = content.len(), "File written");
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> RapidkitResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir_empty(&self, path: &Path) -> RapidkitResult<bool> {
        match std::fs::read_dir(path) {
            Ok(mut entries) => Ok(entries.next().is_none()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(map_io_error(path, e, "list directory")),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> RapidkitResult<()> {
        std::fs::remove_dir_all(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.rapidkit.tmp"))
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> RapidkitError {
    ApplicationError::Filesystem {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}
