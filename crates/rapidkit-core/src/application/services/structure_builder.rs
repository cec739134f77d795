//! Structure Builder - contained writes under one output root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    application::ports::Filesystem,
    domain::RelativePath,
    error::RapidkitResult,
};

/// What happened to a requested write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// Target existed and overwriting was not allowed.
    Skipped(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(p) | Self::Skipped(p) => p,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Filesystem operations bound to an output root.
///
/// Every path is taken relative to the root and checked with
/// [`RelativePath`], so nothing can be written outside it.
#[derive(Clone)]
pub struct StructureBuilder {
    filesystem: Arc<dyn Filesystem>,
    root: PathBuf,
}

impl StructureBuilder {
    pub fn new(filesystem: Arc<dyn Filesystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            filesystem,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filesystem(&self) -> &Arc<dyn Filesystem> {
        &self.filesystem
    }

    /// Absolute path of a contained relative path.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> RapidkitResult<PathBuf> {
        Ok(RelativePath::try_new(rel)?.under(&self.root))
    }

    /// Recursively remove the output root; no-op when it does not exist.
    pub fn clean_output(&self) -> RapidkitResult<()> {
        if self.filesystem.exists(&self.root) {
            info!(path = %self.root.display(), "Removing existing output");
            self.filesystem.remove_dir_all(&self.root)?;
        }
        Ok(())
    }

    /// Create the output root itself.
    pub fn ensure_root(&self) -> RapidkitResult<()> {
        self.filesystem.create_dir_all(&self.root)
    }

    /// Idempotent mkdir-parents.
    pub fn create_directory(&self, rel: impl AsRef<Path>) -> RapidkitResult<PathBuf> {
        let path = self.resolve(rel)?;
        self.filesystem.create_dir_all(&path)?;
        Ok(path)
    }

    /// Write `content` unless the target exists and `overwrite` is false.
    pub fn write_file(
        &self,
        rel: impl AsRef<Path>,
        content: &str,
        overwrite: bool,
    ) -> RapidkitResult<WriteOutcome> {
        let path = self.resolve(rel)?;

        if !overwrite && self.filesystem.exists(&path) {
            warn!(path = %path.display(), "File exists, leaving it untouched");
            return Ok(WriteOutcome::Skipped(path));
        }

        if let Some(parent) = path.parent() {
            self.filesystem.create_dir_all(parent)?;
        }
        self.filesystem.write_file(&path, content)?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote file");

        Ok(WriteOutcome::Written(path))
    }

    /// Current content of a contained file, `None` when absent.
    pub fn read_file(&self, rel: impl AsRef<Path>) -> RapidkitResult<Option<String>> {
        let path = self.resolve(rel)?;
        if self.filesystem.exists(&path) {
            self.filesystem.read_to_string(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn exists(&self, rel: impl AsRef<Path>) -> bool {
        self.resolve(rel)
            .map(|p| self.filesystem.exists(&p))
            .unwrap_or(false)
    }
}
