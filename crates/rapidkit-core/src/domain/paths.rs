use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::domain::error::DomainError;

/// A filesystem path guaranteed to be **relative** and **contained**.
///
/// Every path a manifest declares (template sources, vendor roots, variant
/// outputs, snippet targets) goes through this type before it touches disk.
/// Construction normalizes `.` segments and resolves `..` lexically; a path
/// that would climb above its root is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    /// Fallible constructor.
    ///
    /// # Errors
    /// - [`DomainError::AbsolutePathNotAllowed`] for absolute or prefixed paths
    /// - [`DomainError::PathEscapesRoot`] when `..` climbs above the root
    pub fn try_new(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let mut normalized = PathBuf::new();
        let mut depth = 0usize;

        for component in path.components() {
            match component {
                Component::Prefix(_) | Component::RootDir => {
                    return Err(DomainError::AbsolutePathNotAllowed { path: display });
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(DomainError::PathEscapesRoot { path: display });
                    }
                    normalized.pop();
                    depth -= 1;
                }
                Component::Normal(segment) => {
                    normalized.push(segment);
                    depth += 1;
                }
            }
        }

        if depth == 0 {
            return Err(DomainError::PathEscapesRoot { path: display });
        }

        Ok(Self(normalized))
    }

    /// Join a segment, maintaining the containment invariant.
    pub fn join(&self, segment: impl AsRef<Path>) -> Result<Self, DomainError> {
        Self::try_new(self.0.join(segment))
    }

    /// Resolve this path under `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Forward-slash rendering, stable across platforms.
    pub fn to_slash(&self) -> String {
        self.0
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for RelativePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_slash())
    }
}

/// Join an optional base (e.g. a vendor root) with a relative file path.
///
/// An empty base means "the output root itself".
pub fn join_contained(base: &str, relative: &str) -> Result<RelativePath, DomainError> {
    let base = base.trim();
    if base.is_empty() || base == "." {
        RelativePath::try_new(relative)
    } else {
        // Validate the base on its own so "a/../.." style roots are reported
        // against the root, not the joined path.
        RelativePath::try_new(base)?.join(relative)
    }
}
