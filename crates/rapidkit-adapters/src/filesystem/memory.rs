//! In-memory filesystem adapter, used for dry runs and tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use rapidkit_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{RapidkitError, RapidkitResult},
};

/// In-memory filesystem. Cloning shares the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a file's content.
    pub fn read_file(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path).cloned()
    }

    /// Seed a file, creating its parent directories.
    pub fn insert_file(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        if let Ok(mut inner) = self.inner.write() {
            let path = path.into();
            if let Some(parent) = path.parent() {
                insert_ancestors(&mut inner.directories, parent);
            }
            inner.files.insert(path, content.into());
        }
    }

    /// All files, sorted by path.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Clear all contents.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.files.clear();
            inner.directories.clear();
        }
    }

    fn write_lock(
        &self,
        path: &Path,
    ) -> RapidkitResult<std::sync::RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        self.inner.write().map_err(|_| poisoned(path))
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> RapidkitResult<()> {
        let mut inner = self.write_lock(path)?;
        insert_ancestors(&mut inner.directories, path);
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> RapidkitResult<()> {
        let mut inner = self.write_lock(path)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(ApplicationError::Filesystem {
                    path: path.to_path_buf(),
                    reason: "Parent directory does not exist".into(),
                }
                .into());
            }
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> RapidkitResult<String> {
        self.read_file(path).ok_or_else(|| {
            ApplicationError::Filesystem {
                path: path.to_path_buf(),
                reason: "Failed to read file: not found".into(),
            }
            .into()
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| {
                inner.files.contains_key(path)
                    || inner.directories.contains(path)
                    || inner.files.keys().any(|f| f.starts_with(path))
            })
            .unwrap_or(false)
    }

    fn is_dir_empty(&self, path: &Path) -> RapidkitResult<bool> {
        let inner = self.inner.read().map_err(|_| poisoned(path))?;
        let has_file = inner.files.keys().any(|f| f != path && f.starts_with(path));
        let has_dir = inner.directories.iter().any(|d| d != path && d.starts_with(path));
        Ok(!has_file && !has_dir)
    }

    fn remove_dir_all(&self, path: &Path) -> RapidkitResult<()> {
        let mut inner = self.write_lock(path)?;
        inner.directories.retain(|p| !p.starts_with(path));
        inner.files.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}

fn insert_ancestors(directories: &mut BTreeSet<PathBuf>, path: &Path) {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        directories.insert(current.clone());
    }
}

fn poisoned(path: &Path) -> RapidkitError {
    ApplicationError::Filesystem {
        path: path.to_path_buf(),
        reason: "memory filesystem lock poisoned".into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_requires_parent() {
        let fs = MemoryFilesystem::new();
        assert!(fs.write_file(Path::new("/out/a.txt"), "a").is_err());

        fs.create_dir_all(Path::new("/out")).unwrap();
        fs.write_file(Path::new("/out/a.txt"), "a").unwrap();
        assert_eq!(fs.read_file(Path::new("/out/a.txt")).as_deref(), Some("a"));
    }

    #[test]
    fn emptiness_and_removal() {
        let fs = MemoryFilesystem::new();
        let root = Path::new("/out");
        assert!(fs.is_dir_empty(root).unwrap());

        fs.insert_file("/out/src/main.py", "print()\n");
        assert!(fs.exists(Path::new("/out/src")));
        assert!(!fs.is_dir_empty(root).unwrap());

        fs.remove_dir_all(root).unwrap();
        assert!(!fs.exists(root));
        assert!(fs.list_files().is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let fs = MemoryFilesystem::new();
        let other = fs.clone();
        fs.insert_file("/a.txt", "a");
        assert_eq!(
            other.read_to_string(Path::new("/a.txt")).unwrap(),
            "a"
        );
    }
}
