// Filesystem Inspector Port
// The capability object for every read against submission folders: listing,
// stat, log reading, canonicalization, ownership. Deployments that need a
// delegated service identity swap the adapter; orchestration logic never
// touches the filesystem directly and never depends on process-wide state
// like the working directory or effective uid.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stat record for one direct child file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub path: PathBuf,
    /// Last content modification, milliseconds since the Unix epoch.
    pub modified_ms: i64,
}

/// Inspection errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("io error on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("account lookup failed: {0}")]
    Lookup(String),
}

/// Filesystem Inspector trait
///
/// Implementations:
/// - LocalFsInspector: direct std::fs access under the invoking identity
/// - SudoFsInspector: every operation delegated through `sudo -n -u`
#[async_trait]
pub trait FsInspector: Send + Sync {
    /// Immediate child directories of `root`, sorted by path.
    async fn list_subdirs(&self, root: &Path) -> Result<Vec<PathBuf>, FsError>;

    /// Immediate child files of `dir` with modification stamps.
    /// Never descends into subdirectories.
    async fn list_files(&self, dir: &Path) -> Result<Vec<FileStat>, FsError>;

    /// Read a file (an import log, an exclusion list) to a string.
    async fn read_to_string(&self, path: &Path) -> Result<String, FsError>;

    /// Resolve symlinks and relative segments to a canonical absolute path.
    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError>;

    /// Account name owning `path`, when the platform exposes one.
    async fn owner_account(&self, path: &Path) -> Result<Option<String>, FsError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::Component;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct FileEntry {
        modified_ms: i64,
        content: String,
    }

    #[derive(Debug, Default)]
    struct Tree {
        dirs: BTreeSet<PathBuf>,
        files: BTreeMap<PathBuf, FileEntry>,
        links: BTreeMap<PathBuf, PathBuf>,
        owners: BTreeMap<PathBuf, String>,
        unreadable: BTreeSet<PathBuf>,
    }

    /// In-memory filesystem with scripted modification times.
    ///
    /// Interior mutability lets a scripted import runner consume files
    /// mid-pass through a shared `Arc`, the way the real importer mutates
    /// a real folder.
    #[derive(Default)]
    pub struct InMemoryFsInspector {
        tree: Mutex<Tree>,
    }

    /// Collapse `.` and `..` segments without touching the filesystem.
    fn normalize(path: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop();
                }
                other => out.push(other.as_os_str()),
            }
        }
        out
    }

    impl InMemoryFsInspector {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a directory (and its ancestors).
        pub fn add_dir(&self, path: impl Into<PathBuf>) {
            let path = normalize(&path.into());
            let mut tree = self.tree.lock().unwrap();
            let mut current = path.clone();
            loop {
                tree.dirs.insert(current.clone());
                match current.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => {
                        current = parent.to_path_buf();
                    }
                    _ => break,
                }
            }
        }

        /// Register a file with a fixed modification stamp; parent
        /// directories are created implicitly.
        pub fn add_file(&self, path: impl Into<PathBuf>, modified_ms: i64, content: &str) {
            let path = normalize(&path.into());
            if let Some(parent) = path.parent() {
                self.add_dir(parent.to_path_buf());
            }
            self.tree.lock().unwrap().files.insert(
                path,
                FileEntry {
                    modified_ms,
                    content: content.to_string(),
                },
            );
        }

        pub fn remove_file(&self, path: impl AsRef<Path>) {
            let path = normalize(path.as_ref());
            self.tree.lock().unwrap().files.remove(&path);
        }

        /// Update the modification stamp of an existing file.
        pub fn touch(&self, path: impl AsRef<Path>, modified_ms: i64) {
            let path = normalize(path.as_ref());
            if let Some(entry) = self.tree.lock().unwrap().files.get_mut(&path) {
                entry.modified_ms = modified_ms;
            }
        }

        /// Register `alias` as a symlink resolving to `target`.
        pub fn add_symlink(&self, alias: impl Into<PathBuf>, target: impl Into<PathBuf>) {
            let mut tree = self.tree.lock().unwrap();
            tree.links
                .insert(normalize(&alias.into()), normalize(&target.into()));
        }

        pub fn set_owner(&self, path: impl Into<PathBuf>, account: &str) {
            let path = normalize(&path.into());
            self.tree
                .lock()
                .unwrap()
                .owners
                .insert(path, account.to_string());
        }

        /// Make every operation on `path` fail with an io error.
        pub fn make_unreadable(&self, path: impl Into<PathBuf>) {
            let path = normalize(&path.into());
            self.tree.lock().unwrap().unreadable.insert(path);
        }

        fn resolve(&self, path: &Path) -> PathBuf {
            let normalized = normalize(path);
            let tree = self.tree.lock().unwrap();
            for (alias, target) in &tree.links {
                if normalized == *alias {
                    return target.clone();
                }
                if let Ok(rest) = normalized.strip_prefix(alias) {
                    return target.join(rest);
                }
            }
            normalized
        }

        fn check_readable(&self, path: &Path) -> Result<(), FsError> {
            if self.tree.lock().unwrap().unreadable.contains(path) {
                return Err(FsError::Io {
                    path: path.to_path_buf(),
                    message: "permission denied".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FsInspector for InMemoryFsInspector {
        async fn list_subdirs(&self, root: &Path) -> Result<Vec<PathBuf>, FsError> {
            let root = self.resolve(root);
            self.check_readable(&root)?;
            let tree = self.tree.lock().unwrap();
            if !tree.dirs.contains(&root) {
                return Err(FsError::NotFound(root));
            }
            Ok(tree
                .dirs
                .iter()
                .filter(|d| d.parent() == Some(root.as_path()))
                .cloned()
                .collect())
        }

        async fn list_files(&self, dir: &Path) -> Result<Vec<FileStat>, FsError> {
            let dir = self.resolve(dir);
            self.check_readable(&dir)?;
            let tree = self.tree.lock().unwrap();
            if !tree.dirs.contains(&dir) {
                return Err(FsError::NotFound(dir));
            }
            Ok(tree
                .files
                .iter()
                .filter(|(p, _)| p.parent() == Some(dir.as_path()))
                .map(|(p, entry)| FileStat {
                    path: p.clone(),
                    modified_ms: entry.modified_ms,
                })
                .collect())
        }

        async fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
            let path = self.resolve(path);
            self.check_readable(&path)?;
            let tree = self.tree.lock().unwrap();
            tree.files
                .get(&path)
                .map(|entry| entry.content.clone())
                .ok_or(FsError::NotFound(path))
        }

        async fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
            let resolved = self.resolve(path);
            let tree = self.tree.lock().unwrap();
            if tree.dirs.contains(&resolved) || tree.files.contains_key(&resolved) {
                Ok(resolved)
            } else {
                Err(FsError::NotFound(resolved))
            }
        }

        async fn owner_account(&self, path: &Path) -> Result<Option<String>, FsError> {
            let path = self.resolve(path);
            Ok(self.tree.lock().unwrap().owners.get(&path).cloned())
        }
    }

}
