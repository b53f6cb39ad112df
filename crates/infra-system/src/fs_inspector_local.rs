// Local filesystem inspector
// Direct std/tokio fs access under the invoking user. Used when no service
// account was requested on the command line.

use async_trait::async_trait;
use dropsweep_core::port::{FileStat, FsError, FsInspector};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

pub struct LocalFsInspector;

fn map_io(path: &Path, err: std::io::Error) -> FsError {
    if err.kind() == std::io::ErrorKind::NotFound {
        FsError::NotFound(path.to_path_buf())
    } else {
        FsError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

fn modified_ms(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl FsInspector for LocalFsInspector {
    async fn list_subdirs(&self, root: &Path) -> Result<Vec<PathBuf>, FsError> {
        let mut entries = tokio::fs::read_dir(root).await.map_err(|e| map_io(root, e))?;
        let mut dirs = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| map_io(root, e))? {
            // Follows symlinks, so a linked submission folder still counts.
            match tokio::fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_dir() => dirs.push(entry.path()),
                Ok(_) => {}
                Err(err) => {
                    debug!(path = %entry.path().display(), error = %err, "skipping unstatable entry");
                }
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    async fn list_files(&self, dir: &Path) -> Result<Vec<FileStat>, FsError> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| map_io(dir, e))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| map_io(dir, e))? {
            match tokio::fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_file() => files.push(FileStat {
                    path: entry.path(),
                    modified_ms: modified_ms(&meta),
                }),
                Ok(_) => {}
                Err(err) => {
                    debug!(path = %entry.path().display(), error = %err, "skipping unstatable entry");
                }
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| map_io(path, e))
    }

    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        tokio::fs::canonicalize(path)
            .await
            .map_err(|e| map_io(path, e))
    }

    async fn owner_account(&self, path: &Path) -> Result<Option<String>, FsError> {
        #[cfg(unix)]
        {
            use nix::unistd::{Uid, User};
            use std::os::unix::fs::MetadataExt;

            let metadata = tokio::fs::metadata(path).await.map_err(|e| map_io(path, e))?;
            match User::from_uid(Uid::from_raw(metadata.uid())) {
                Ok(Some(user)) => Ok(Some(user.name)),
                Ok(None) => Ok(None),
                Err(err) => Err(FsError::Lookup(err.to_string())),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = path;
            Ok(None)
        }
    }
}
