// Delegated filesystem inspector
// Every operation is a child process run under the service account through
// sudo; nothing reads the filesystem in-process. Requires GNU userland
// (find -printf, readlink -e, stat -c).

use crate::identity::ServiceIdentity;
use async_trait::async_trait;
use dropsweep_core::port::{FileStat, FsError, FsInspector};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub struct SudoFsInspector {
    identity: ServiceIdentity,
}

impl SudoFsInspector {
    pub fn new(identity: ServiceIdentity) -> Self {
        Self { identity }
    }

    async fn run(
        &self,
        program: &str,
        args: Vec<String>,
        operand: &Path,
    ) -> Result<std::process::Output, FsError> {
        let (program, args) = self.identity.wrap(program, &args);
        Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| FsError::Io {
                path: operand.to_path_buf(),
                message: format!("failed to run {program}: {err}"),
            })
    }

    async fn run_checked(
        &self,
        program: &str,
        args: Vec<String>,
        operand: &Path,
    ) -> Result<Vec<u8>, FsError> {
        let output = self.run(program, args, operand).await?;
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such file or directory") {
            return Err(FsError::NotFound(operand.to_path_buf()));
        }
        Err(FsError::Io {
            path: operand.to_path_buf(),
            message: format!("{program} exited with {}: {}", output.status, stderr.trim()),
        })
    }
}

#[async_trait]
impl FsInspector for SudoFsInspector {
    async fn list_subdirs(&self, root: &Path) -> Result<Vec<PathBuf>, FsError> {
        let args = vec![
            root.display().to_string(),
            "-mindepth".to_string(),
            "1".to_string(),
            "-maxdepth".to_string(),
            "1".to_string(),
            "-type".to_string(),
            "d".to_string(),
            "-print0".to_string(),
        ];
        let stdout = self.run_checked("find", args, root).await?;
        let mut dirs = parse_nul_paths(&stdout);
        dirs.sort();
        Ok(dirs)
    }

    async fn list_files(&self, dir: &Path) -> Result<Vec<FileStat>, FsError> {
        let args = vec![
            dir.display().to_string(),
            "-mindepth".to_string(),
            "1".to_string(),
            "-maxdepth".to_string(),
            "1".to_string(),
            "-type".to_string(),
            "f".to_string(),
            "-printf".to_string(),
            "%T@\\t%p\\0".to_string(),
        ];
        let stdout = self.run_checked("find", args, dir).await?;
        let mut files = parse_find_stamps(&stdout);
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        let stdout = self
            .run_checked("cat", vec![path.display().to_string()], path)
            .await?;
        String::from_utf8(stdout).map_err(|err| FsError::Io {
            path: path.to_path_buf(),
            message: format!("not valid UTF-8: {err}"),
        })
    }

    async fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        let args = vec!["-e".to_string(), path.display().to_string()];
        let output = self.run("readlink", args, path).await?;
        // readlink -e exits non-zero, usually silently, when the path does
        // not fully resolve.
        if !output.status.success() {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        let resolved = String::from_utf8_lossy(&output.stdout);
        Ok(PathBuf::from(resolved.trim_end_matches('\n')))
    }

    async fn owner_account(&self, path: &Path) -> Result<Option<String>, FsError> {
        let args = vec![
            "-c".to_string(),
            "%U".to_string(),
            path.display().to_string(),
        ];
        let stdout = self.run_checked("stat", args, path).await?;
        let name = String::from_utf8_lossy(&stdout).trim().to_string();
        // stat prints UNKNOWN for uids with no passwd entry.
        if name.is_empty() || name == "UNKNOWN" {
            Ok(None)
        } else {
            Ok(Some(name))
        }
    }
}

/// Split NUL-separated `find -print0` output into paths.
fn parse_nul_paths(stdout: &[u8]) -> Vec<PathBuf> {
    String::from_utf8_lossy(stdout)
        .split('\0')
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Parse NUL-separated `%T@\t%p` records into stats. `%T@` is seconds with
/// a fractional part; stamps are kept at millisecond precision. Malformed
/// records are dropped.
fn parse_find_stamps(stdout: &[u8]) -> Vec<FileStat> {
    String::from_utf8_lossy(stdout)
        .split('\0')
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let (stamp, path) = entry.split_once('\t')?;
            let seconds: f64 = stamp.parse().ok()?;
            Some(FileStat {
                path: PathBuf::from(path),
                modified_ms: (seconds * 1000.0).round() as i64,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nul_paths_drops_empty_trailer() {
        let parsed = parse_nul_paths(b"/data/a\0/data/b\0");
        assert_eq!(parsed, vec![PathBuf::from("/data/a"), PathBuf::from("/data/b")]);
    }

    #[test]
    fn test_parse_find_stamps_keeps_millisecond_precision() {
        let parsed = parse_find_stamps(b"1724572800.1239999\t/data/a.tif\0");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].path, PathBuf::from("/data/a.tif"));
        assert_eq!(parsed[0].modified_ms, 1_724_572_800_124);
    }

    #[test]
    fn test_parse_find_stamps_drops_malformed_records() {
        let parsed = parse_find_stamps(b"not-a-number\t/data/a\0/missing-tab\01000.5\t/data/b\0");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].path, PathBuf::from("/data/b"));
        assert_eq!(parsed[0].modified_ms, 1_000_500);
    }

    #[cfg(target_os = "linux")]
    mod exec {
        use super::*;

        fn inspector() -> SudoFsInspector {
            SudoFsInspector::new(ServiceIdentity::current())
        }

        #[tokio::test]
        async fn test_listings_against_real_tree() {
            let tmp = tempfile::tempdir().unwrap();
            std::fs::create_dir(tmp.path().join("alice_a")).unwrap();
            std::fs::write(tmp.path().join("alice_a/scan.tif"), "img").unwrap();
            std::fs::write(tmp.path().join("stray.txt"), "x").unwrap();

            let dirs = inspector().list_subdirs(tmp.path()).await.unwrap();
            assert_eq!(dirs, vec![tmp.path().join("alice_a")]);

            let files = inspector()
                .list_files(&tmp.path().join("alice_a"))
                .await
                .unwrap();
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].path, tmp.path().join("alice_a/scan.tif"));
            let now_ms = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_millis() as i64;
            assert!((now_ms - files[0].modified_ms).abs() < 60_000);
        }

        #[tokio::test]
        async fn test_read_and_canonicalize() {
            let tmp = tempfile::tempdir().unwrap();
            let target = tmp.path().join("target");
            std::fs::create_dir(&target).unwrap();
            std::fs::write(target.join("import.log"), "imported 3 files\n").unwrap();
            let link = tmp.path().join("link");
            std::os::unix::fs::symlink(&target, &link).unwrap();

            let contents = inspector()
                .read_to_string(&target.join("import.log"))
                .await
                .unwrap();
            assert_eq!(contents, "imported 3 files\n");

            let canonical = inspector().canonicalize(&link).await.unwrap();
            assert_eq!(canonical, std::fs::canonicalize(&target).unwrap());
        }

        #[tokio::test]
        async fn test_missing_paths_map_to_not_found() {
            let tmp = tempfile::tempdir().unwrap();
            let gone = tmp.path().join("gone");

            assert!(matches!(
                inspector().read_to_string(&gone).await,
                Err(FsError::NotFound(_))
            ));
            assert!(matches!(
                inspector().canonicalize(&gone).await,
                Err(FsError::NotFound(_))
            ));
        }

        #[tokio::test]
        async fn test_owner_of_temp_dir_resolves() {
            let tmp = tempfile::tempdir().unwrap();
            let owner = inspector().owner_account(tmp.path()).await.unwrap();
            assert!(owner.is_some());
        }
    }
}
