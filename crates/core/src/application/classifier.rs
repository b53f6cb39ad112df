// Post-import folder classification

use crate::application::orchestrator::constants::{
    AUXILIARY_EXTENSIONS, LOG_EXTENSION, MS_PER_MINUTE,
};
use crate::domain::{FolderClassification, SubmissionFolder};
use crate::port::{FileStat, FsError, FsInspector, TimeProvider};
use std::sync::Arc;
use tracing::debug;

/// Classifier derives the post-import signals for one folder.
///
/// All three signals come from one listing of the folder's direct children:
/// how many files were modified inside the activity lookback, how many carry
/// an allow-listed auxiliary extension, and whether the importer left a log
/// fresh enough to have come from the run that just finished.
pub struct FolderClassifier {
    fs: Arc<dyn FsInspector>,
    time_provider: Arc<dyn TimeProvider>,
    lookback_ms: i64,
    log_fresh_ms: i64,
    auxiliary_extensions: Vec<String>,
}

impl FolderClassifier {
    pub fn new(
        fs: Arc<dyn FsInspector>,
        time_provider: Arc<dyn TimeProvider>,
        lookback_minutes: u64,
        log_fresh_minutes: u64,
    ) -> Self {
        Self {
            fs,
            time_provider,
            lookback_ms: lookback_minutes as i64 * MS_PER_MINUTE,
            log_fresh_ms: log_fresh_minutes as i64 * MS_PER_MINUTE,
            auxiliary_extensions: AUXILIARY_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replace the auxiliary allow-list (defaults to [`AUXILIARY_EXTENSIONS`]).
    pub fn with_auxiliary_extensions(mut self, extensions: Vec<String>) -> Self {
        self.auxiliary_extensions = extensions;
        self
    }

    pub async fn classify(
        &self,
        folder: &SubmissionFolder,
    ) -> Result<FolderClassification, FsError> {
        let files = self.fs.list_files(folder.path()).await?;
        let now = self.time_provider.now_millis();

        let recent_files = files
            .iter()
            .filter(|f| now - f.modified_ms < self.lookback_ms)
            .count();
        let auxiliary_files = files
            .iter()
            .filter(|f| self.is_auxiliary(f))
            .count();
        let fresh_log = files
            .iter()
            .filter(|f| {
                extension_of(f) == Some(LOG_EXTENSION.to_string())
                    && now - f.modified_ms < self.log_fresh_ms
            })
            .max_by_key(|f| f.modified_ms)
            .map(|f| f.path.clone());

        let classification = FolderClassification {
            total_files: files.len(),
            recent_files,
            auxiliary_files,
            fresh_log,
        };
        debug!(
            folder = %folder,
            total = classification.total_files,
            recent = classification.recent_files,
            auxiliary = classification.auxiliary_files,
            fresh_log = classification.fresh_log.is_some(),
            "folder classified"
        );
        Ok(classification)
    }

    fn is_auxiliary(&self, file: &FileStat) -> bool {
        match extension_of(file) {
            Some(ext) => self.auxiliary_extensions.iter().any(|a| *a == ext),
            None => false,
        }
    }
}

/// Lowercased extension, so `Scan.TIF` and `scan.tif` classify alike.
fn extension_of(file: &FileStat) -> Option<String> {
    file.path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::fs_inspector::mocks::InMemoryFsInspector;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use std::path::{Path, PathBuf};

    const NOW: i64 = 1_000 * 60 * 60 * 1000;
    const MINUTE: i64 = 60_000;

    fn classifier(fs: Arc<InMemoryFsInspector>) -> FolderClassifier {
        FolderClassifier::new(fs, Arc::new(FixedTimeProvider::new(NOW)), 420, 10)
    }

    fn folder() -> SubmissionFolder {
        SubmissionFolder::new("/dropbox/alice_2024")
    }

    #[tokio::test]
    async fn test_counts_recent_and_auxiliary_files() {
        let fs = Arc::new(InMemoryFsInspector::new());
        fs.add_file("/dropbox/alice_2024/scan.tif", NOW - 500 * MINUTE, "");
        fs.add_file("/dropbox/alice_2024/moved.tif", NOW - 5 * MINUTE, "");
        fs.add_file("/dropbox/alice_2024/manifest.xlsx", NOW - 400 * MINUTE, "");

        let c = classifier(fs).classify(&folder()).await.unwrap();

        assert_eq!(c.total_files, 3);
        assert_eq!(c.recent_files, 2);
        assert_eq!(c.auxiliary_files, 1);
        assert!(c.notable_activity());
        assert!(!c.is_empty());
    }

    #[tokio::test]
    async fn test_lookback_boundary_is_strict() {
        let fs = Arc::new(InMemoryFsInspector::new());
        fs.add_file("/dropbox/alice_2024/edge.tif", NOW - 420 * MINUTE, "");
        fs.add_file("/dropbox/alice_2024/inside.tif", NOW - 419 * MINUTE, "");

        let c = classifier(fs).classify(&folder()).await.unwrap();

        assert_eq!(c.recent_files, 1, "a file aged exactly one lookback is not recent");
    }

    #[tokio::test]
    async fn test_extension_matching_ignores_case() {
        let fs = Arc::new(InMemoryFsInspector::new());
        fs.add_file("/dropbox/alice_2024/Manifest.XLSX", NOW - 30 * MINUTE, "");
        fs.add_file("/dropbox/alice_2024/noext", NOW - 30 * MINUTE, "");

        let c = classifier(fs).classify(&folder()).await.unwrap();

        assert_eq!(c.auxiliary_files, 1);
        assert!(!c.is_empty(), "extensionless files are never auxiliary");
    }

    #[tokio::test]
    async fn test_folder_of_only_auxiliary_files_is_empty() {
        let fs = Arc::new(InMemoryFsInspector::new());
        fs.add_file("/dropbox/alice_2024/manifest.xlsx", NOW - 30 * MINUTE, "");
        fs.add_file("/dropbox/alice_2024/import.log", NOW - 2 * MINUTE, "");

        let c = classifier(fs).classify(&folder()).await.unwrap();

        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn test_fresh_log_picks_newest_within_window() {
        let fs = Arc::new(InMemoryFsInspector::new());
        fs.add_file("/dropbox/alice_2024/first.log", NOW - 8 * MINUTE, "");
        fs.add_file("/dropbox/alice_2024/second.log", NOW - 2 * MINUTE, "");
        fs.add_file("/dropbox/alice_2024/ancient.log", NOW - 300 * MINUTE, "");

        let c = classifier(fs).classify(&folder()).await.unwrap();

        assert_eq!(
            c.fresh_log,
            Some(PathBuf::from("/dropbox/alice_2024/second.log"))
        );
    }

    #[tokio::test]
    async fn test_stale_log_is_not_fresh() {
        let fs = Arc::new(InMemoryFsInspector::new());
        fs.add_file("/dropbox/alice_2024/import.log", NOW - 10 * MINUTE, "");

        let c = classifier(fs).classify(&folder()).await.unwrap();

        assert_eq!(c.fresh_log, None, "freshness boundary is strict");
    }

    #[tokio::test]
    async fn test_nested_files_are_invisible() {
        let fs = Arc::new(InMemoryFsInspector::new());
        fs.add_file("/dropbox/alice_2024/sub/deep.log", NOW - MINUTE, "");
        fs.add_dir("/dropbox/alice_2024");

        let c = classifier(fs).classify(&folder()).await.unwrap();

        assert_eq!(c.total_files, 0);
        assert_eq!(c.fresh_log, None);
    }

    #[tokio::test]
    async fn test_custom_allow_list_replaces_default() {
        let fs = Arc::new(InMemoryFsInspector::new());
        fs.add_file("/dropbox/alice_2024/readme.md", NOW - 30 * MINUTE, "");

        let c = classifier(fs)
            .with_auxiliary_extensions(vec!["md".to_string()])
            .classify(&folder())
            .await
            .unwrap();

        assert_eq!(c.auxiliary_files, 1);
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn test_missing_folder_surfaces_error() {
        let fs = Arc::new(InMemoryFsInspector::new());
        let result = classifier(fs)
            .classify(&SubmissionFolder::new(Path::new("/dropbox/gone")))
            .await;
        assert!(matches!(result, Err(FsError::NotFound(_))));
    }
}
