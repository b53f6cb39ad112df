// Candidate scanning - finds submission folders that have gone quiet

use crate::application::orchestrator::constants::MS_PER_MINUTE;
use crate::domain::SubmissionFolder;
use crate::port::{FsError, FsInspector, TimeProvider};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// One scan over the target root.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Folders with no direct child modified inside the idle window,
    /// in path order.
    pub idle: Vec<SubmissionFolder>,
    /// Folders still receiving uploads.
    pub busy: usize,
    /// Folders whose listing failed and were skipped.
    pub errors: usize,
}

/// Scanner determines which submission folders are ready for import.
///
/// Only direct children of the target root are considered, and idleness is
/// judged from direct child files only. A recent file buried in a
/// subdirectory does not keep a folder busy; the importer itself walks the
/// tree.
pub struct CandidateScanner {
    fs: Arc<dyn FsInspector>,
    time_provider: Arc<dyn TimeProvider>,
    idle_window_ms: i64,
}

impl CandidateScanner {
    pub fn new(
        fs: Arc<dyn FsInspector>,
        time_provider: Arc<dyn TimeProvider>,
        idle_minutes: u64,
    ) -> Self {
        Self {
            fs,
            time_provider,
            idle_window_ms: idle_minutes as i64 * MS_PER_MINUTE,
        }
    }

    /// Scan `root` for idle folders.
    ///
    /// Fails only when the root itself cannot be listed; a listing failure
    /// inside one candidate is logged and counted, and the scan goes on.
    pub async fn scan(&self, root: &Path) -> Result<ScanReport, FsError> {
        let subdirs = self.fs.list_subdirs(root).await?;
        let now = self.time_provider.now_millis();

        let mut report = ScanReport::default();
        for path in subdirs {
            let folder = SubmissionFolder::new(path);
            match self.is_idle(&folder, now).await {
                Ok(true) => {
                    debug!(folder = %folder, "folder is idle");
                    report.idle.push(folder);
                }
                Ok(false) => {
                    debug!(folder = %folder, "folder still receiving uploads");
                    report.busy += 1;
                }
                Err(err) => {
                    warn!(folder = %folder, error = %err, "skipping unlistable folder");
                    report.errors += 1;
                }
            }
        }
        Ok(report)
    }

    /// A folder is idle when no direct child file was modified within the
    /// idle window. No files at all counts as idle.
    async fn is_idle(&self, folder: &SubmissionFolder, now: i64) -> Result<bool, FsError> {
        let files = self.fs.list_files(folder.path()).await?;
        Ok(files
            .iter()
            .all(|file| now - file.modified_ms >= self.idle_window_ms))
    }
}
