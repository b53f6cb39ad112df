// Classification and Pass Outcome Models

use std::path::PathBuf;

use serde::Serialize;

/// Post-import signals for one folder, derived from its direct children
/// only (never recursive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderClassification {
    /// Direct child files, any kind.
    pub total_files: usize,
    /// Files modified within the activity lookback window.
    pub recent_files: usize,
    /// Files whose extension is on the auxiliary allow-list.
    pub auxiliary_files: usize,
    /// Newest `.log` file modified within the freshness window, if any.
    pub fresh_log: Option<PathBuf>,
}

impl FolderClassification {
    /// Notable activity gates notification. Boundary is strictly more than
    /// one recently-modified file: a lone touched file (typically just the
    /// importer's own log) is treated as a no-op run.
    pub fn notable_activity(&self) -> bool {
        self.recent_files > 1
    }

    /// Fully imported: nothing remains except allow-listed bookkeeping
    /// files. A folder with no files at all counts as empty.
    pub fn is_empty(&self) -> bool {
        self.total_files == self.auxiliary_files
    }
}

/// Counters for one orchestrator pass. Logged as the pass's final record;
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Stale folders discovered by the scanner, before exclusion filtering.
    pub candidates: usize,
    /// Candidates dropped by the exclusion list.
    pub excluded: usize,
    /// Import invocations that ran to an exit status.
    pub imports_run: usize,
    /// Import invocations that exited non-zero (still classified).
    pub imports_nonzero: usize,
    /// Import invocations that failed outright (spawn failure, timeout).
    pub import_errors: usize,
    /// Folders that classified as fully imported.
    pub emptied: usize,
    /// Recipient deliveries that succeeded.
    pub notifications_sent: usize,
    /// Recipients abandoned after the retry budget was exhausted.
    pub notifications_failed: usize,
    /// Folders skipped by classification or log-reading failures.
    pub folder_errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(total: usize, recent: usize, auxiliary: usize) -> FolderClassification {
        FolderClassification {
            total_files: total,
            recent_files: recent,
            auxiliary_files: auxiliary,
            fresh_log: None,
        }
    }

    #[test]
    fn activity_boundary_is_strictly_more_than_one() {
        assert!(!classification(5, 0, 0).notable_activity());
        assert!(!classification(5, 1, 0).notable_activity());
        assert!(classification(5, 2, 0).notable_activity());
    }

    #[test]
    fn folder_is_empty_only_when_every_file_is_auxiliary() {
        assert!(classification(2, 0, 2).is_empty());
        assert!(!classification(3, 0, 2).is_empty());
    }

    #[test]
    fn folder_with_no_files_is_trivially_empty() {
        assert!(classification(0, 0, 0).is_empty());
    }
}
