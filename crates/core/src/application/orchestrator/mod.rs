// Pass Orchestrator - one sweep over the target root
//
// Order per folder: exclusion check, import, classification, notification.
// Failures are contained at the widest sensible scope: a broken folder
// never stops the pass, a failed delivery never rolls back an import.

pub mod constants;

use crate::application::classifier::FolderClassifier;
use crate::application::exclusions::ExclusionLoader;
use crate::application::notifier::Notifier;
use crate::application::scanner::{CandidateScanner, ScanReport};
use crate::domain::{
    compose_body, subject_for_folder, ExclusionSet, NotificationJob, PassSummary, SubmissionFolder,
};
use crate::error::{AppError, Result};
use crate::port::{FsInspector, ImportRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Inputs for one pass, resolved by the command line.
#[derive(Debug, Clone)]
pub struct PassRequest {
    pub root: PathBuf,
    pub exclusion_file: Option<PathBuf>,
    /// Passthrough arguments appended to every import invocation.
    pub extra_args: Vec<String>,
}

/// Orchestrator walks idle submission folders through import and
/// notification.
pub struct Orchestrator {
    fs: Arc<dyn FsInspector>,
    scanner: CandidateScanner,
    exclusions: ExclusionLoader,
    classifier: FolderClassifier,
    importer: Arc<dyn ImportRunner>,
    notifier: Notifier,
}

impl Orchestrator {
    pub fn new(
        fs: Arc<dyn FsInspector>,
        scanner: CandidateScanner,
        exclusions: ExclusionLoader,
        classifier: FolderClassifier,
        importer: Arc<dyn ImportRunner>,
        notifier: Notifier,
    ) -> Self {
        Self {
            fs,
            scanner,
            exclusions,
            classifier,
            importer,
            notifier,
        }
    }

    /// Run one pass: scan, filter, then import and notify folder by folder.
    ///
    /// Only an unreadable exclusion list aborts the pass. The caller
    /// validates the target root before the pass starts; a root that
    /// vanishes afterwards just empties the scan. Everything below that is
    /// logged, counted and contained to its folder.
    pub async fn run_pass(&self, request: &PassRequest) -> Result<PassSummary> {
        info!(root = %request.root.display(), "Starting pass");

        let exclusions = self
            .exclusions
            .load(request.exclusion_file.as_deref())
            .await
            .map_err(|err| AppError::Config(format!("exclusion list: {err}")))?;

        let scan = match self.scanner.scan(&request.root).await {
            Ok(scan) => scan,
            Err(err) => {
                warn!(root = %request.root.display(), error = %err, "Scan failed, nothing to process");
                ScanReport::default()
            }
        };
        let mut summary = PassSummary {
            folder_errors: scan.errors,
            ..PassSummary::default()
        };

        for folder in scan.idle {
            summary.candidates += 1;

            if self.is_excluded(&folder, &exclusions).await {
                info!(folder = %folder, "Folder excluded, skipping");
                summary.excluded += 1;
                continue;
            }

            info!(folder = %folder, "Processing folder");
            if let Err(err) = self
                .process_folder(&folder, &request.extra_args, &mut summary)
                .await
            {
                error!(folder = %folder, error = %err, "Folder processing failed");
                summary.folder_errors += 1;
            }
        }

        info!(
            candidates = summary.candidates,
            excluded = summary.excluded,
            imports_run = summary.imports_run,
            notifications_sent = summary.notifications_sent,
            folder_errors = summary.folder_errors,
            "Pass complete"
        );
        Ok(summary)
    }

    /// Membership is tested on the canonical path, so the candidate matches
    /// an exclusion entry however either side was spelled. A folder whose
    /// canonicalization fails is kept; the exclusion list only ever
    /// subtracts work.
    async fn is_excluded(&self, folder: &SubmissionFolder, exclusions: &ExclusionSet) -> bool {
        if exclusions.is_empty() {
            return false;
        }
        let canonical = match self.fs.canonicalize(folder.path()).await {
            Ok(path) => path,
            Err(err) => {
                warn!(folder = %folder, error = %err, "Canonicalization failed");
                folder.path().to_path_buf()
            }
        };
        exclusions.contains(&canonical)
    }

    async fn process_folder(
        &self,
        folder: &SubmissionFolder,
        extra_args: &[String],
        summary: &mut PassSummary,
    ) -> Result<()> {
        match self.importer.run(folder, extra_args).await {
            Ok(run) => {
                summary.imports_run += 1;
                if run.succeeded() {
                    info!(folder = %folder, duration_ms = run.duration_ms, "Import finished");
                } else {
                    summary.imports_nonzero += 1;
                    warn!(
                        folder = %folder,
                        exit_code = ?run.exit_code,
                        stderr = %run.stderr.trim(),
                        "Import exited non-zero"
                    );
                }
            }
            Err(err) => {
                // The importer never started; classification still runs so
                // the pass record stays complete. Without a fresh log no
                // mail can go out for this folder.
                summary.import_errors += 1;
                error!(folder = %folder, error = %err, "Import invocation failed");
            }
        }

        let classification = self.classifier.classify(folder).await?;
        if classification.is_empty() {
            summary.emptied += 1;
            info!(folder = %folder, "Folder fully imported");
        }

        if !classification.notable_activity() {
            info!(
                folder = %folder,
                recent_files = classification.recent_files,
                "No notable activity, not notifying"
            );
            return Ok(());
        }
        let Some(log_path) = classification.fresh_log.clone() else {
            warn!(folder = %folder, "Activity without a fresh import log, not notifying");
            return Ok(());
        };

        let log_contents = self.fs.read_to_string(&log_path).await?;
        let owner = match self.fs.owner_account(folder.path()).await {
            Ok(owner) => owner,
            Err(err) => {
                warn!(folder = %folder, error = %err, "Owner lookup failed, notifying submitter only");
                None
            }
        };

        let recipients = self.notifier.recipients(folder, owner.as_deref())?;
        info!(folder = %folder, recipients = ?recipients, "Recipients resolved");
        let job = NotificationJob::new(
            recipients,
            subject_for_folder(folder.name().unwrap_or_default()),
            compose_body(&log_contents, classification.is_empty()),
        );
        let report = self.notifier.notify(&job).await;
        summary.notifications_sent += report.sent;
        summary.notifications_failed += report.failed;
        Ok(())
    }
}
