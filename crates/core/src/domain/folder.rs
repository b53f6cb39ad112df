// Submission Folder Domain Model

use std::fmt;
use std::path::{Path, PathBuf};

/// A user-created directory of files awaiting import.
///
/// Identity is the path. The submitting account is encoded in the folder
/// name by convention: everything before the first underscore, so
/// `alice_2024_01` was submitted by `alice`. A name without an underscore
/// is taken as the account itself.
///
/// The orchestrator never creates or deletes these folders; upload tooling
/// creates them and a downstream process removes them once they classify
/// as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFolder {
    path: PathBuf,
}

impl SubmissionFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, i.e. the folder name as the submitter typed it.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Account name encoded in the folder name (prefix before the first
    /// underscore). May be empty for degenerate names like `_scratch`;
    /// recipient construction rejects those.
    pub fn submitter_account(&self) -> Option<&str> {
        self.name().map(|name| match name.split_once('_') {
            Some((account, _)) => account,
            None => name,
        })
    }
}

impl fmt::Display for SubmissionFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.display().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_is_prefix_before_first_underscore() {
        let folder = SubmissionFolder::new("/dropbox/alice_2024_01");
        assert_eq!(folder.name(), Some("alice_2024_01"));
        assert_eq!(folder.submitter_account(), Some("alice"));
    }

    #[test]
    fn name_without_underscore_is_the_account() {
        let folder = SubmissionFolder::new("/dropbox/bob");
        assert_eq!(folder.submitter_account(), Some("bob"));
    }

    #[test]
    fn leading_underscore_yields_empty_account() {
        let folder = SubmissionFolder::new("/dropbox/_scratch");
        assert_eq!(folder.submitter_account(), Some(""));
    }

    #[test]
    fn root_path_has_no_name() {
        let folder = SubmissionFolder::new("/");
        assert_eq!(folder.name(), None);
        assert_eq!(folder.submitter_account(), None);
    }
}
