// Exclusion Set Domain Model

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Canonicalized directory paths to skip, loaded once per pass and immutable
/// for its duration.
///
/// Membership tests expect paths that were canonicalized through the same
/// `FsInspector` that loaded the set, so `/data/a`, `/data/./a/` and a
/// symlink to `/data/a` all resolve to the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    paths: BTreeSet<PathBuf>,
}

impl ExclusionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_canonical(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn contains(&self, canonical: &Path) -> bool {
        self.paths.contains(canonical)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
