// Exclusion list loading

use crate::domain::ExclusionSet;
use crate::port::{FsError, FsInspector};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Loads the operator's exclusion file into an [`ExclusionSet`].
///
/// The file holds one directory path per line; blank lines and `#` comments
/// are ignored. Every entry is canonicalized before insertion so that
/// relative segments, trailing slashes and symlinked spellings all name the
/// same folder the scanner will later canonicalize its candidates to.
pub struct ExclusionLoader {
    fs: Arc<dyn FsInspector>,
}

impl ExclusionLoader {
    pub fn new(fs: Arc<dyn FsInspector>) -> Self {
        Self { fs }
    }

    /// Load exclusions from `file`, or an empty set when no file was given.
    ///
    /// An unreadable file is an error: the operator asked for exclusions and
    /// silently importing everything would be worse than stopping. An entry
    /// that no longer exists is only a warning; a vanished folder cannot be
    /// imported anyway.
    pub async fn load(&self, file: Option<&Path>) -> Result<ExclusionSet, FsError> {
        let Some(file) = file else {
            return Ok(ExclusionSet::empty());
        };

        let contents = self.fs.read_to_string(file).await?;
        let mut canonical = Vec::new();
        for line in contents.lines() {
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            match self.fs.canonicalize(Path::new(entry)).await {
                Ok(path) => canonical.push(path),
                Err(err) => {
                    warn!(entry, error = %err, "dropping unresolvable exclusion entry");
                }
            }
        }

        let set = ExclusionSet::from_canonical(canonical);
        info!(file = %file.display(), entries = set.len(), "exclusion list loaded");
        Ok(set)
    }
}
