// Import Runner Port
// One import invocation per submission folder. The adapter owns the argv
// (configured program, fixed arguments, then the folder path, then any
// passthrough arguments); orchestration only sees the outcome. A non-zero
// exit is a reportable result, not an error: the importer communicates
// partial failure through its log, and the notifier forwards that log.

use crate::domain::SubmissionFolder;
use async_trait::async_trait;
use thiserror::Error;

/// Outcome of one completed import invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRun {
    /// Process exit code; `None` when the process died to a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
}

impl ImportRun {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Invocation errors
///
/// These mean the importer never ran to completion at all, as opposed to
/// running and exiting non-zero.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to spawn import command `{program}`: {message}")]
    Spawn { program: String, message: String },

    #[error("import of {folder} exceeded {seconds}s and was killed")]
    Timeout { folder: String, seconds: u64 },
}

#[async_trait]
pub trait ImportRunner: Send + Sync {
    /// Run the configured import command against one folder.
    async fn run(
        &self,
        folder: &SubmissionFolder,
        extra_args: &[String],
    ) -> Result<ImportRun, ImportError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    type SideEffect = Box<dyn Fn(&SubmissionFolder) + Send + Sync>;

    /// Scripted outcome for the next invocations.
    #[derive(Debug, Clone)]
    pub enum MockImportBehavior {
        Succeed,
        ExitCode(i32),
        FailSpawn(String),
    }

    pub struct MockImportRunner {
        behavior: Mutex<MockImportBehavior>,
        invocations: Mutex<Vec<(PathBuf, Vec<String>)>>,
        side_effect: Mutex<Option<SideEffect>>,
    }

    impl MockImportRunner {
        pub fn new() -> Self {
            Self {
                behavior: Mutex::new(MockImportBehavior::Succeed),
                invocations: Mutex::new(Vec::new()),
                side_effect: Mutex::new(None),
            }
        }

        pub fn set_behavior(&self, behavior: MockImportBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }

        /// Run `effect` on every invocation, before the scripted outcome is
        /// returned. Lets a test mutate an in-memory filesystem the way a
        /// real importer mutates a real folder.
        pub fn on_run(&self, effect: impl Fn(&SubmissionFolder) + Send + Sync + 'static) {
            *self.side_effect.lock().unwrap() = Some(Box::new(effect));
        }

        pub fn invocations(&self) -> Vec<(PathBuf, Vec<String>)> {
            self.invocations.lock().unwrap().clone()
        }

        pub fn run_count(&self) -> usize {
            self.invocations.lock().unwrap().len()
        }
    }

    impl Default for MockImportRunner {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ImportRunner for MockImportRunner {
        async fn run(
            &self,
            folder: &SubmissionFolder,
            extra_args: &[String],
        ) -> Result<ImportRun, ImportError> {
            self.invocations
                .lock()
                .unwrap()
                .push((folder.path().to_path_buf(), extra_args.to_vec()));
            if let Some(effect) = self.side_effect.lock().unwrap().as_ref() {
                effect(folder);
            }
            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockImportBehavior::Succeed => Ok(ImportRun {
                    exit_code: Some(0),
                    stdout: String::new(),
                    stderr: String::new(),
                    duration_ms: 5,
                }),
                MockImportBehavior::ExitCode(code) => Ok(ImportRun {
                    exit_code: Some(code),
                    stdout: String::new(),
                    stderr: String::new(),
                    duration_ms: 5,
                }),
                MockImportBehavior::FailSpawn(message) => Err(ImportError::Spawn {
                    program: "import".to_string(),
                    message,
                }),
            }
        }
    }
}
