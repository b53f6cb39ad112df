// Subprocess import runner
// Invokes the configured import command once per folder. The argv is built
// as a vector (program, fixed arguments, folder path, passthrough
// arguments) and never goes through a shell, so folder names with spaces
// or metacharacters cannot change the command.

use crate::identity::ServiceIdentity;
use async_trait::async_trait;
use dropsweep_core::domain::SubmissionFolder;
use dropsweep_core::port::{ImportError, ImportRun, ImportRunner, TimeProvider};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

pub struct SubprocessImportRunner {
    identity: ServiceIdentity,
    time_provider: Arc<dyn TimeProvider>,
    program: String,
    base_args: Vec<String>,
    timeout: Option<Duration>,
}

impl SubprocessImportRunner {
    pub fn new(
        identity: ServiceIdentity,
        time_provider: Arc<dyn TimeProvider>,
        program: String,
        base_args: Vec<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            identity,
            time_provider,
            program,
            base_args,
            timeout: timeout_secs.map(Duration::from_secs),
        }
    }

    fn build_argv(
        &self,
        folder: &SubmissionFolder,
        extra_args: &[String],
    ) -> (String, Vec<String>) {
        let mut args = self.base_args.clone();
        args.push(folder.path().display().to_string());
        args.extend(extra_args.iter().cloned());
        self.identity.wrap(&self.program, &args)
    }
}

#[async_trait]
impl ImportRunner for SubprocessImportRunner {
    async fn run(
        &self,
        folder: &SubmissionFolder,
        extra_args: &[String],
    ) -> Result<ImportRun, ImportError> {
        let (program, args) = self.build_argv(folder, extra_args);
        let started = self.time_provider.now_millis();

        info!(
            program = %program,
            args = ?args,
            folder = %folder,
            "Starting import"
        );

        let child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ImportError::Spawn {
                program: program.clone(),
                message: err.to_string(),
            })?;

        let waited = match self.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                // Dropping the wait future drops the child, and
                // kill_on_drop reaps it.
                Err(_) => {
                    return Err(ImportError::Timeout {
                        folder: folder.to_string(),
                        seconds: limit.as_secs(),
                    })
                }
            },
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|err| ImportError::Spawn {
            program: program.clone(),
            message: err.to_string(),
        })?;

        let run = ImportRun {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: self.time_provider.now_millis() - started,
        };

        info!(
            folder = %folder,
            exit_code = ?run.exit_code,
            duration_ms = %run.duration_ms,
            "Import command finished"
        );
        debug!(
            folder = %folder,
            stdout = %run.stdout.trim_end(),
            stderr = %run.stderr.trim_end(),
            "Import output"
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropsweep_core::port::SystemTimeProvider;

    fn runner(program: &str, base_args: &[&str], timeout_secs: Option<u64>) -> SubprocessImportRunner {
        SubprocessImportRunner::new(
            ServiceIdentity::current(),
            Arc::new(SystemTimeProvider),
            program.to_string(),
            base_args.iter().map(|a| a.to_string()).collect(),
            timeout_secs,
        )
    }

    #[test]
    fn test_argv_order_is_base_then_folder_then_extras() {
        let r = runner("omero-import", &["--quiet"], None);
        let folder = SubmissionFolder::new("/dropbox/alice_a");

        let (program, args) = r.build_argv(&folder, &["--depth".to_string(), "2".to_string()]);

        assert_eq!(program, "omero-import");
        assert_eq!(args, vec!["--quiet", "/dropbox/alice_a", "--depth", "2"]);
    }

    #[test]
    fn test_delegated_argv_runs_under_sudo() {
        let r = SubprocessImportRunner::new(
            ServiceIdentity::delegate("importer"),
            Arc::new(SystemTimeProvider),
            "omero-import".to_string(),
            vec![],
            None,
        );
        let folder = SubmissionFolder::new("/dropbox/alice_a");

        let (program, args) = r.build_argv(&folder, &[]);

        assert_eq!(program, "sudo");
        assert_eq!(
            args,
            vec!["-n", "-u", "importer", "--", "omero-import", "/dropbox/alice_a"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_exit_and_output() {
        let r = runner("echo", &["imported"], None);
        let folder = SubmissionFolder::new("/dropbox/alice_a");

        let run = r.run(&folder, &["--depth".to_string()]).await.unwrap();

        assert!(run.succeeded());
        assert_eq!(run.stdout, "imported /dropbox/alice_a --depth\n");
        assert!(run.duration_ms >= 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_a_result_not_an_error() {
        let r = runner("false", &[], None);
        let folder = SubmissionFolder::new("/dropbox/alice_a");

        let run = r.run(&folder, &[]).await.unwrap();

        assert!(!run.succeeded());
        assert_eq!(run.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let r = runner("/nonexistent/importer", &[], None);
        let folder = SubmissionFolder::new("/dropbox/alice_a");

        let result = r.run(&folder, &[]).await;

        assert!(matches!(result, Err(ImportError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_overlong_import_times_out() {
        let r = runner("sh", &["-c", "sleep 5"], Some(1));
        let folder = SubmissionFolder::new("/dropbox/alice_a");

        let result = r.run(&folder, &[]).await;

        assert!(matches!(
            result,
            Err(ImportError::Timeout { seconds: 1, .. })
        ));
    }
}
