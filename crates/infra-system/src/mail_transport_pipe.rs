// Pipe mail transport
// Renders the message into a staging file under the scratch directory and
// feeds it to the configured mail command on stdin, with the recipient
// address appended as the final argument. The staging slot holds the most
// recent attempt and is overwritten each time.

use async_trait::async_trait;
use dropsweep_core::domain::MailMessage;
use dropsweep_core::port::{MailError, MailTransport};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub struct PipeMailTransport {
    program: String,
    base_args: Vec<String>,
    scratch_dir: PathBuf,
}

impl PipeMailTransport {
    pub fn new(program: String, base_args: Vec<String>, scratch_dir: PathBuf) -> Self {
        Self {
            program,
            base_args,
            scratch_dir,
        }
    }

    async fn stage(&self, message: &MailMessage) -> Result<PathBuf, MailError> {
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|err| {
                MailError::Stage(format!("{}: {err}", self.scratch_dir.display()))
            })?;
        let staged = self.scratch_dir.join("outgoing.msg");
        tokio::fs::write(&staged, message.render())
            .await
            .map_err(|err| MailError::Stage(format!("{}: {err}", staged.display())))?;
        Ok(staged)
    }
}

#[async_trait]
impl MailTransport for PipeMailTransport {
    async fn deliver(&self, message: &MailMessage) -> Result<(), MailError> {
        let staged = self.stage(message).await?;
        let stdin = std::fs::File::open(&staged)
            .map_err(|err| MailError::Stage(format!("{}: {err}", staged.display())))?;

        let mut args = self.base_args.clone();
        args.push(message.to.clone());

        debug!(
            recipient = %message.to,
            program = %self.program,
            staged = %staged.display(),
            "Handing message to mail command"
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| MailError::Delivery {
                recipient: message.to.clone(),
                message: format!("failed to run {}: {err}", self.program),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MailError::Delivery {
                recipient: message.to.clone(),
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                ),
            });
        }
        Ok(())
    }
}
