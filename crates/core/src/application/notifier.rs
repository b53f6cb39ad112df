// Notification fan-out with per-recipient delivery retry

use crate::application::retry::{DeliveryDecision, DeliveryPolicy};
use crate::domain::{DomainError, MailMessage, NotificationJob, Recipient, SubmissionFolder};
use crate::port::MailTransport;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Delivery outcome counts for one notification job.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub sent: usize,
    pub failed: usize,
}

/// Notifier resolves who hears about a finished import and gets the message
/// to them.
///
/// The submitter is always addressed. When the folder's filesystem owner is
/// a different account (an admin uploaded on someone's behalf, say), the
/// owner is addressed too. Every recipient gets an independent delivery
/// loop against the transport.
pub struct Notifier {
    mail: Arc<dyn MailTransport>,
    policy: DeliveryPolicy,
    mail_domain: String,
    mail_from: String,
}

impl Notifier {
    pub fn new(
        mail: Arc<dyn MailTransport>,
        policy: DeliveryPolicy,
        mail_domain: String,
        mail_from: String,
    ) -> Self {
        Self {
            mail,
            policy,
            mail_domain,
            mail_from,
        }
    }

    /// Resolve the recipients for one folder: the submitter, plus the
    /// filesystem owner when it is a different account.
    pub fn recipients(
        &self,
        folder: &SubmissionFolder,
        owner_account: Option<&str>,
    ) -> Result<Vec<Recipient>, DomainError> {
        let submitter = folder
            .submitter_account()
            .ok_or_else(|| DomainError::UnnamedFolder(folder.path().to_path_buf()))?;

        let mut recipients = vec![Recipient::from_account(submitter, &self.mail_domain)?];
        if let Some(owner) = owner_account {
            if owner != submitter {
                recipients.push(Recipient::from_account(owner, &self.mail_domain)?);
            }
        }
        Ok(recipients)
    }

    /// Deliver `job` to each of its recipients, retrying each independently.
    pub async fn notify(&self, job: &NotificationJob) -> NotifyReport {
        let mut report = NotifyReport::default();
        for recipient in &job.recipients {
            let message = job.message_for(recipient, &self.mail_from);
            if self.deliver_with_retry(&message).await {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    async fn deliver_with_retry(&self, message: &MailMessage) -> bool {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self.mail.deliver(message).await {
                Ok(()) => {
                    info!(
                        recipient = %message.to,
                        attempt = %attempts,
                        "Notification delivered"
                    );
                    return true;
                }
                Err(err) => {
                    warn!(
                        recipient = %message.to,
                        attempt = %attempts,
                        error = %err,
                        "Delivery attempt failed"
                    );
                    if self.policy.after_failure(&message.to, attempts) == DeliveryDecision::GiveUp
                    {
                        error!(
                            recipient = %message.to,
                            attempts = %attempts,
                            "Notification abandoned"
                        );
                        return false;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{compose_body, subject_for_folder};
    use crate::port::mail_transport::mocks::MockMailTransport;

    fn notifier(mail: Arc<MockMailTransport>, attempts: u32) -> Notifier {
        Notifier::new(
            mail,
            DeliveryPolicy::new(attempts),
            "example.org".to_string(),
            "dropsweep@example.org".to_string(),
        )
    }

    fn job_for(recipients: Vec<Recipient>) -> NotificationJob {
        NotificationJob::new(
            recipients,
            subject_for_folder("alice_2024_01"),
            compose_body("imported 4 of 4 files\n", false),
        )
    }

    #[test]
    fn test_submitter_is_sole_recipient_without_owner() {
        let n = notifier(Arc::new(MockMailTransport::new()), 1);
        let folder = SubmissionFolder::new("/dropbox/alice_2024_01");

        let recipients = n.recipients(&folder, None).unwrap();

        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].address(), "alice@example.org");
    }

    #[test]
    fn test_matching_owner_is_not_duplicated() {
        let n = notifier(Arc::new(MockMailTransport::new()), 1);
        let folder = SubmissionFolder::new("/dropbox/alice_2024_01");

        let recipients = n.recipients(&folder, Some("alice")).unwrap();

        assert_eq!(recipients.len(), 1);
    }

    #[test]
    fn test_differing_owner_is_added() {
        let n = notifier(Arc::new(MockMailTransport::new()), 1);
        let folder = SubmissionFolder::new("/dropbox/alice_2024_01");

        let recipients = n.recipients(&folder, Some("facility")).unwrap();

        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[1].address(), "facility@example.org");
    }

    #[test]
    fn test_leading_underscore_name_is_rejected() {
        let n = notifier(Arc::new(MockMailTransport::new()), 1);
        let folder = SubmissionFolder::new("/dropbox/_scratch");

        let result = n.recipients(&folder, None);

        assert!(matches!(result, Err(DomainError::EmptyAccount)));
    }

    #[tokio::test]
    async fn test_delivery_succeeds_first_try() {
        let mail = Arc::new(MockMailTransport::new());
        let n = notifier(mail.clone(), 10);
        let recipients = vec![Recipient::from_account("alice", "example.org").unwrap()];

        let report = n.notify(&job_for(recipients)).await;

        assert_eq!(report, NotifyReport { sent: 1, failed: 0 });
        assert_eq!(mail.attempts("alice@example.org"), 1);
        assert_eq!(mail.delivered_to("alice@example.org"), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_immediately() {
        let mail = Arc::new(MockMailTransport::new());
        mail.fail_first_for("alice@example.org", 2);
        let n = notifier(mail.clone(), 10);
        let recipients = vec![Recipient::from_account("alice", "example.org").unwrap()];

        let report = n.notify(&job_for(recipients)).await;

        assert_eq!(report, NotifyReport { sent: 1, failed: 0 });
        assert_eq!(mail.attempts("alice@example.org"), 3);
        assert_eq!(mail.delivered_to("alice@example.org"), 1);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_abandons_recipient() {
        let mail = Arc::new(MockMailTransport::new());
        mail.always_fail_for("alice@example.org");
        let n = notifier(mail.clone(), 4);
        let recipients = vec![Recipient::from_account("alice", "example.org").unwrap()];

        let report = n.notify(&job_for(recipients)).await;

        assert_eq!(report, NotifyReport { sent: 0, failed: 1 });
        assert_eq!(mail.attempts("alice@example.org"), 4);
        assert_eq!(mail.delivered_to("alice@example.org"), 0);
    }

    #[tokio::test]
    async fn test_recipients_retry_independently() {
        let mail = Arc::new(MockMailTransport::new());
        mail.always_fail_for("alice@example.org");
        let n = notifier(mail.clone(), 3);
        let recipients = vec![
            Recipient::from_account("alice", "example.org").unwrap(),
            Recipient::from_account("facility", "example.org").unwrap(),
        ];

        let report = n.notify(&job_for(recipients)).await;

        assert_eq!(report, NotifyReport { sent: 1, failed: 1 });
        assert_eq!(mail.attempts("alice@example.org"), 3);
        assert_eq!(
            mail.attempts("facility@example.org"),
            1,
            "one recipient's failures must not consume another's budget"
        );
        assert_eq!(mail.delivered_to("facility@example.org"), 1);
    }

    #[tokio::test]
    async fn test_rendered_message_reaches_transport_intact() {
        let mail = Arc::new(MockMailTransport::new());
        let n = notifier(mail.clone(), 1);
        let recipients = vec![Recipient::from_account("alice", "example.org").unwrap()];

        n.notify(&job_for(recipients)).await;

        let delivered = mail.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].from, "dropsweep@example.org");
        assert_eq!(delivered[0].subject, "Import results for alice_2024_01");
        assert!(delivered[0].body.contains("imported 4 of 4 files"));
    }
}
