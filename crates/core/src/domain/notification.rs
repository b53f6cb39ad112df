// Notification Domain Model
// Message composition is pure; delivery goes through the MailTransport port.

use serde::Serialize;

use crate::domain::error::{DomainError, Result};

/// Notice appended to the import log when the folder classified as empty.
/// Wording matters operationally: submitters are told the folder goes away
/// and that the spreadsheet contents were not verified on their behalf.
pub const EMPTY_FOLDER_TRAILER: &str = "\
All image files in this submission folder were imported successfully. The \
folder is now scheduled for removal; only bookkeeping files (spreadsheets, \
logs and other metadata) remain in it.

Please check the log above against your submission spreadsheet. The \
completeness of the spreadsheet is your own responsibility: if an image you \
expected to import is not listed, correct the spreadsheet and resubmit \
before discarding your local copies.";

/// A validated mail address derived from an account name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient(String);

impl Recipient {
    /// Build `<account>@<domain>`. Rejects empty parts so a degenerate
    /// folder name like `_scratch` never produces the address `@domain`.
    pub fn from_account(account: &str, domain: &str) -> Result<Self> {
        if account.is_empty() {
            return Err(DomainError::EmptyAccount);
        }
        if domain.is_empty() {
            return Err(DomainError::EmptyMailDomain);
        }
        Ok(Self(format!("{account}@{domain}")))
    }

    pub fn address(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully addressed message, ready for the mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// Render into the wire form the transport expects on stdin:
    /// `To`/`From`/`Subject` headers, a blank line, then the body.
    pub fn render(&self) -> String {
        let mut rendered = format!(
            "To: {}\nFrom: {}\nSubject: {}\n\n{}",
            self.to, self.from, self.subject, self.body
        );
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        rendered
    }
}

/// One notification unit for one folder: a shared subject and body, sent to
/// each recipient independently. Created only when classification reported
/// notable activity and a fresh import log existed; dropped after the last
/// recipient reaches a terminal delivery outcome.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub recipients: Vec<Recipient>,
    pub subject: String,
    pub body: String,
}

impl NotificationJob {
    pub fn new(recipients: Vec<Recipient>, subject: String, body: String) -> Self {
        Self {
            recipients,
            subject,
            body,
        }
    }

    pub fn message_for(&self, recipient: &Recipient, from: &str) -> MailMessage {
        MailMessage {
            to: recipient.address().to_string(),
            from: from.to_string(),
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

/// Subject line for a folder's import report.
pub fn subject_for_folder(folder_name: &str) -> String {
    format!("Import results for {folder_name}")
}

/// Body = verbatim log contents, plus the removal notice when the folder
/// classified as empty.
pub fn compose_body(log_contents: &str, folder_empty: bool) -> String {
    if !folder_empty {
        return log_contents.to_string();
    }
    let mut body = log_contents.to_string();
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
    body.push('\n');
    body.push_str(EMPTY_FOLDER_TRAILER);
    body
}
