// Domain Layer - Pure business logic and entities

pub mod error;
pub mod exclusion;
pub mod folder;
pub mod notification;
pub mod outcome;

// Re-exports
pub use error::DomainError;
pub use exclusion::ExclusionSet;
pub use folder::SubmissionFolder;
pub use notification::{
    compose_body, subject_for_folder, MailMessage, NotificationJob, Recipient,
    EMPTY_FOLDER_TRAILER,
};
pub use outcome::{FolderClassification, PassSummary};
