// Port Layer
// Trait seams between orchestration logic and the outside world. Adapters
// live in dropsweep-infra-system; mocks live alongside each trait.

pub mod fs_inspector;
pub mod import_runner;
pub mod mail_transport;
pub mod time_provider;

pub use fs_inspector::{FileStat, FsError, FsInspector};
pub use import_runner::{ImportError, ImportRun, ImportRunner};
pub use mail_transport::{MailError, MailTransport};
pub use time_provider::{SystemTimeProvider, TimeProvider};
