// Dropsweep Infrastructure - System Adapters
// Implements: FsInspector, ImportRunner, MailTransport

pub mod fs_inspector_local;
pub mod fs_inspector_sudo;
pub mod identity;
pub mod import_runner_subprocess;
pub mod mail_transport_pipe;

pub use fs_inspector_local::LocalFsInspector;
pub use fs_inspector_sudo::SudoFsInspector;
pub use identity::ServiceIdentity;
pub use import_runner_subprocess::SubprocessImportRunner;
pub use mail_transport_pipe::PipeMailTransport;
