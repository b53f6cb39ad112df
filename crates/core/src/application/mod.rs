// Application Layer - Use Cases and Business Logic

pub mod classifier;
pub mod exclusions;
pub mod notifier;
pub mod orchestrator;
pub mod retry;
pub mod scanner;

// Re-exports
pub use classifier::FolderClassifier;
pub use exclusions::ExclusionLoader;
pub use notifier::{Notifier, NotifyReport};
pub use orchestrator::{Orchestrator, PassRequest};
pub use retry::{DeliveryDecision, DeliveryPolicy};
pub use scanner::{CandidateScanner, ScanReport};
