// Orchestrator constants (no magic values in the pass logic)

/// Quiet period before a folder counts as idle (60 minutes)
/// A folder with any direct child modified more recently is still being
/// uploaded into and is left alone.
pub const DEFAULT_IDLE_MINUTES: u64 = 60;

/// Activity lookback window for post-import classification (420 minutes)
pub const DEFAULT_LOOKBACK_MINUTES: u64 = 420;

/// Freshness window for the importer's log file (10 minutes)
/// Notification requires a log younger than this; anything older predates
/// the import that just ran.
pub const DEFAULT_LOG_FRESH_MINUTES: u64 = 10;

/// Delivery attempts per recipient before giving up (10)
pub const DEFAULT_MAIL_ATTEMPTS: u32 = 10;

/// Extensions of bookkeeping files an imported folder may retain.
/// A folder whose direct children all carry one of these extensions is
/// fully imported: the importer consumed every image and left only
/// spreadsheets, logs and sidecar metadata behind.
pub const AUXILIARY_EXTENSIONS: &[&str] = &["xlsx", "csv", "log", "json", "db", "ini", "txt"];

/// Extension the importer writes its per-folder log under
pub const LOG_EXTENSION: &str = "log";

/// Milliseconds per minute
pub const MS_PER_MINUTE: i64 = 60_000;
