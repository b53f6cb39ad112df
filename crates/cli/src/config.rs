// Runtime configuration from the environment
//
// Everything except the command line comes in through environment
// variables, so a cron entry can configure the whole run. IMPORT is the
// only required variable; the rest fall back to the documented defaults.

use dropsweep_core::application::orchestrator::constants::{
    DEFAULT_IDLE_MINUTES, DEFAULT_LOG_FRESH_MINUTES, DEFAULT_LOOKBACK_MINUTES,
    DEFAULT_MAIL_ATTEMPTS,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// A pre-tokenized external command: the program and its fixed arguments.
///
/// Values are split on ASCII whitespace only. No quoting or expansion is
/// interpreted; the value is an argv, never shell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    fn parse(name: &'static str, raw: &str) -> Result<Self, ConfigError> {
        let mut parts = raw.split_ascii_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: "empty command".to_string(),
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Import command run once per idle folder ($IMPORT).
    pub import_command: CommandLine,
    /// Kill imports running longer than this; unlimited when unset.
    pub import_timeout_secs: Option<u64>,
    /// Mail command fed the rendered message on stdin.
    pub mail_command: CommandLine,
    /// Domain appended to account names when addressing mail.
    pub mail_domain: String,
    /// From header on every notification.
    pub mail_from: String,
    /// Delivery attempts per recipient.
    pub mail_attempts: u32,
    pub idle_minutes: u64,
    pub lookback_minutes: u64,
    pub log_fresh_minutes: u64,
    /// Staging area for outgoing messages.
    pub scratch_dir: PathBuf,
}

impl ToolConfig {
    /// Load configuration through `get`, usually `|n| std::env::var(n).ok()`.
    pub fn load(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let import_raw = get("IMPORT").ok_or(ConfigError::Missing("IMPORT"))?;
        let import_command = CommandLine::parse("IMPORT", &import_raw)?;

        let mail_raw = get("DROPSWEEP_MAIL_COMMAND").unwrap_or_else(|| "sendmail".to_string());
        let mail_command = CommandLine::parse("DROPSWEEP_MAIL_COMMAND", &mail_raw)?;

        let mail_domain =
            get("DROPSWEEP_MAIL_DOMAIN").unwrap_or_else(|| "localhost".to_string());
        let mail_from =
            get("DROPSWEEP_MAIL_FROM").unwrap_or_else(|| format!("dropsweep@{mail_domain}"));

        let scratch_dir = match get("DROPSWEEP_SCRATCH_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => directories::BaseDirs::new()
                .map(|dirs| dirs.home_dir().join(".dropsweep"))
                .unwrap_or_else(|| std::env::temp_dir().join("dropsweep")),
        };

        Ok(Self {
            import_command,
            import_timeout_secs: parse_optional(&get, "DROPSWEEP_IMPORT_TIMEOUT_SECS")?,
            mail_command,
            mail_domain,
            mail_from,
            mail_attempts: parse_or(&get, "DROPSWEEP_MAIL_ATTEMPTS", DEFAULT_MAIL_ATTEMPTS)?,
            idle_minutes: parse_or(&get, "DROPSWEEP_IDLE_MINUTES", DEFAULT_IDLE_MINUTES)?,
            lookback_minutes: parse_or(
                &get,
                "DROPSWEEP_LOOKBACK_MINUTES",
                DEFAULT_LOOKBACK_MINUTES,
            )?,
            log_fresh_minutes: parse_or(
                &get,
                "DROPSWEEP_LOG_FRESH_MINUTES",
                DEFAULT_LOG_FRESH_MINUTES,
            )?,
            scratch_dir,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: err.to_string(),
        }),
    }
}

fn parse_optional<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match get(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|err: T::Err| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: err.to_string(),
            }),
    }
}
