//! Dropsweep - Imports idle submission folders and mails the results
//!
//! One invocation is one pass, so a cron entry like
//! `*/30 * * * * IMPORT="omero-import --quiet" dropsweep /dropbox`
//! gives the original scan cadence.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::ToolConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Instrument};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use dropsweep_core::application::{
    CandidateScanner, DeliveryPolicy, ExclusionLoader, FolderClassifier, Notifier, Orchestrator,
    PassRequest,
};
use dropsweep_core::port::{FsInspector, SystemTimeProvider};
use dropsweep_infra_system::{
    LocalFsInspector, PipeMailTransport, ServiceIdentity, SubprocessImportRunner, SudoFsInspector,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "dropsweep")]
#[command(about = "Imports idle submission folders and mails the results", long_about = None)]
#[command(version)]
struct Cli {
    /// File listing folders to skip, one path per line
    #[arg(short = 'e', long = "exclude", value_name = "FILE")]
    exclude: Option<PathBuf>,

    /// Service account that owns filesystem access and imports
    #[arg(short = 'u', long = "user", value_name = "ACCOUNT")]
    user: Option<String>,

    /// Directory whose subdirectories are submission folders
    #[arg(value_name = "TARGET_FOLDER")]
    target_folder: PathBuf,

    /// Extra arguments appended to every import invocation
    #[arg(last = true, value_name = "IMPORT_ARGS")]
    import_args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Usage problems exit 1 on stderr; -h/-V exit 0 on stdout.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let failed = err.use_stderr();
            let _ = err.print();
            std::process::exit(if failed { 1 } else { 0 });
        }
    };

    // 1. Initialize logging
    let log_format =
        std::env::var("DROPSWEEP_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("dropsweep=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("dropsweep v{} starting", VERSION);

    // 2. Load configuration
    let config = ToolConfig::load(|name| std::env::var(name).ok())?;
    info!(
        import = %config.import_command.program,
        idle_minutes = config.idle_minutes,
        lookback_minutes = config.lookback_minutes,
        log_fresh_minutes = config.log_fresh_minutes,
        mail_attempts = config.mail_attempts,
        "Configuration loaded"
    );

    // 3. Choose filesystem access: direct, or delegated through sudo
    let identity = ServiceIdentity::from_option(cli.user.clone());
    let fs: Arc<dyn FsInspector> = if identity.is_delegated() {
        info!(account = identity.account().unwrap_or_default(), "Delegating to service account");
        Arc::new(SudoFsInspector::new(identity.clone()))
    } else {
        Arc::new(LocalFsInspector)
    };

    // 4. Validate the target up front; a bad root is a usage error, not a
    //    pass result
    let root = fs
        .canonicalize(&cli.target_folder)
        .await
        .with_context(|| format!("target folder {}", cli.target_folder.display()))?;
    fs.list_subdirs(&root)
        .await
        .with_context(|| format!("target folder {} is not scannable", root.display()))?;

    // 5. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);

    let importer = Arc::new(SubprocessImportRunner::new(
        identity,
        time_provider.clone(),
        config.import_command.program.clone(),
        config.import_command.args.clone(),
        config.import_timeout_secs,
    ));

    let mail = Arc::new(PipeMailTransport::new(
        config.mail_command.program.clone(),
        config.mail_command.args.clone(),
        config.scratch_dir.clone(),
    ));

    let orchestrator = Orchestrator::new(
        fs.clone(),
        CandidateScanner::new(fs.clone(), time_provider.clone(), config.idle_minutes),
        ExclusionLoader::new(fs.clone()),
        FolderClassifier::new(
            fs.clone(),
            time_provider.clone(),
            config.lookback_minutes,
            config.log_fresh_minutes,
        ),
        importer,
        Notifier::new(
            mail,
            DeliveryPolicy::new(config.mail_attempts),
            config.mail_domain.clone(),
            config.mail_from.clone(),
        ),
    );

    // 6. Run one pass
    let request = PassRequest {
        root,
        exclusion_file: cli.exclude.clone(),
        extra_args: cli.import_args.clone(),
    };
    let summary = orchestrator
        .run_pass(&request)
        .instrument(tracing::info_span!("pass", run_id = %Uuid::new_v4()))
        .await?;

    info!(
        summary = %serde_json::to_string(&summary).unwrap_or_default(),
        "Run finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_target_folder_is_required() {
        let err = Cli::try_parse_from(["dropsweep"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_flags_and_passthrough_parse() {
        let cli = Cli::try_parse_from([
            "dropsweep",
            "-e",
            "/etc/dropsweep/exclusions",
            "-u",
            "importer",
            "/dropbox",
            "--",
            "--depth",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.exclude, Some(PathBuf::from("/etc/dropsweep/exclusions")));
        assert_eq!(cli.user.as_deref(), Some("importer"));
        assert_eq!(cli.target_folder, PathBuf::from("/dropbox"));
        assert_eq!(cli.import_args, vec!["--depth", "2"]);
    }

    #[test]
    fn test_unknown_flag_is_a_stderr_error() {
        let err = Cli::try_parse_from(["dropsweep", "--frobnicate", "/dropbox"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_help_goes_to_stdout() {
        let err = Cli::try_parse_from(["dropsweep", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }
}
