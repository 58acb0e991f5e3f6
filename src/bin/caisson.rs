//! Inspects and dry-runs stored server configurations.
//!
//! Usage:
//!
//! ```text
//! caisson plan <server>
//! caisson dry-run [server...]
//! ```
//!
//! `plan` prints the classification and startup recipe of a stored
//! configuration as JSON. `dry-run` activates the listed servers (or those
//! named by `CAISSON_STARTUP_SERVERS`) against in-memory subsystems, prints
//! the reports, and stops everything again. Documents are read from
//! `CAISSON_CONFIG_DIR`; logs go to stderr, filtered by `CAISSON_LOG`.

use caisson::config::{PlatformSettings, SettingsError};
use caisson::server_lifecycle::{
    adapters::{
        authorization::AllowAllAuthorization,
        file_store::FileConfigurationStore,
        memory::{SubsystemJournal, in_memory_catalog},
        tracing_audit::TracingAuditLog,
    },
    domain::{DeactivationMode, LifecycleDomainError, Recipe, ServerName, classify},
    ports::{ConfigurationStore, ConfigurationStoreError},
    services::{BulkActivationError, InstanceRegistry, LifecycleError, LifecycleOrchestrator},
};
use mockable::DefaultClock;
use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Errors that end the command with a non-zero status.
#[derive(Debug, Error)]
enum CliError {
    #[error("usage: caisson plan <server> | caisson dry-run [server...]")]
    Usage,
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Domain(#[from] LifecycleDomainError),
    #[error(transparent)]
    Store(#[from] ConfigurationStoreError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Bulk(#[from] BulkActivationError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[derive(Debug)]
enum Command {
    Plan(String),
    DryRun(Vec<String>),
}

impl Command {
    fn parse(args: Vec<String>) -> Result<Self, CliError> {
        let mut remaining = args.into_iter();
        match remaining.next().as_deref() {
            Some("plan") => match (remaining.next(), remaining.next()) {
                (Some(server), None) => Ok(Self::Plan(server)),
                _ => Err(CliError::Usage),
            },
            Some("dry-run") => Ok(Self::DryRun(remaining.collect())),
            _ => Err(CliError::Usage),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let settings = PlatformSettings::from_env()?;
    init_tracing(settings.log_filter());
    match Command::parse(std::env::args().skip(1).collect())? {
        Command::Plan(server) => plan(&settings, &server).await,
        Command::DryRun(servers) => dry_run(&settings, servers).await,
    }
}

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("caisson=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

async fn plan(settings: &PlatformSettings, server: &str) -> Result<(), CliError> {
    let store = FileConfigurationStore::new(settings.config_dir());
    let server_name = ServerName::new(server)?;
    let configuration = store.load(&server_name).await?;
    let classification = classify(&server_name, &configuration)?;
    let recipe = Recipe::for_configuration(classification, &configuration)?;
    let fingerprint = configuration.fingerprint()?;
    write_json(&json!({
        "server": server_name,
        "classification": classification,
        "fingerprint": fingerprint.as_str(),
        "recipe": recipe,
    }))
}

async fn dry_run(settings: &PlatformSettings, servers: Vec<String>) -> Result<(), CliError> {
    let requested = if servers.is_empty() {
        settings
            .startup_servers()
            .iter()
            .map(ToString::to_string)
            .collect()
    } else {
        servers
    };
    info!(servers = requested.len(), config_dir = %settings.config_dir(), "starting dry run");

    let journal = SubsystemJournal::new();
    let orchestrator = LifecycleOrchestrator::new(
        Arc::new(FileConfigurationStore::new(settings.config_dir())),
        Arc::new(AllowAllAuthorization),
        in_memory_catalog(&journal),
        Arc::new(InstanceRegistry::new()),
        Arc::new(TracingAuditLog),
        Arc::new(DefaultClock),
    );
    let user = settings.platform_user().as_str();

    let outcome = orchestrator.activate_list(user, &requested).await;
    let shutdown = orchestrator
        .shutdown_all(user, DeactivationMode::Temporary)
        .await?;
    match outcome {
        Ok(report) => write_json(&json!({
            "message": report.message(),
            "activated": report.activated,
            "shutdown": shutdown,
        })),
        Err(err) => {
            write_json(&json!({
                "code": err.code(),
                "trail": err.trail(),
                "shutdown": shutdown,
            }))?;
            Err(err.into())
        }
    }
}

fn write_json(value: &impl Serialize) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
