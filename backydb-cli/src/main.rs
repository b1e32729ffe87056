//! `backydb` — config-driven CLI front end for the backup/restore pipeline
//! in `backydb-core` (spec §1 "Out of scope: CLI/config parsing ...").
//!
//! ```text
//! backydb backup  --config backup.yaml
//! backydb restore --config restore.yaml
//! ```
//!
//! Concrete database engines are outside the core's scope (spec §1), so
//! this binary drives the in-memory seed fixture (`MockAdapter::seed`)
//! unless a real `DatabaseAdapter` is wired in by an embedder.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use backydb_core::job::{KeyProviderKind, KeystoreKind};
use backydb_core::orchestrator::backup::{run_backup, BackupOptions};
use backydb_core::orchestrator::restore::{run_restore, RestoreOptions};
use backydb_core::orchestrator::CancellationHandle;
use backydb_core::schema::{DatabaseAdapter, MockAdapter};
use backydb_core::storage::LocalStorage;
use backydb_core::{BackyError, EngineInfo, IntegrityTagger};
use backydb_keystore::{KeyProvider, KeyProviderHandle, LocalVault};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "backydb", version, about = "Hybrid-encrypted backup/restore engine for relational databases")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a backup job against the configured database.
    Backup {
        #[arg(long)]
        config: PathBuf,
    },
    /// Restore a backup produced by `backydb backup`.
    Restore {
        #[arg(long)]
        config: PathBuf,
    },
}

fn init_tracing() {
    let filter = std::env::var("LOGGING_PATH")
        .map(|_| tracing_subscriber::EnvFilter::new("info"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    let code = match err.downcast_ref::<BackyError>() {
        Some(backy) => backy.exit_code(),
        None => 1,
    };
    ExitCode::from(code as u8)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Backup { config } => run_backup_command(&config).await,
        Command::Restore { config } => run_restore_command(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "backydb failed");
            exit_code_for(&err)
        }
    }
}

fn key_provider_for(
    kind: KeyProviderKind,
    keystore_kind: Option<KeystoreKind>,
    key_size: u32,
    vault_dir: Option<String>,
    private_key_password: Option<String>,
) -> anyhow::Result<KeyProviderHandle> {
    match kind {
        KeyProviderKind::Local => {
            let dir = vault_dir.ok_or_else(|| BackyError::ConfigInvalid("LOCAL_KEY_STORE_PATH is required for a local key provider".into()))?;
            let password = private_key_password
                .ok_or_else(|| BackyError::ConfigInvalid("PRIVATE_KEY_PASSWORD is required for a local key provider".into()))?;
            let vault = LocalVault::open(dir, password.as_bytes(), key_size).map_err(BackyError::from)?;
            Ok(KeyProviderHandle::LocalVault(vault))
        }
        // `security.type` (spec §6) tells us which cloud capability a gcp/aws
        // provider speaks, but the concrete endpoint/key-id/token a real
        // deployment points at isn't part of this spec's config schema —
        // that wiring is an embedder's job (spec §1 "Out of scope").
        KeyProviderKind::Gcp | KeyProviderKind::Aws => Err(BackyError::ConfigInvalid(format!(
            "cloud key providers ({kind:?}, type={keystore_kind:?}) must be wired in by an embedder, not the bundled CLI"
        ))
        .into()),
    }
}

fn integrity_tagger(settings: &backydb_core::Settings) -> anyhow::Result<Option<IntegrityTagger>> {
    use backydb_core::job::IntegrityType;
    if !settings.integrity.enabled {
        return Ok(None);
    }
    match settings.integrity.integrity_type {
        Some(IntegrityType::Hmac) => {
            let secret = settings
                .integrity_secret
                .clone()
                .ok_or_else(|| BackyError::ConfigInvalid("INTEGRITY_PASSWORD is required for hmac integrity".into()))?;
            Ok(Some(IntegrityTagger::Hmac { secret: secret.into_bytes() }))
        }
        Some(IntegrityType::Checksum) => Ok(Some(IntegrityTagger::Checksum)),
        None => Err(BackyError::ConfigInvalid("integrity_check is true but integrity_type is unset".into()).into()),
    }
}

async fn run_backup_command(config_path: &Path) -> anyhow::Result<()> {
    let raw = config::load_raw(config_path)?;
    let storage_prefix = format!("backups/{}", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"));
    let settings = config::build_settings(raw, storage_prefix)?;

    let job = settings.to_backup_job().validate()?;
    tracing::info!(backup_id = %uuid::Uuid::new_v4(), categories = ?job.features, "starting backup");

    let adapter = MockAdapter::seed();
    let engine = EngineInfo { engine_type: adapter.engine_type().to_string(), version: adapter.engine_version().to_string() };

    let key_provider = match job.encryption {
        Some((kind, key_size)) => Some(key_provider_for(
            kind,
            settings.security.keystore_kind,
            key_size,
            std::env::var("LOCAL_KEY_STORE_PATH").ok(),
            settings.private_key_password.clone(),
        )?),
        None => None,
    };
    let key_provider_ref: Option<&(dyn KeyProvider + Sync)> = key_provider.as_ref().map(|p| p as _);

    let storage = LocalStorage::new(std::env::var("LOCAL_PATH").unwrap_or_else(|_| ".".to_string()));
    let integrity = integrity_tagger(&settings)?;
    let (_cancel_handle, cancellation) = CancellationHandle::new();

    let outcome = run_backup(
        &job,
        &adapter,
        key_provider_ref,
        &storage,
        integrity.as_ref(),
        &BackupOptions { engine, fan_out: 4 },
        &cancellation,
    )
    .await?;

    println!("backup {} complete: {} file(s) stored", outcome.manifest.backup_id, outcome.stored_names.len());
    Ok(())
}

async fn run_restore_command(config_path: &Path) -> anyhow::Result<()> {
    let raw = config::load_raw(config_path)?;
    let settings = config::build_settings(raw, String::new())?;
    let restore_job = settings
        .to_restore_job()
        .ok_or_else(|| BackyError::ConfigInvalid("backup_path is required for restore".into()))?;

    tracing::info!(backup_path = %restore_job.backup_path, "starting restore");

    let mut adapter = MockAdapter::empty("mysql", "8.0.34");
    let key_provider = match restore_job.key_provider {
        Some((kind, key_size)) => Some(key_provider_for(
            kind,
            settings.security.keystore_kind,
            key_size,
            std::env::var("LOCAL_KEY_STORE_PATH").ok(),
            settings.private_key_password.clone(),
        )?),
        None => None,
    };
    let key_provider_ref: Option<&(dyn KeyProvider + Sync)> = key_provider.as_ref().map(|p| p as _);

    let storage = LocalStorage::new(restore_job.backup_path.clone());
    let integrity = integrity_tagger(&settings)?;
    let (_cancel_handle, cancellation) = CancellationHandle::new();

    let outcome = run_restore(
        &mut adapter,
        key_provider_ref,
        &storage,
        integrity.as_ref(),
        &RestoreOptions { best_effort: false, running_engine_version: adapter_version() },
        &cancellation,
    )
    .await?;

    println!("restore {} complete: {} statement(s) skipped", outcome.manifest.backup_id, outcome.skipped_statements.len());
    Ok(())
}

fn adapter_version() -> String {
    "8.0.34".to_string()
}
