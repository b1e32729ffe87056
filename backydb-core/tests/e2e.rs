//! Pipeline-level end-to-end scenarios (spec §8) driving `run_backup`/
//! `run_restore` against [`MockAdapter`] and [`LocalStorage`], the way the
//! teacher's own crates exercise a full client/server round trip rather
//! than individual units.

use backydb_core::job::{CompressionType, DatabaseTarget, IntegrityType, KeyProviderKind, ObjectCategory};
use backydb_core::manifest::EngineInfo;
use backydb_core::orchestrator::backup::{run_backup, BackupOptions};
use backydb_core::orchestrator::restore::{run_restore, RestoreOptions};
use backydb_core::orchestrator::CancellationHandle;
use backydb_core::schema::MockAdapter;
use backydb_core::storage::LocalStorage;
use backydb_core::{BackupJob, IntegrityTagger, StorageBackend};
use backydb_keystore::{KeyProvider, LocalVault};

fn engine() -> EngineInfo {
    EngineInfo { engine_type: "mysql".to_string(), version: "8.0.34".to_string() }
}

fn seed_job(features: &[ObjectCategory]) -> BackupJob {
    BackupJob {
        database: DatabaseTarget { host: "localhost".into(), port: 3306, user: "root".into(), db_name: "seed".into() },
        features: features.iter().copied().collect(),
        multiple_files: false,
        compression: None,
        encryption: None,
        integrity: None,
        storage_prefix: "backups/seed".into(),
    }
    .validate()
    .unwrap()
}

fn restore_options() -> RestoreOptions {
    RestoreOptions { best_effort: false, running_engine_version: "8.0.34".to_string() }
}

/// Scenario 1 (Raw): no compression, no encryption, single concatenated
/// `dump.sql`; restoring into an empty database reproduces the row counts.
#[tokio::test]
async fn scenario_1_raw_round_trip_reproduces_row_counts() {
    let source = MockAdapter::seed();
    let job = seed_job(&[ObjectCategory::Tables, ObjectCategory::Data]);
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    let (_handle, cancellation) = CancellationHandle::new();

    let outcome = run_backup(&job, &source, None, &storage, None, &BackupOptions { engine: engine(), fan_out: 4 }, &cancellation)
        .await
        .unwrap();

    assert_eq!(outcome.stored_names, vec!["dump.sql".to_string(), "manifest.json".to_string()]);
    let on_disk = storage.list("").await.unwrap();
    assert_eq!(on_disk, vec!["dump.sql".to_string(), "manifest.json".to_string()]);

    let mut target = MockAdapter::empty("mysql", "8.0.34");
    let restored =
        run_restore(&mut target, None, &storage, None, &restore_options(), &cancellation).await.unwrap();

    assert_eq!(restored.skipped_statements, Vec::<String>::new());
    assert_eq!(target.row_count("departments"), 3);
    assert_eq!(target.row_count("employees"), 3);
    assert_eq!(target.row_count("projects"), 3);
}

/// Scenario 2 (Full): tar compression + local-vault encryption + HMAC
/// integrity; flipping a ciphertext byte must abort restore with
/// `IntegrityFailure` before any statement reaches the adapter.
#[tokio::test]
async fn scenario_2_full_tamper_is_caught_before_any_apply() {
    let source = MockAdapter::seed();
    let mut job = seed_job(&[ObjectCategory::Tables, ObjectCategory::Data]);
    job.compression = Some(CompressionType::Tar);
    job.encryption = Some((KeyProviderKind::Local, 2048));
    job.integrity = Some(IntegrityType::Hmac);

    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    let vault_dir = tempfile::tempdir().unwrap();
    let vault = LocalVault::open(vault_dir.path(), b"hunter2", 2048).unwrap();
    let tagger = IntegrityTagger::Hmac { secret: b"shared-secret".to_vec() };
    let (_handle, cancellation) = CancellationHandle::new();

    let outcome = run_backup(
        &job,
        &source,
        Some(&vault as &dyn KeyProvider),
        &storage,
        Some(&tagger),
        &BackupOptions { engine: engine(), fan_out: 4 },
        &cancellation,
    )
    .await
    .unwrap();
    assert_eq!(outcome.stored_names, vec!["dump.backy".to_string(), "manifest.json".to_string()]);

    // Corrupt the stored archive: flip a byte well inside the ciphertext.
    let mut bytes = storage.get("dump.backy").await.unwrap();
    let flip_at = bytes.len().min(100).saturating_sub(1);
    bytes[flip_at] ^= 0xFF;
    storage.put("dump.backy", &bytes).await.unwrap();

    let mut target = MockAdapter::empty("mysql", "8.0.34");
    let result = run_restore(&mut target, Some(&vault as &dyn KeyProvider), &storage, Some(&tagger), &restore_options(), &cancellation)
        .await;

    assert!(matches!(result, Err(backydb_core::BackyError::IntegrityFailure)));
    assert!(target.applied().is_empty(), "no statement should reach the adapter once integrity fails");
}

/// Scenario 3 (Multi-file): disabling procedures/triggers yields exactly
/// the 5 members the README example describes.
#[tokio::test]
async fn scenario_3_multi_file_produces_five_named_members() {
    let source = MockAdapter::seed();
    let mut job = seed_job(&[
        ObjectCategory::Tables,
        ObjectCategory::Data,
        ObjectCategory::Views,
        ObjectCategory::Functions,
        ObjectCategory::Events,
    ]);
    job.multiple_files = true;

    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    let (_handle, cancellation) = CancellationHandle::new();

    let outcome = run_backup(&job, &source, None, &storage, None, &BackupOptions { engine: engine(), fan_out: 4 }, &cancellation)
        .await
        .unwrap();

    let mut stored: Vec<&str> = outcome.stored_names.iter().map(String::as_str).filter(|n| *n != "manifest.json").collect();
    stored.sort();
    assert_eq!(stored, vec!["data.sql", "events.sql", "functions.sql", "tables.sql", "views.sql"]);

    let mut target = MockAdapter::empty("mysql", "8.0.34");
    run_restore(&mut target, None, &storage, None, &restore_options(), &cancellation).await.unwrap();
    assert!(target.table_exists("departments"));
    assert!(target.table_exists("view_employee_departments"));
}

/// Scenario 6 (Key rotation negative): unwrapping an envelope sealed under
/// one vault with a different vault must fail, and nothing is applied.
#[tokio::test]
async fn scenario_6_key_rotation_mismatch_applies_nothing() {
    let source = MockAdapter::seed();
    let mut job = seed_job(&[ObjectCategory::Tables, ObjectCategory::Data]);
    job.encryption = Some((KeyProviderKind::Local, 2048));

    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    let vault_a_dir = tempfile::tempdir().unwrap();
    let vault_a = LocalVault::open(vault_a_dir.path(), b"pw-a", 2048).unwrap();
    let (_handle, cancellation) = CancellationHandle::new();

    run_backup(
        &job,
        &source,
        Some(&vault_a as &dyn KeyProvider),
        &storage,
        None,
        &BackupOptions { engine: engine(), fan_out: 4 },
        &cancellation,
    )
    .await
    .unwrap();

    let vault_b_dir = tempfile::tempdir().unwrap();
    let vault_b = LocalVault::open(vault_b_dir.path(), b"pw-b", 2048).unwrap();
    let mut target = MockAdapter::empty("mysql", "8.0.34");
    let result =
        run_restore(&mut target, Some(&vault_b as &dyn KeyProvider), &storage, None, &restore_options(), &cancellation).await;

    assert!(result.is_err());
    assert!(target.applied().is_empty(), "key mismatch must not apply any statement");
}

/// Boundary behavior (spec §8): an empty database (zero rows, tables
/// enabled) produces a valid backup whose restore is a no-op.
#[tokio::test]
async fn empty_database_backup_restores_as_a_no_op() {
    let source = MockAdapter::empty("mysql", "8.0.34");
    let job = seed_job(&[ObjectCategory::Tables]);
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    let (_handle, cancellation) = CancellationHandle::new();

    run_backup(&job, &source, None, &storage, None, &BackupOptions { engine: engine(), fan_out: 4 }, &cancellation)
        .await
        .unwrap();

    let mut target = MockAdapter::empty("mysql", "8.0.34");
    let outcome = run_restore(&mut target, None, &storage, None, &restore_options(), &cancellation).await.unwrap();
    assert_eq!(outcome.skipped_statements, Vec::<String>::new());
    assert_eq!(target.row_count("departments"), 0);
}

/// Cancellation (spec §5, §8): tripping the token before a backup starts
/// storing leaves the storage prefix empty.
#[tokio::test]
async fn cancellation_before_storing_leaves_no_files_behind() {
    let source = MockAdapter::seed();
    let job = seed_job(&[ObjectCategory::Tables, ObjectCategory::Data]);
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    let (handle, cancellation) = CancellationHandle::new();
    handle.cancel();

    let result =
        run_backup(&job, &source, None, &storage, None, &BackupOptions { engine: engine(), fan_out: 4 }, &cancellation).await;

    assert!(matches!(result, Err(backydb_core::BackyError::Cancelled)));
    assert!(storage.list("").await.unwrap().is_empty());
}
