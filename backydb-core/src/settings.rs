//! The ambient-config/environment snapshot, captured once into an
//! immutable value before any job runs (spec §9 "Global mutable state").
//!
//! `backydb-core` never reads `std::env` or a config file itself — that's
//! `backydb-cli`'s job (spec §1 "Out of scope"). This module only defines
//! the shape of what the CLI hands down.

use std::collections::BTreeSet;

use crate::job::{BackupJob, CompressionType, DatabaseTarget, IntegrityType, KeyProviderKind, KeystoreKind, ObjectCategory, RestoreJob};

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub db_name: String,
    pub multiple_files: bool,
    pub features: BTreeSet<ObjectCategory>,
}

#[derive(Clone, Debug, Default)]
pub struct CompressionSettings {
    pub enabled: bool,
    pub compression_type: Option<CompressionType>,
}

#[derive(Clone, Debug, Default)]
pub struct SecuritySettings {
    pub enabled: bool,
    pub provider: Option<KeyProviderKind>,
    /// Only meaningful when `provider` is `Gcp`/`Aws` (spec §6 `security.type`).
    pub keystore_kind: Option<KeystoreKind>,
    pub key_size: u32,
}

#[derive(Clone, Debug, Default)]
pub struct IntegritySettings {
    pub enabled: bool,
    pub integrity_type: Option<IntegrityType>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageType {
    Local,
    Aws,
}

#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub storage_type: StorageType,
    pub storage_prefix: String,
}

/// Everything a job needs, assembled once from config file + environment
/// by `backydb-cli` and then treated as read-only for the rest of the run.
#[derive(Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub compression: CompressionSettings,
    pub security: SecuritySettings,
    pub integrity: IntegritySettings,
    pub storage: StorageSettings,

    pub db_password: String,
    pub private_key_password: Option<String>,
    pub integrity_secret: Option<String>,
    pub backup_path: Option<String>,
}

impl Settings {
    pub fn to_backup_job(&self) -> BackupJob {
        BackupJob {
            database: DatabaseTarget {
                host: self.database.host.clone(),
                port: self.database.port,
                user: self.database.user.clone(),
                db_name: self.database.db_name.clone(),
            },
            features: self.database.features.clone(),
            multiple_files: self.database.multiple_files,
            compression: self.compression.enabled.then_some(self.compression.compression_type).flatten(),
            encryption: self
                .security
                .enabled
                .then_some(self.security.provider)
                .flatten()
                .map(|provider| (provider, self.security.key_size)),
            integrity: self.integrity.enabled.then_some(self.integrity.integrity_type).flatten(),
            storage_prefix: self.storage.storage_prefix.clone(),
        }
    }

    pub fn to_restore_job(&self) -> Option<RestoreJob> {
        Some(RestoreJob {
            database: DatabaseTarget {
                host: self.database.host.clone(),
                port: self.database.port,
                user: self.database.user.clone(),
                db_name: self.database.db_name.clone(),
            },
            backup_path: self.backup_path.clone()?,
            integrity_secret: self.integrity_secret.clone(),
            key_provider: self.security.provider.map(|p| (p, self.security.key_size)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> Settings {
        Settings {
            database: DatabaseSettings {
                host: "localhost".into(),
                port: 5432,
                user: "root".into(),
                db_name: "seed".into(),
                multiple_files: false,
                features: [ObjectCategory::Tables, ObjectCategory::Data].into_iter().collect(),
            },
            compression: CompressionSettings { enabled: false, compression_type: None },
            security: SecuritySettings { enabled: false, provider: None, keystore_kind: None, key_size: 2048 },
            integrity: IntegritySettings { enabled: false, integrity_type: None },
            storage: StorageSettings { storage_type: StorageType::Local, storage_prefix: "backups/seed".into() },
            db_password: "secret".into(),
            private_key_password: None,
            integrity_secret: None,
            backup_path: None,
        }
    }

    #[test]
    fn to_backup_job_carries_feature_set() {
        let job = sample_settings().to_backup_job();
        assert!(job.features.contains(&ObjectCategory::Tables));
        assert!(job.encryption.is_none());
    }

    #[test]
    fn to_restore_job_is_none_without_backup_path() {
        assert!(sample_settings().to_restore_job().is_none());
    }
}
