//! `BackupJob`/`RestoreJob` and the object-category dependency model
//! (spec §3).

use std::collections::BTreeSet;

use crate::error::BackyError;

/// One of the seven database object kinds the engine may emit (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectCategory {
    Tables,
    Data,
    Views,
    Functions,
    Procedures,
    Triggers,
    Events,
}

impl ObjectCategory {
    pub const ALL: [ObjectCategory; 7] = [
        ObjectCategory::Tables,
        ObjectCategory::Data,
        ObjectCategory::Views,
        ObjectCategory::Functions,
        ObjectCategory::Procedures,
        ObjectCategory::Triggers,
        ObjectCategory::Events,
    ];

    /// Emission order for backup: DDL before data, base tables before
    /// views, views before functions, procedures/triggers after tables,
    /// events last (spec §3).
    pub fn backup_rank(self) -> u8 {
        match self {
            ObjectCategory::Tables => 0,
            ObjectCategory::Data => 1,
            ObjectCategory::Views => 2,
            ObjectCategory::Functions => 3,
            ObjectCategory::Procedures => 4,
            ObjectCategory::Triggers => 5,
            ObjectCategory::Events => 6,
        }
    }

    /// Apply order for restore: tables -> views -> functions -> procedures
    /// -> triggers -> events, with `data` inserted after view DDL and
    /// before trigger creation (spec §4.4 ordering rule 3).
    pub fn restore_rank(self) -> u8 {
        match self {
            ObjectCategory::Tables => 0,
            ObjectCategory::Views => 1,
            ObjectCategory::Functions => 2,
            ObjectCategory::Data => 3,
            ObjectCategory::Procedures => 4,
            ObjectCategory::Triggers => 5,
            ObjectCategory::Events => 6,
        }
    }

    /// Drop order for restore: the destructive reverse (spec §3, §4.4
    /// ordering rule 1): events -> triggers -> procedures -> functions ->
    /// views -> tables.
    pub fn drop_rank(self) -> u8 {
        match self {
            ObjectCategory::Events => 0,
            ObjectCategory::Triggers => 1,
            ObjectCategory::Procedures => 2,
            ObjectCategory::Functions => 3,
            ObjectCategory::Views => 4,
            ObjectCategory::Data => 5,
            ObjectCategory::Tables => 6,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ObjectCategory::Tables => "tables.sql",
            ObjectCategory::Data => "data.sql",
            ObjectCategory::Views => "views.sql",
            ObjectCategory::Functions => "functions.sql",
            ObjectCategory::Procedures => "procedures.sql",
            ObjectCategory::Triggers => "triggers.sql",
            ObjectCategory::Events => "events.sql",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionType {
    Zip,
    Tar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyProviderKind {
    Local,
    Gcp,
    Aws,
}

/// Whether a cloud `provider` is reached as a generic key-management
/// service (spec §4.1 `CloudKeystore`) or a vendor KMS where the data key
/// never leaves the service (spec §4.1 `CloudKMS`). Irrelevant for
/// `KeyProviderKind::Local`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeystoreKind {
    Keystore,
    Kms,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrityType {
    Hmac,
    Checksum,
}

#[derive(Clone, Debug)]
pub struct DatabaseTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub db_name: String,
}

/// An immutable, validated backup request (spec §3 "Lifecycle": "A
/// BackupJob is immutable once validated").
#[derive(Clone, Debug)]
pub struct BackupJob {
    pub database: DatabaseTarget,
    pub features: BTreeSet<ObjectCategory>,
    pub multiple_files: bool,
    pub compression: Option<CompressionType>,
    pub encryption: Option<(KeyProviderKind, u32)>,
    pub integrity: Option<IntegrityType>,
    pub storage_prefix: String,
}

impl BackupJob {
    /// Validate and freeze a job. Mirrors spec §7 `ConfigInvalid`.
    pub fn validate(self) -> Result<Self, BackyError> {
        if self.features.is_empty() {
            return Err(BackyError::ConfigInvalid("no object categories selected".into()));
        }
        if self.features.contains(&ObjectCategory::Data) && !self.features.contains(&ObjectCategory::Tables) {
            return Err(BackyError::ConfigInvalid(
                "data category requires tables category to be enabled".into(),
            ));
        }
        if let Some((_, key_size)) = self.encryption {
            if !matches!(key_size, 2048 | 3072 | 4096) {
                return Err(BackyError::ConfigInvalid(format!("unsupported key_size: {key_size}")));
            }
        }
        Ok(self)
    }

    /// Categories in backup emission order (spec §3).
    pub fn ordered_categories(&self) -> Vec<ObjectCategory> {
        let mut categories: Vec<ObjectCategory> = self.features.iter().copied().collect();
        categories.sort_by_key(|c| c.backup_rank());
        categories
    }
}

/// An immutable, validated restore request.
#[derive(Clone, Debug)]
pub struct RestoreJob {
    pub database: DatabaseTarget,
    pub backup_path: String,
    pub integrity_secret: Option<String>,
    pub key_provider: Option<(KeyProviderKind, u32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(features: &[ObjectCategory]) -> BackupJob {
        BackupJob {
            database: DatabaseTarget {
                host: "localhost".into(),
                port: 5432,
                user: "root".into(),
                db_name: "seed".into(),
            },
            features: features.iter().copied().collect(),
            multiple_files: false,
            compression: None,
            encryption: None,
            integrity: None,
            storage_prefix: "backups/seed".into(),
        }
    }

    #[test]
    fn backup_rank_orders_tables_before_data_before_views() {
        let mut cats = vec![ObjectCategory::Events, ObjectCategory::Tables, ObjectCategory::Data];
        cats.sort_by_key(|c| c.backup_rank());
        assert_eq!(cats, vec![ObjectCategory::Tables, ObjectCategory::Data, ObjectCategory::Events]);
    }

    #[test]
    fn restore_rank_inserts_data_after_views_before_triggers() {
        let mut cats = vec![ObjectCategory::Triggers, ObjectCategory::Data, ObjectCategory::Views];
        cats.sort_by_key(|c| c.restore_rank());
        assert_eq!(cats, vec![ObjectCategory::Views, ObjectCategory::Data, ObjectCategory::Triggers]);
    }

    #[test]
    fn data_without_tables_is_rejected() {
        let result = job(&[ObjectCategory::Data]).validate();
        assert!(matches!(result, Err(BackyError::ConfigInvalid(_))));
    }

    #[test]
    fn empty_features_is_rejected() {
        let result = job(&[]).validate();
        assert!(result.is_err());
    }

    #[test]
    fn valid_job_passes() {
        let result = job(&[ObjectCategory::Tables, ObjectCategory::Data]).validate();
        assert!(result.is_ok());
    }
}
