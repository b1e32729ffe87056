//! YAML config loading + environment-variable plumbing (spec §6).
//!
//! `backydb-core` never touches `std::env` or a config file (spec §9
//! "Global mutable state ... captured once into an immutable `Settings`
//! value at job construction"). This module is the one place that reads
//! both and assembles them into a `backydb_core::Settings`.

use std::collections::BTreeSet;
use std::path::Path;

use backydb_core::job::{CompressionType, IntegrityType, KeyProviderKind, KeystoreKind, ObjectCategory};
use backydb_core::settings::{
    CompressionSettings, DatabaseSettings, IntegritySettings, SecuritySettings, Settings, StorageSettings, StorageType,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawFeatures {
    #[serde(default = "default_true")]
    tables: bool,
    #[serde(default = "default_true")]
    data: bool,
    #[serde(default)]
    views: bool,
    #[serde(default)]
    functions: bool,
    #[serde(default)]
    procedures: bool,
    #[serde(default)]
    triggers: bool,
    #[serde(default)]
    events: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RawFeatures {
    fn default() -> Self {
        Self { tables: true, data: true, views: false, functions: false, procedures: false, triggers: false, events: false }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawDatabase {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    user: String,
    db_name: String,
    #[serde(default)]
    multiple_files: bool,
    #[serde(default)]
    features: RawFeatures,
}

fn default_port() -> u16 {
    5432
}

#[derive(Debug, Deserialize, Default)]
struct RawCompression {
    #[serde(default)]
    compression: bool,
    compression_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawSecurity {
    #[serde(default)]
    encryption: bool,
    #[serde(rename = "type")]
    keystore_type: Option<String>,
    provider: Option<String>,
    #[serde(default = "default_key_size")]
    key_size: u32,
}

fn default_key_size() -> u32 {
    4096
}

#[derive(Debug, Deserialize, Default)]
struct RawIntegrity {
    #[serde(default)]
    integrity_check: bool,
    integrity_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawStorage {
    #[serde(default = "default_storage_type")]
    storage_type: String,
}

fn default_storage_type() -> String {
    "local".to_string()
}

/// The on-disk YAML shape (spec §6 "Configuration"). `backup_path` is only
/// meaningful for restore.
#[derive(Debug, Deserialize, Default)]
pub struct RawConfig {
    database: RawDatabase,
    #[serde(default)]
    compression: RawCompression,
    #[serde(default)]
    security: RawSecurity,
    #[serde(default)]
    integrity: RawIntegrity,
    #[serde(default)]
    storage: RawStorage,
    pub backup_path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("parsing config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("missing required environment variable {0}")]
    MissingEnv(String),
}

pub fn load_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read { path: path.display().to_string(), source: e })?;
    Ok(serde_yaml::from_str(&text)?)
}

fn parse_compression_type(s: &str) -> Result<CompressionType, ConfigError> {
    match s {
        "zip" => Ok(CompressionType::Zip),
        "tar" => Ok(CompressionType::Tar),
        other => Err(ConfigError::Invalid(format!("unknown compression_type: {other}"))),
    }
}

fn parse_key_provider(s: &str) -> Result<KeyProviderKind, ConfigError> {
    match s {
        "local" => Ok(KeyProviderKind::Local),
        "gcp" => Ok(KeyProviderKind::Gcp),
        "aws" => Ok(KeyProviderKind::Aws),
        other => Err(ConfigError::Invalid(format!("unknown security.provider: {other}"))),
    }
}

fn parse_keystore_kind(s: &str) -> Result<KeystoreKind, ConfigError> {
    match s {
        "keystore" => Ok(KeystoreKind::Keystore),
        "kms" => Ok(KeystoreKind::Kms),
        other => Err(ConfigError::Invalid(format!("unknown security.type: {other}"))),
    }
}

fn parse_integrity_type(s: &str) -> Result<IntegrityType, ConfigError> {
    match s {
        "hmac" => Ok(IntegrityType::Hmac),
        "checksum" => Ok(IntegrityType::Checksum),
        other => Err(ConfigError::Invalid(format!("unknown integrity_type: {other}"))),
    }
}

fn parse_storage_type(s: &str) -> Result<StorageType, ConfigError> {
    match s {
        "local" => Ok(StorageType::Local),
        "aws" => Ok(StorageType::Aws),
        other => Err(ConfigError::Invalid(format!("unknown storage_type: {other}"))),
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))
}

/// Build the immutable `Settings` a job is constructed from: YAML file
/// fields plus the environment variables spec §6 names. Read exactly
/// once, here, at startup (spec §9).
pub fn build_settings(raw: RawConfig, storage_prefix: String) -> Result<Settings, ConfigError> {
    let mut features = BTreeSet::new();
    if raw.database.features.tables {
        features.insert(ObjectCategory::Tables);
    }
    if raw.database.features.data {
        features.insert(ObjectCategory::Data);
    }
    if raw.database.features.views {
        features.insert(ObjectCategory::Views);
    }
    if raw.database.features.functions {
        features.insert(ObjectCategory::Functions);
    }
    if raw.database.features.procedures {
        features.insert(ObjectCategory::Procedures);
    }
    if raw.database.features.triggers {
        features.insert(ObjectCategory::Triggers);
    }
    if raw.database.features.events {
        features.insert(ObjectCategory::Events);
    }

    let compression_type = raw.compression.compression_type.as_deref().map(parse_compression_type).transpose()?;
    let provider = raw.security.provider.as_deref().map(parse_key_provider).transpose()?;
    let keystore_kind = raw.security.keystore_type.as_deref().map(parse_keystore_kind).transpose()?;
    if raw.security.encryption && matches!(provider, Some(KeyProviderKind::Gcp) | Some(KeyProviderKind::Aws)) && keystore_kind.is_none() {
        return Err(ConfigError::Invalid("security.type is required when security.provider is gcp or aws".into()));
    }
    let integrity_type = raw.integrity.integrity_type.as_deref().map(parse_integrity_type).transpose()?;
    let storage_type = parse_storage_type(&raw.storage.storage_type)?;

    let db_password = required_env("DB_PASSWORD")?;
    let private_key_password =
        if raw.security.encryption && matches!(provider, Some(KeyProviderKind::Local)) { Some(required_env("PRIVATE_KEY_PASSWORD")?) } else { None };
    let integrity_secret = if raw.integrity.integrity_check && matches!(integrity_type, Some(IntegrityType::Hmac)) {
        Some(required_env("INTEGRITY_PASSWORD")?)
    } else {
        None
    };

    Ok(Settings {
        database: DatabaseSettings {
            host: raw.database.host,
            port: raw.database.port,
            user: raw.database.user,
            db_name: raw.database.db_name,
            multiple_files: raw.database.multiple_files,
            features,
        },
        compression: CompressionSettings { enabled: raw.compression.compression, compression_type },
        security: SecuritySettings { enabled: raw.security.encryption, provider, keystore_kind, key_size: raw.security.key_size },
        integrity: IntegritySettings { enabled: raw.integrity.integrity_check, integrity_type },
        storage: StorageSettings { storage_type, storage_prefix },
        db_password,
        private_key_password,
        integrity_secret,
        backup_path: raw.backup_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_features_are_tables_and_data_only() {
        let raw: RawConfig = serde_yaml::from_str(
            "database:\n  host: localhost\n  user: root\n  db_name: seed\n",
        )
        .unwrap();
        assert!(raw.database.features.tables);
        assert!(raw.database.features.data);
        assert!(!raw.database.features.views);
    }

    #[test]
    fn unknown_compression_type_is_invalid() {
        assert!(matches!(parse_compression_type("gzip"), Err(ConfigError::Invalid(_))));
    }
}
