//! Canonical JSON manifest (spec §4.7, §6, §9 "Cyclic configuration
//! references").
//!
//! `#[derive(Serialize)]` on a struct writes its fields straight to the
//! output in declaration order, so serializing `Manifest` directly does
//! NOT sort keys. `serde_json`'s `Map` is `BTreeMap`-backed (the
//! `preserve_order` feature isn't enabled here), so routing through
//! `serde_json::to_value` first — which builds a real `Map` — then
//! serializing *that* does yield sorted keys with no insignificant
//! whitespace, the canonical form spec §4.7 asks for.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::job::{BackupJob, CompressionType, IntegrityType, ObjectCategory};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineInfo {
    #[serde(rename = "type")]
    pub engine_type: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Features {
    pub tables: bool,
    pub data: bool,
    pub views: bool,
    pub functions: bool,
    pub procedures: bool,
    pub triggers: bool,
    pub events: bool,
}

impl Features {
    pub fn from_categories(categories: &BTreeSet<ObjectCategory>) -> Self {
        Self {
            tables: categories.contains(&ObjectCategory::Tables),
            data: categories.contains(&ObjectCategory::Data),
            views: categories.contains(&ObjectCategory::Views),
            functions: categories.contains(&ObjectCategory::Functions),
            procedures: categories.contains(&ObjectCategory::Procedures),
            triggers: categories.contains(&ObjectCategory::Triggers),
            events: categories.contains(&ObjectCategory::Events),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Transform {
    Compress { #[serde(rename = "type")] archive_type: String },
    Encrypt { alg_id: u8, key_provider: String },
}

impl Transform {
    pub fn compress(kind: CompressionType) -> Self {
        Transform::Compress {
            archive_type: match kind {
                CompressionType::Zip => "zip".to_string(),
                CompressionType::Tar => "tar".to_string(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub sha256: String,
    pub size: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntegrityEntry {
    #[serde(rename = "type")]
    pub integrity_type: String,
    pub value: String,
}

impl IntegrityEntry {
    pub fn kind_name(kind: IntegrityType) -> &'static str {
        match kind {
            IntegrityType::Hmac => "hmac",
            IntegrityType::Checksum => "checksum",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub backup_id: String,
    pub created_at: String,
    pub tool_version: String,
    pub engine: EngineInfo,
    pub features: Features,
    pub multiple_files: bool,
    pub transforms: Vec<Transform>,
    pub artifacts: Vec<ArtifactEntry>,
    pub integrity: IntegrityEntry,
}

impl Manifest {
    pub fn new(
        backup_id: uuid::Uuid,
        created_at: chrono::DateTime<chrono::Utc>,
        engine: EngineInfo,
        job: &BackupJob,
        transforms: Vec<Transform>,
        artifacts: Vec<ArtifactEntry>,
        integrity: IntegrityEntry,
    ) -> Self {
        Self {
            backup_id: backup_id.to_string(),
            created_at: created_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            engine,
            features: Features::from_categories(&job.features),
            multiple_files: job.multiple_files,
            transforms,
            artifacts,
            integrity,
        }
    }

    /// Canonical bytes with the integrity `value` field blanked — the
    /// input to the integrity tag itself, breaking the cycle where the
    /// manifest would otherwise need to describe its own tag (spec §9).
    pub fn canonical_bytes_excluding_tag(&self) -> Vec<u8> {
        let mut blanked = self.clone();
        blanked.integrity.value = String::new();
        canonical_json(&blanked)
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_json(self)
    }

    /// `Manifest.engine.version` major-version check (spec §9 Open
    /// Question resolution): a major mismatch is a hard rejection before
    /// any restore work begins.
    pub fn check_engine_major_version(&self, running_version: &str) -> Result<(), crate::error::BackyError> {
        let manifest_major = major_version(&self.engine.version);
        let running_major = major_version(running_version);
        match (manifest_major, running_major) {
            (Some(a), Some(b)) if a != b => Err(crate::error::BackyError::ConfigInvalid(format!(
                "backup was created with engine major version {a}, running engine is major version {b}"
            ))),
            _ => Ok(()),
        }
    }
}

fn major_version(version: &str) -> Option<u32> {
    version.split('.').next()?.parse().ok()
}

/// Serializes `value` with alphabetically sorted object keys at every
/// nesting level by routing through `serde_json::Value`'s `BTreeMap`-backed
/// `Map` first (see the module doc comment).
fn canonical_json(value: &impl Serialize) -> Vec<u8> {
    let as_value = serde_json::to_value(value).expect("manifest always converts to a json value");
    serde_json::to_vec(&as_value).expect("json value always serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::DatabaseTarget;

    fn sample_job() -> BackupJob {
        BackupJob {
            database: DatabaseTarget { host: "h".into(), port: 1, user: "u".into(), db_name: "d".into() },
            features: [ObjectCategory::Tables, ObjectCategory::Data].into_iter().collect(),
            multiple_files: false,
            compression: None,
            encryption: None,
            integrity: None,
            storage_prefix: "p".into(),
        }
    }

    fn sample_manifest() -> Manifest {
        Manifest::new(
            uuid::Uuid::nil(),
            chrono::DateTime::from_timestamp(0, 0).unwrap(),
            EngineInfo { engine_type: "mysql".into(), version: "8.0.34".into() },
            &sample_job(),
            vec![],
            vec![ArtifactEntry { name: "dump.sql".into(), sha256: "abc".into(), size: 3 }],
            IntegrityEntry { integrity_type: "checksum".into(), value: "deadbeef".into() },
        )
    }

    #[test]
    fn canonical_serialization_has_sorted_keys_and_no_whitespace() {
        let manifest = sample_manifest();
        let json = String::from_utf8(manifest.canonical_bytes()).unwrap();
        assert!(!json.contains(' '));

        // Top-level struct field declaration order is NOT alphabetical
        // (backup_id, created_at, tool_version, engine, ...) — assert the
        // bytes actually come out sorted rather than merely "some pair
        // happens to land in order".
        let expected_order =
            ["artifacts", "backup_id", "created_at", "engine", "features", "integrity", "multiple_files", "tool_version", "transforms"];
        let positions: Vec<usize> = expected_order.iter().map(|key| json.find(&format!("\"{key}\"")).unwrap()).collect();
        let mut sorted_positions = positions.clone();
        sorted_positions.sort();
        assert_eq!(positions, sorted_positions, "top-level keys are not in sorted order: {json}");
    }

    #[test]
    fn canonical_bytes_excluding_tag_blanks_only_the_value() {
        let manifest = sample_manifest();
        let blanked = String::from_utf8(manifest.canonical_bytes_excluding_tag()).unwrap();
        assert!(blanked.contains("\"value\":\"\""));
        assert!(!blanked.contains("deadbeef"));
    }

    #[test]
    fn major_version_mismatch_is_rejected() {
        let manifest = sample_manifest();
        assert!(manifest.check_engine_major_version("9.1.0").is_err());
        assert!(manifest.check_engine_major_version("8.1.0").is_ok());
    }
}
