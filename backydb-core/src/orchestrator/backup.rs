//! Backup state machine (spec §4.8): `Validated -> SchemaExtracting ->
//! (Compressing?) -> (Encrypting?) -> Storing -> Manifesting -> Done`.

use backydb_keystore::KeyProvider;
use futures::stream::{self, StreamExt, TryStreamExt};

use super::{output_extension, through_bounded_channel, CancellationToken};
use crate::artifact::Artifact;
use crate::compressor::{Compressor, TarCompressor, ZipCompressor};
use crate::crypto_envelope;
use crate::error::BackyError;
use crate::integrity::IntegrityTagger;
use crate::job::{BackupJob, CompressionType};
use crate::manifest::{ArtifactEntry, EngineInfo, IntegrityEntry, Manifest, Transform};
use crate::schema::{self, DatabaseAdapter};
use crate::storage::StorageBackend;

#[derive(Debug, Clone, Copy)]
pub enum BackupState {
    Validated,
    SchemaExtracting,
    Compressing,
    Encrypting,
    Storing,
    Manifesting,
    Done,
}

pub struct BackupOptions {
    pub engine: EngineInfo,
    pub fan_out: usize,
}

pub struct BackupOutcome {
    pub manifest: Manifest,
    pub stored_names: Vec<String>,
}

/// A physical blob handed to Storage — one per `dump.*`/archive output, or
/// one per category when `multiple_files=true` with no compression.
struct StoredBlob {
    name: String,
    bytes: Vec<u8>,
}

fn compressor_for(kind: CompressionType) -> Box<dyn Compressor + Send + Sync> {
    match kind {
        CompressionType::Zip => Box::new(ZipCompressor),
        CompressionType::Tar => Box::new(TarCompressor),
    }
}

fn strip_ext(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

/// Remove whatever has already landed in `storage` before a cancellation is
/// propagated (spec §5 "partial outputs are deleted from Storage ... on
/// trip"; spec §8 "cancellation after any chunk leaves no files in the
/// storage prefix").
async fn cleanup_stored(storage: &(dyn StorageBackend + Sync), stored: &[String]) {
    for name in stored {
        if let Err(err) = storage.delete(name).await {
            tracing::warn!(name, error = %err, "failed to remove partial output after cancellation");
        }
    }
}

async fn seal_bytes(key_provider: Option<&(dyn KeyProvider + Sync)>, bytes: Vec<u8>) -> Result<Vec<u8>, BackyError> {
    let chunked = through_bounded_channel(bytes).await;
    match key_provider {
        Some(provider) => crypto_envelope::seal(provider, &chunked).await,
        None => Ok(chunked),
    }
}

pub async fn run_backup(
    job: &BackupJob,
    adapter: &(dyn DatabaseAdapter + Sync),
    key_provider: Option<&(dyn KeyProvider + Sync)>,
    storage: &(dyn StorageBackend + Sync),
    integrity: Option<&IntegrityTagger>,
    options: &BackupOptions,
    cancellation: &CancellationToken,
) -> Result<BackupOutcome, BackyError> {
    tracing::info!(state = ?BackupState::Validated, "backup job validated");
    // Nothing has reached Storage yet at these two checkpoints, so cleanup
    // is a no-op, but every cancellation exit goes through the same path.
    let mut stored_names: Vec<String> = Vec::new();

    tracing::info!(state = ?BackupState::SchemaExtracting, "extracting schema");
    let artifacts = schema::extract(adapter, &job.features)?;
    if cancellation.is_cancelled() {
        cleanup_stored(storage, &stored_names).await;
        return Err(BackyError::Cancelled);
    }

    let units: Vec<Artifact> = if job.multiple_files {
        artifacts
    } else {
        vec![Artifact::concat("dump.sql", &artifacts)]
    };

    let ext = output_extension(job.compression.is_some(), job.encryption.is_some());
    let entries: Vec<ArtifactEntry> =
        units.iter().map(|a| ArtifactEntry { name: a.name.clone(), sha256: a.sha256_hex(), size: a.raw_len() }).collect();

    let blobs: Vec<StoredBlob> = if let Some(kind) = job.compression {
        tracing::info!(state = ?BackupState::Compressing, "compressing artifacts into one archive");
        let archive = compressor_for(kind).compress(&units)?;

        tracing::info!(state = ?BackupState::Encrypting, "sealing archive");
        let bytes = seal_bytes(key_provider, archive).await?;
        vec![StoredBlob { name: format!("dump.{ext}"), bytes }]
    } else if job.multiple_files {
        tracing::info!(state = ?BackupState::Encrypting, "sealing each artifact independently");
        let fan_out = options.fan_out.max(1);
        stream::iter(units)
            .map(|artifact| async move {
                if cancellation.is_cancelled() {
                    return Err(BackyError::Cancelled);
                }
                let name = format!("{}.{ext}", strip_ext(&artifact.name));
                let bytes = seal_bytes(key_provider, artifact.bytes).await?;
                Ok(StoredBlob { name, bytes })
            })
            .buffer_unordered(fan_out)
            .try_collect()
            .await?
    } else {
        let artifact = units.into_iter().next().expect("single-file mode always has one unit");
        let bytes = seal_bytes(key_provider, artifact.bytes).await?;
        vec![StoredBlob { name: format!("dump.{ext}"), bytes }]
    };

    if cancellation.is_cancelled() {
        cleanup_stored(storage, &stored_names).await;
        return Err(BackyError::Cancelled);
    }

    tracing::info!(state = ?BackupState::Storing, count = blobs.len(), "storing output(s)");
    for blob in &blobs {
        if cancellation.is_cancelled() {
            cleanup_stored(storage, &stored_names).await;
            return Err(BackyError::Cancelled);
        }
        storage.put(&blob.name, &blob.bytes).await?;
        stored_names.push(blob.name.clone());
    }

    if cancellation.is_cancelled() {
        cleanup_stored(storage, &stored_names).await;
        return Err(BackyError::Cancelled);
    }

    tracing::info!(state = ?BackupState::Manifesting, "building manifest");
    let mut transforms = Vec::new();
    if let Some(kind) = job.compression {
        transforms.push(Transform::compress(kind));
    }
    if job.encryption.is_some() {
        transforms.push(Transform::Encrypt {
            alg_id: backydb_envelope::ALG_AES256GCM_RSA_OAEP_SHA256,
            key_provider: "configured".to_string(),
        });
    }

    let mut manifest = Manifest::new(
        uuid::Uuid::new_v4(),
        chrono::Utc::now(),
        options.engine.clone(),
        job,
        transforms,
        entries,
        IntegrityEntry { integrity_type: "none".to_string(), value: String::new() },
    );

    if let Some(tagger) = integrity {
        let canonical = manifest.canonical_bytes_excluding_tag();
        let refs: Vec<&[u8]> = blobs.iter().map(|b| b.bytes.as_slice()).collect();
        manifest.integrity.value = tagger.compute(&canonical, &refs)?;
        manifest.integrity.integrity_type = match tagger {
            IntegrityTagger::Hmac { .. } => "hmac".to_string(),
            IntegrityTagger::Checksum => "checksum".to_string(),
        };
    }

    storage.put("manifest.json", &manifest.canonical_bytes()).await?;
    stored_names.push("manifest.json".to_string());

    tracing::info!(state = ?BackupState::Done, "backup complete");
    Ok(BackupOutcome { manifest, stored_names })
}
