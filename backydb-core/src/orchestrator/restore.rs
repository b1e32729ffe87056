//! Restore state machine (spec §4.9): `Validated -> Fetching ->
//! IntegrityChecking -> (Decrypting?) -> (Decompressing?) -> Applying ->
//! Done`.

use backydb_keystore::KeyProvider;

use super::{output_extension, CancellationToken};
use crate::compressor::{Compressor, Member, TarCompressor, ZipCompressor};
use crate::crypto_envelope;
use crate::error::BackyError;
use crate::integrity::IntegrityTagger;
use crate::job::ObjectCategory;
use crate::manifest::{Manifest, Transform};
use crate::schema::{self, DatabaseAdapter};
use crate::storage::StorageBackend;

#[derive(Debug, Clone, Copy)]
pub enum RestoreState {
    Validated,
    Fetching,
    IntegrityChecking,
    Decrypting,
    Decompressing,
    Applying,
    Done,
}

pub struct RestoreOptions {
    /// Matches spec §9 "the apply loop surfaces the first fatal and
    /// records skipped statements when a `best_effort` flag is set."
    pub best_effort: bool,
    pub running_engine_version: String,
}

pub struct RestoreOutcome {
    pub manifest: Manifest,
    pub skipped_statements: Vec<String>,
}

fn strip_ext(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

fn category_from_stem(stem: &str) -> Option<ObjectCategory> {
    ObjectCategory::ALL.into_iter().find(|c| strip_ext(c.file_name()) == stem)
}

fn blob_names(manifest: &Manifest, ext: &str) -> Vec<String> {
    let compressed = manifest.transforms.iter().any(|t| matches!(t, Transform::Compress { .. }));
    if compressed || !manifest.multiple_files {
        vec![format!("dump.{ext}")]
    } else {
        manifest.artifacts.iter().map(|a| format!("{}.{ext}", strip_ext(&a.name))).collect()
    }
}

pub async fn run_restore(
    adapter: &mut (dyn DatabaseAdapter + Sync + Send),
    key_provider: Option<&(dyn KeyProvider + Sync)>,
    storage: &(dyn StorageBackend + Sync),
    integrity: Option<&IntegrityTagger>,
    options: &RestoreOptions,
    cancellation: &CancellationToken,
) -> Result<RestoreOutcome, BackyError> {
    tracing::info!(state = ?RestoreState::Validated, "restore job validated");

    tracing::info!(state = ?RestoreState::Fetching, "fetching manifest");
    let manifest_bytes = storage.get("manifest.json").await?;
    let manifest: Manifest =
        serde_json::from_slice(&manifest_bytes).map_err(|e| BackyError::ConfigInvalid(format!("corrupt manifest: {e}")))?;

    manifest.check_engine_major_version(&options.running_engine_version)?;

    let has_compression = manifest.transforms.iter().find_map(|t| match t {
        Transform::Compress { archive_type } => Some(archive_type.clone()),
        _ => None,
    });
    let has_encryption = manifest.transforms.iter().any(|t| matches!(t, Transform::Encrypt { .. }));
    let ext = output_extension(has_compression.is_some(), has_encryption);

    let names = blob_names(&manifest, ext);
    let mut blobs = Vec::with_capacity(names.len());
    for name in &names {
        blobs.push(storage.get(name).await?);
    }

    tracing::info!(state = ?RestoreState::IntegrityChecking, "verifying integrity tag");
    if let Some(tagger) = integrity {
        let canonical = manifest.canonical_bytes_excluding_tag();
        let refs: Vec<&[u8]> = blobs.iter().map(|b| b.as_slice()).collect();
        tagger.verify(&canonical, &refs, &manifest.integrity.value)?;
    }

    if cancellation.is_cancelled() {
        return Err(BackyError::Cancelled);
    }

    let decrypted: Vec<Vec<u8>> = if has_encryption {
        tracing::info!(state = ?RestoreState::Decrypting, "opening envelope(s)");
        let provider = key_provider.ok_or_else(|| BackyError::ConfigInvalid("backup is encrypted but no key provider configured".into()))?;
        let mut out = Vec::with_capacity(blobs.len());
        for blob in blobs {
            out.push(crypto_envelope::open(provider, &blob).await?);
        }
        out
    } else {
        blobs
    };

    let members: Vec<Member> = if let Some(archive_type) = &has_compression {
        tracing::info!(state = ?RestoreState::Decompressing, archive_type, "decompressing archive");
        let compressor: Box<dyn Compressor> = match archive_type.as_str() {
            "zip" => Box::new(ZipCompressor),
            "tar" => Box::new(TarCompressor),
            other => return Err(BackyError::CompressionFormatUnsupported(other.to_string())),
        };
        compressor.decompress(&decrypted[0])?
    } else {
        decrypted
            .into_iter()
            .zip(names.iter())
            .map(|(bytes, name)| Member { name: name.clone(), bytes })
            .collect()
    };

    if cancellation.is_cancelled() {
        return Err(BackyError::Cancelled);
    }

    tracing::info!(state = ?RestoreState::Applying, "applying restore");
    let mut categorized: Vec<(Option<ObjectCategory>, String)> = members
        .into_iter()
        .map(|m| (category_from_stem(strip_ext(&m.name)), String::from_utf8_lossy(&m.bytes).into_owned()))
        .collect();
    // Re-serialize execution in dependency-rank order regardless of the
    // order members were stored or completed in (spec §5). Members this
    // adapter can't categorize (e.g. a single concatenated `dump.sql`
    // blob) keep their original relative position.
    categorized.sort_by_key(|(category, _)| category.map(|c| c.restore_rank()).unwrap_or(u8::MAX));

    let mut skipped = Vec::new();
    for (_, sql) in categorized {
        skipped.extend(schema::apply(adapter, &sql, options.best_effort)?);
    }

    tracing::info!(state = ?RestoreState::Done, "restore complete");
    Ok(RestoreOutcome { manifest, skipped_statements: skipped })
}
