//! # backydb-core
//!
//! The Schema Engine, Compressor, Integrity, Storage, Manifest, and
//! Orchestrator pieces of BackyDB — everything that sits between a
//! validated [`job::BackupJob`]/[`job::RestoreJob`] and a stored backup.
//!
//! Key wrapping/unwrapping lives in `backydb-keystore`; the AEAD wire
//! format lives in `backydb-envelope`. This crate wires both into the
//! backup/restore state machines in [`orchestrator`].

pub mod artifact;
pub mod compressor;
pub mod crypto_envelope;
pub mod error;
pub mod integrity;
pub mod job;
pub mod manifest;
pub mod orchestrator;
pub mod schema;
pub mod settings;
pub mod storage;

pub use artifact::Artifact;
pub use error::BackyError;
pub use integrity::IntegrityTagger;
pub use job::{BackupJob, ObjectCategory, RestoreJob};
pub use manifest::{EngineInfo, Manifest};
pub use orchestrator::backup::{run_backup, BackupOptions, BackupOutcome};
pub use orchestrator::restore::{run_restore, RestoreOptions, RestoreOutcome};
pub use schema::DatabaseAdapter;
pub use settings::Settings;
pub use storage::StorageBackend;
