//! # BackyDB Keystore
//!
//! The Key Provider capability (spec §4.1): wraps and unwraps the 32-byte
//! data key that protects a backup artifact, without ever exposing a full
//! private key to `backydb-core`.
//!
//! Three variants, one trait:
//!
//! - [`LocalVault`] — RSA-4096 key pair on local disk, private half
//!   encrypted at rest with an Argon2id-derived key.
//! - [`CloudKeystore`] — a generic HTTP key-management service (Vault
//!   transit engine, GCP KMS REST API).
//! - [`CloudKms`] — AWS KMS, via `aws-sdk-kms`.
//!
//! `backydb-core` holds a [`KeyProviderHandle`] and never matches on the
//! variant itself — it only calls [`KeyProvider::wrap`]/[`KeyProvider::unwrap`].

pub mod cloud_keystore;
pub mod cloud_kms;
pub mod error;
pub mod local_vault;
pub mod provider;
pub mod retry;
pub mod types;

pub use cloud_keystore::CloudKeystore;
pub use cloud_kms::CloudKms;
pub use error::KeyProviderError;
pub use local_vault::LocalVault;
pub use provider::{KeyProvider, KeyProviderHandle};
pub use retry::Backoff;
pub use types::{Algorithm, KeyId, PublicParams};
