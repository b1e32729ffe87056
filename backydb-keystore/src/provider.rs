//! The `KeyProvider` capability and its tagged-variant dispatch (spec §4.1,
//! Design Notes §9 — "dynamic dispatch ... expressed as capability
//! interfaces with tagged variants, no runtime attribute lookup").

use async_trait::async_trait;

use crate::cloud_keystore::CloudKeystore;
use crate::cloud_kms::CloudKms;
use crate::error::KeyProviderError;
use crate::local_vault::LocalVault;
use crate::retry::Backoff;
use crate::types::PublicParams;

/// Supplies the asymmetric key pair (or half of it) needed to wrap/unwrap a
/// symmetric data key.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Wrap a 32-byte data key, producing the bytes stored in the envelope
    /// header's `wrapped_key` field.
    async fn wrap(&self, data_key: &[u8]) -> Result<Vec<u8>, KeyProviderError>;

    /// Recover a data key from its wrapped bytes.
    async fn unwrap(&self, wrapped: &[u8]) -> Result<Vec<u8>, KeyProviderError>;

    /// The algorithm/size this provider's keys use.
    fn public_params(&self) -> PublicParams;
}

/// A statically-tagged key provider — avoids `dyn KeyProvider` where the
/// orchestrator already knows the configured variant at construction time.
pub enum KeyProviderHandle {
    LocalVault(LocalVault),
    CloudKeystore(CloudKeystore),
    CloudKms(CloudKms),
}

#[async_trait]
impl KeyProvider for KeyProviderHandle {
    /// Retries `ProviderUnavailable` per spec §4.1 (3 attempts, 8s cap)
    /// before surfacing the failure.
    async fn wrap(&self, data_key: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
        Backoff::keystore_policy()
            .run(KeyProviderError::is_transient, || async {
                match self {
                    KeyProviderHandle::LocalVault(p) => p.wrap(data_key).await,
                    KeyProviderHandle::CloudKeystore(p) => p.wrap(data_key).await,
                    KeyProviderHandle::CloudKms(p) => p.wrap(data_key).await,
                }
            })
            .await
    }

    async fn unwrap(&self, wrapped: &[u8]) -> Result<Vec<u8>, KeyProviderError> {
        Backoff::keystore_policy()
            .run(KeyProviderError::is_transient, || async {
                match self {
                    KeyProviderHandle::LocalVault(p) => p.unwrap(wrapped).await,
                    KeyProviderHandle::CloudKeystore(p) => p.unwrap(wrapped).await,
                    KeyProviderHandle::CloudKms(p) => p.unwrap(wrapped).await,
                }
            })
            .await
    }

    fn public_params(&self) -> PublicParams {
        match self {
            KeyProviderHandle::LocalVault(p) => p.public_params(),
            KeyProviderHandle::CloudKeystore(p) => p.public_params(),
            KeyProviderHandle::CloudKms(p) => p.public_params(),
        }
    }
}
