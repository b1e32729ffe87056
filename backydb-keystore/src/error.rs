//! Key Provider error taxonomy (spec §4.1).

use crate::types::KeyId;

#[derive(Debug, thiserror::Error)]
pub enum KeyProviderError {
    #[error("key not found: {0}")]
    KeyNotFound(KeyId),

    #[error("access denied for key {0}")]
    KeyAccessDenied(KeyId),

    #[error("provider does not support algorithm: {0}")]
    KeyAlgorithmUnsupported(String),

    /// Transient — the orchestrator retries this one (see [`crate::retry`]).
    #[error("key provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("local vault I/O error: {0}")]
    Io(String),

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}

impl KeyProviderError {
    /// Whether the orchestrator should retry this class of failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, KeyProviderError::ProviderUnavailable(_))
    }
}
