//! The exhaustive error taxonomy (spec §7) and exit-code mapping (spec §6).

use backydb_keystore::KeyProviderError;

#[derive(Debug, thiserror::Error)]
pub enum BackyError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("database connection failed: {0}")]
    ConnectFailed(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("syntax error at line {line}, col {col}: {statement}")]
    SyntaxError { line: u32, col: u32, statement: String },

    #[error("constraint violation on {object}: {reason}")]
    ConstraintViolation { object: String, reason: String },

    #[error("unsupported compression format: {0}")]
    CompressionFormatUnsupported(String),

    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("key access denied: {0}")]
    KeyAccessDenied(String),

    #[error("key algorithm unsupported: {0}")]
    KeyAlgorithmUnsupported(String),

    /// Transient — retried locally before ever reaching the orchestrator
    /// (spec §4.1); only surfaces here if retries are exhausted.
    #[error("key provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("integrity check failed")]
    IntegrityFailure,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("storage object not found: {0}")]
    StorageNotFound(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl BackyError {
    /// Whether the orchestrator should retry this locally rather than fail
    /// the job outright (spec §7 "Propagation").
    pub fn is_transient(&self) -> bool {
        matches!(self, BackyError::ProviderUnavailable(_) | BackyError::StorageUnavailable(_))
    }

    /// Exit-code taxonomy (spec §6).
    pub fn exit_code(&self) -> i32 {
        match self {
            BackyError::ConfigInvalid(_) => 2,
            BackyError::ConnectFailed(_)
            | BackyError::PermissionDenied(_)
            | BackyError::SyntaxError { .. }
            | BackyError::ConstraintViolation { .. } => 3,
            BackyError::CompressionFormatUnsupported(_)
            | BackyError::CorruptArchive(_)
            | BackyError::StorageUnavailable(_)
            | BackyError::StorageNotFound(_) => 4,
            BackyError::KeyNotFound(_)
            | BackyError::KeyAccessDenied(_)
            | BackyError::KeyAlgorithmUnsupported(_)
            | BackyError::ProviderUnavailable(_)
            | BackyError::IntegrityFailure => 5,
            BackyError::Cancelled => 6,
            BackyError::Internal(_) => 1,
        }
    }
}

impl From<KeyProviderError> for BackyError {
    fn from(err: KeyProviderError) -> Self {
        match err {
            KeyProviderError::KeyNotFound(id) => BackyError::KeyNotFound(id.to_string()),
            KeyProviderError::KeyAccessDenied(id) => BackyError::KeyAccessDenied(id.to_string()),
            KeyProviderError::KeyAlgorithmUnsupported(alg) => BackyError::KeyAlgorithmUnsupported(alg),
            KeyProviderError::ProviderUnavailable(reason) => BackyError::ProviderUnavailable(reason),
            KeyProviderError::Io(reason) => BackyError::Internal(reason),
            KeyProviderError::InvalidKeyMaterial(reason) => BackyError::IntegrityFailure.tap_reason(reason),
        }
    }
}

impl From<backydb_envelope::EncodingError> for BackyError {
    fn from(_: backydb_envelope::EncodingError) -> Self {
        BackyError::Internal("envelope encoding failed".into())
    }
}

impl From<backydb_envelope::DecryptionError> for BackyError {
    fn from(_: backydb_envelope::DecryptionError) -> Self {
        BackyError::IntegrityFailure
    }
}

impl BackyError {
    /// Small helper so `InvalidKeyMaterial` can carry its reason into the
    /// log even though `IntegrityFailure` itself is reasonless by spec.
    fn tap_reason(self, reason: String) -> Self {
        tracing::debug!(reason, "key material rejected");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_taxonomy() {
        assert_eq!(BackyError::ConfigInvalid("x".into()).exit_code(), 2);
        assert_eq!(BackyError::ConnectFailed("x".into()).exit_code(), 3);
        assert_eq!(BackyError::CorruptArchive("x".into()).exit_code(), 4);
        assert_eq!(BackyError::IntegrityFailure.exit_code(), 5);
        assert_eq!(BackyError::Cancelled.exit_code(), 6);
        assert_eq!(BackyError::Internal("x".into()).exit_code(), 1);
    }

    #[test]
    fn only_provider_and_storage_unavailable_are_transient() {
        assert!(BackyError::ProviderUnavailable("x".into()).is_transient());
        assert!(BackyError::StorageUnavailable("x".into()).is_transient());
        assert!(!BackyError::IntegrityFailure.is_transient());
    }
}
