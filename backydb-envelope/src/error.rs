//! Error types for the envelope wire format and AEAD layer.

use std::fmt;

/// Failure while building envelope bytes (encryption path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub struct EncodingError;

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "envelope encoding error")
    }
}

/// Failure while opening envelope bytes (decryption path).
///
/// All failure modes — malformed header, wrong key, tampered ciphertext —
/// collapse to this single variant so callers cannot build a decryption
/// oracle out of distinguishable error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub struct DecryptionError;

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decryption failed: integrity check did not pass")
    }
}

impl From<EncodingError> for DecryptionError {
    fn from(_: EncodingError) -> Self {
        DecryptionError
    }
}
