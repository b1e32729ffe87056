//! Identifiers and capability-description types.

use std::fmt;

/// Identifies a key within a provider's namespace (file name, KMS key id,
/// keystore resource name — the provider decides the concrete meaning).
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The asymmetric algorithm and size a provider's keys use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicParams {
    pub algorithm: Algorithm,
    pub key_size_bits: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    RsaOaepSha256,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::RsaOaepSha256 => write!(f, "RSA-OAEP-SHA256"),
        }
    }
}
