//! Integrity tag computation and verification (spec §4.5).

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::BackyError;

type HmacSha256 = Hmac<Sha256>;

pub enum IntegrityTagger {
    Hmac { secret: Vec<u8> },
    Checksum,
}

impl IntegrityTagger {
    /// Compute the integrity tag (spec §4.5, §9).
    ///
    /// `hmac` is a single MAC over the manifest's canonical form (tag field
    /// blanked) followed by every output's bytes, in order, keyed by the
    /// caller-supplied secret. `checksum` has no secret and no manifest
    /// binding — spec §4.5 defines it as "SHA-256 of each output, recorded
    /// per-file" — so it is a comma-joined list of each output's own
    /// SHA-256, one entry per output, in order.
    pub fn compute(&self, manifest_canonical: &[u8], outputs: &[&[u8]]) -> Result<String, BackyError> {
        match self {
            IntegrityTagger::Hmac { secret } => {
                let mut mac = HmacSha256::new_from_slice(secret)
                    .map_err(|e| BackyError::Internal(format!("invalid HMAC secret: {e}")))?;
                mac.update(manifest_canonical);
                for output in outputs {
                    mac.update(output);
                }
                Ok(hex::encode(mac.finalize().into_bytes()))
            }
            IntegrityTagger::Checksum => {
                Ok(outputs.iter().map(|output| hex::encode(Sha256::digest(output))).collect::<Vec<_>>().join(","))
            }
        }
    }

    /// Recompute and compare before any decryption/decompression happens
    /// (spec §4.5, §4.9: "If integrity fails, no bytes are handed to the
    /// crypto layer").
    pub fn verify(&self, manifest_canonical: &[u8], outputs: &[&[u8]], expected: &str) -> Result<(), BackyError> {
        let actual = self.compute(manifest_canonical, outputs)?;
        // Constant-time compare: a tag mismatch still must not leak timing
        // about how many leading bytes matched.
        use subtle::ConstantTimeEq;
        if actual.as_bytes().ct_eq(expected.as_bytes()).into() {
            Ok(())
        } else {
            Err(BackyError::IntegrityFailure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_round_trips() {
        let tagger = IntegrityTagger::Hmac { secret: b"s3cr3t".to_vec() };
        let tag = tagger.compute(b"manifest", &[b"artifact bytes"]).unwrap();
        assert!(tagger.verify(b"manifest", &[b"artifact bytes"], &tag).is_ok());
    }

    #[test]
    fn checksum_detects_tamper() {
        let tagger = IntegrityTagger::Checksum;
        let tag = tagger.compute(b"manifest", &[b"artifact bytes"]).unwrap();
        let result = tagger.verify(b"manifest", &[b"tampered bytes!"], &tag);
        assert!(matches!(result, Err(BackyError::IntegrityFailure)));
    }

    #[test]
    fn hmac_with_wrong_secret_fails() {
        let tagger = IntegrityTagger::Hmac { secret: b"right".to_vec() };
        let tag = tagger.compute(b"manifest", &[b"bytes"]).unwrap();
        let other = IntegrityTagger::Hmac { secret: b"wrong".to_vec() };
        assert!(other.verify(b"manifest", &[b"bytes"], &tag).is_err());
    }
}
